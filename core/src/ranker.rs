//! Final merge of word and emoji candidates into the suggestion strip.
use ahash::AHashSet;

use crate::candidate::{sort_by_score, Candidate, SuggestionBundle};
use crate::normalize::is_alphabetic;
use crate::Config;

#[derive(Debug, Clone)]
pub struct SuggestionRanker {
    max_suggestions: usize,
    max_emoji: usize,
    triggers: AHashSet<String>,
}

impl Default for SuggestionRanker {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl SuggestionRanker {
    pub fn new(config: &Config) -> Self {
        Self {
            max_suggestions: config.max_suggestions,
            max_emoji: config.max_emoji,
            triggers: config
                .emoji_triggers
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    /// Whether emoji may follow `previous_word`.
    pub fn allows_emoji(&self, previous_word: Option<&str>) -> bool {
        previous_word.is_some_and(|w| self.triggers.contains(&w.to_lowercase()))
    }

    /// Merge candidates for the strip, keeping scores.
    ///
    /// While a word is being typed (`current_word` alphabetic) only word
    /// candidates are shown, in the order given. Otherwise emoji for a
    /// trigger `previous_word` are blended in, everything is stably sorted by
    /// descending score and duplicate strings are dropped (first wins).
    pub fn merge_candidates(
        &self,
        current_word: &str,
        previous_word: Option<&str>,
        word_candidates: &[Candidate],
        emoji_candidates: &[Candidate],
        max: usize,
    ) -> Vec<Candidate> {
        if is_alphabetic(current_word) {
            return word_candidates.iter().take(max).cloned().collect();
        }

        let emoji_allowed = if self.allows_emoji(previous_word) {
            self.max_emoji
        } else {
            0
        };
        let mut combined: Vec<Candidate> = word_candidates
            .iter()
            .take(max)
            .chain(emoji_candidates.iter().take(emoji_allowed))
            .cloned()
            .collect();
        sort_by_score(&mut combined);

        let mut seen = AHashSet::new();
        combined.retain(|c| seen.insert(c.text.clone()));
        combined.truncate(max);
        combined
    }

    /// Strings for the strip, best first.
    ///
    /// # Example
    /// ```
    /// use glide_core::{Candidate, CandidateSource, SuggestionRanker};
    ///
    /// let ranker = SuggestionRanker::default();
    /// let emojis = vec![
    ///     Candidate::new("❤️", 0.9, CandidateSource::Emoji),
    ///     Candidate::new("😍", 0.8, CandidateSource::Emoji),
    ///     Candidate::new("🥰", 0.7, CandidateSource::Emoji),
    /// ];
    /// let strip = ranker.merge("", Some("love"), &[], &emojis, 5);
    /// assert_eq!(strip, vec!["❤️", "😍"]);
    /// ```
    pub fn merge(
        &self,
        current_word: &str,
        previous_word: Option<&str>,
        word_candidates: &[Candidate],
        emoji_candidates: &[Candidate],
        max: usize,
    ) -> Vec<String> {
        self.merge_candidates(
            current_word,
            previous_word,
            word_candidates,
            emoji_candidates,
            max,
        )
        .into_iter()
        .map(|c| c.text)
        .collect()
    }

    /// Run the merge with the configured strip size and split the result
    /// into a bundle.
    pub fn rank(
        &self,
        sequence: u64,
        current_word: &str,
        previous_word: Option<&str>,
        word_candidates: &[Candidate],
        emoji_candidates: &[Candidate],
    ) -> SuggestionBundle {
        let merged = self.merge_candidates(
            current_word,
            previous_word,
            word_candidates,
            emoji_candidates,
            self.max_suggestions,
        );
        let (emojis, words): (Vec<Candidate>, Vec<Candidate>) =
            merged.into_iter().partition(Candidate::is_emoji);
        SuggestionBundle::new(sequence, words, emojis)
    }
}
