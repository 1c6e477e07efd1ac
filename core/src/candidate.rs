//! Candidate types shared by every suggestion producer.
//!
//! This module provides:
//! - `Candidate`: A single suggestion with score and origin
//! - `SuggestionBundle`: The ranked strip handed to the host

use serde::{Deserialize, Serialize};

/// Which component produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateSource {
    Swipe,
    Autocorrect,
    NextWord,
    /// Prefix completion of the word being typed.
    Completion,
    Emoji,
}

/// A single suggestion with an associated score.
///
/// Scores are comparable only within one ranking pass; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub score: f64,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn new<T: Into<String>>(text: T, score: f64, source: CandidateSource) -> Self {
        Candidate {
            text: text.into(),
            score,
            source,
        }
    }

    pub fn is_emoji(&self) -> bool {
        self.source == CandidateSource::Emoji
    }
}

/// Sort by descending score, keeping input order on ties.
pub fn sort_by_score(candidates: &mut [Candidate]) {
    // slice::sort_by is stable
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// The result of one swipe or text request.
///
/// A bundle is immutable once built and replaces whatever the host showed
/// before. `sequence` is the request number it answers. Both lists are in
/// strip order: descending score, stable on ties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBundle {
    pub sequence: u64,
    pub words: Vec<Candidate>,
    pub emojis: Vec<Candidate>,
}

impl SuggestionBundle {
    pub fn new(sequence: u64, words: Vec<Candidate>, emojis: Vec<Candidate>) -> Self {
        Self {
            sequence,
            words,
            emojis,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.emojis.is_empty()
    }

    /// Best word suggestion, if any.
    pub fn top(&self) -> Option<&str> {
        self.words.first().map(|c| c.text.as_str())
    }

    pub fn word_texts(&self) -> Vec<&str> {
        self.words.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn emoji_texts(&self) -> Vec<&str> {
        self.emojis.iter().map(|c| c.text.as_str()).collect()
    }
}
