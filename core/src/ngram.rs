//! Next-word language model with online learning.
//!
//! The table maps a context (zero, one or two previous words) to a bucket of
//! weighted next words, heaviest first. Prediction backs off from the trigram
//! context to the bigram context to the cold-start (empty context) bucket.
//!
//! Buckets are copy-on-write: `learn` clones the bucket it changes, edits the
//! clone and swaps the `Arc` in under a short write lock. Readers clone the
//! `Arc` under a read lock and then work without holding anything, so they
//! never wait for a learn to finish and may see a table that is one update
//! behind. Learns are serialized by a separate writer mutex.
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::candidate::{Candidate, CandidateSource};
use crate::normalize::{normalize, tokenize};
use crate::Config;

/// Normalized context of a prediction or an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextKey {
    Empty,
    One(String),
    Two(String, String),
}

impl ContextKey {
    /// Key for the last (up to) two words of `words`. Words are normalized
    /// and those that normalize to nothing are skipped.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let mut tail: Vec<String> = words
            .iter()
            .rev()
            .map(|w| normalize(w.as_ref()))
            .filter(|w| !w.is_empty())
            .take(2)
            .collect();
        match (tail.pop(), tail.pop()) {
            (Some(first), Some(second)) => ContextKey::Two(first, second),
            (Some(only), None) => ContextKey::One(only),
            _ => ContextKey::Empty,
        }
    }

    /// This key and every shorter key ending in the same words, longest first.
    pub fn suffixes(&self) -> Vec<ContextKey> {
        match self {
            ContextKey::Two(_, b) => vec![
                self.clone(),
                ContextKey::One(b.clone()),
                ContextKey::Empty,
            ],
            ContextKey::One(_) => vec![self.clone(), ContextKey::Empty],
            ContextKey::Empty => vec![ContextKey::Empty],
        }
    }

    pub fn words(&self) -> Vec<String> {
        match self {
            ContextKey::Empty => Vec::new(),
            ContextKey::One(a) => vec![a.clone()],
            ContextKey::Two(a, b) => vec![a.clone(), b.clone()],
        }
    }

    fn from_vec(words: &[String]) -> Option<Self> {
        match words {
            [] => Some(ContextKey::Empty),
            [a] => Some(ContextKey::One(a.clone())),
            [a, b] => Some(ContextKey::Two(a.clone(), b.clone())),
            _ => None,
        }
    }
}

/// One (context, next word, weight) row, the persisted form of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NGramEntry {
    /// Zero to two normalized words, oldest first.
    pub context: Vec<String>,
    pub next_word: String,
    pub weight: f64,
}

impl NGramEntry {
    pub fn new<S: Into<String>>(context: Vec<String>, next_word: S, weight: f64) -> Self {
        Self {
            context,
            next_word: next_word.into(),
            weight,
        }
    }
}

/// Next words for one context, heaviest first (ties alphabetical).
type Bucket = Vec<(String, f64)>;

fn add_to_bucket(bucket: &mut Bucket, word: &str, weight: f64) {
    match bucket.iter_mut().find(|(w, _)| w == word) {
        Some((_, existing)) => *existing += weight,
        None => bucket.push((word.to_string(), weight)),
    }
}

fn sort_bucket(bucket: &mut Bucket) {
    bucket.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

/// Trigram / bigram / cold-start next-word table.
#[derive(Debug)]
pub struct LanguageModel {
    table: RwLock<AHashMap<ContextKey, Arc<Bucket>>>,
    writer: Mutex<()>,
    increment: f64,
}

impl Default for LanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModel {
    /// Empty model with a learn increment of 1.0.
    pub fn new() -> Self {
        Self::with_increment(1.0)
    }

    pub fn with_config(config: &Config) -> Self {
        Self::with_increment(config.learn_increment)
    }

    fn with_increment(increment: f64) -> Self {
        let increment = if increment > 0.0 {
            increment
        } else {
            warn!(increment, "learn increment must be positive; using 1.0");
            1.0
        };
        Self {
            table: RwLock::new(AHashMap::new()),
            writer: Mutex::new(()),
            increment,
        }
    }

    /// Build from persisted rows. Duplicate rows add up; rows with a context
    /// longer than two words or a non-positive weight are dropped.
    pub fn from_entries(entries: &[NGramEntry], config: &Config) -> Self {
        let model = Self::with_config(config);
        let mut table: AHashMap<ContextKey, Bucket> = AHashMap::new();
        for entry in entries {
            let next = normalize(&entry.next_word);
            if next.is_empty() || entry.weight.is_nan() || entry.weight <= 0.0 {
                continue;
            }
            let Some(key) = ContextKey::from_vec(&entry.context) else {
                continue;
            };
            add_to_bucket(table.entry(key).or_default(), &next, entry.weight);
        }
        model.install(table);
        model
    }

    /// Merge counted buckets into the live table under the writer lock.
    fn install(&self, counts: AHashMap<ContextKey, Bucket>) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, additions) in counts {
            let mut bucket: Bucket = self
                .bucket(&key)
                .map(|b| b.as_ref().clone())
                .unwrap_or_default();
            for (word, weight) in additions {
                add_to_bucket(&mut bucket, &word, weight);
            }
            sort_bucket(&mut bucket);
            if let Ok(mut table) = self.table.write() {
                table.insert(key, Arc::new(bucket));
            }
        }
    }

    fn bucket(&self, key: &ContextKey) -> Option<Arc<Bucket>> {
        self.table.read().ok()?.get(key).cloned()
    }

    /// Ranked next words after `context`.
    ///
    /// Uses the two-word context when it has any entries, else the last
    /// word, else the cold-start list. Scores are weights divided by the
    /// heaviest returned weight, so the first candidate scores 1.0.
    pub fn predict<S: AsRef<str>>(&self, context: &[S], limit: usize) -> Vec<Candidate> {
        if limit == 0 {
            return Vec::new();
        }
        let key = ContextKey::from_words(context);
        let Some(bucket) = key
            .suffixes()
            .into_iter()
            .find_map(|k| self.bucket(&k).filter(|b| !b.is_empty()))
        else {
            return Vec::new();
        };

        let max = bucket.first().map(|(_, w)| *w).unwrap_or(0.0);
        bucket
            .iter()
            .take(limit)
            .map(|(word, weight)| {
                let score = if max > 0.0 { weight / max } else { 0.0 };
                Candidate::new(word.clone(), score, CandidateSource::NextWord)
            })
            .collect()
    }

    /// Record that `next_word` followed `context`.
    ///
    /// The learn increment is added for the two-word context, the one-word
    /// context and the cold-start list. Weights only ever grow.
    pub fn learn<S: AsRef<str>>(&self, context: &[S], next_word: &str) {
        let next = normalize(next_word);
        if next.is_empty() {
            return;
        }
        let key = ContextKey::from_words(context);

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        for suffix in key.suffixes() {
            let mut bucket: Bucket = self
                .bucket(&suffix)
                .map(|b| b.as_ref().clone())
                .unwrap_or_default();
            add_to_bucket(&mut bucket, &next, self.increment);
            sort_bucket(&mut bucket);
            if let Ok(mut table) = self.table.write() {
                table.insert(suffix, Arc::new(bucket));
            }
        }
        debug!(context = ?key, word = %next, "learned next word");
    }

    /// Count word successions in a corpus, one sentence per item.
    ///
    /// Every word adds 1.0 under each of its context suffixes, exactly as if
    /// it had been learned.
    pub fn train<I, S>(&self, sentences: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: AHashMap<ContextKey, Bucket> = AHashMap::new();
        let mut words = 0usize;
        for sentence in sentences {
            let tokens = tokenize(sentence.as_ref());
            for (i, token) in tokens.iter().enumerate() {
                let key = ContextKey::from_words(&tokens[i.saturating_sub(2)..i]);
                for suffix in key.suffixes() {
                    add_to_bucket(counts.entry(suffix).or_default(), token, 1.0);
                }
                words += 1;
            }
        }
        debug!(words, contexts = counts.len(), "trained language model");
        self.install(counts);
    }

    /// Snapshot of every row, sorted by context then weight.
    pub fn entries(&self) -> Vec<NGramEntry> {
        let Ok(table) = self.table.read() else {
            return Vec::new();
        };
        let mut keys: Vec<&ContextKey> = table.keys().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|key| {
                table.get(key).into_iter().flat_map(move |bucket| {
                    bucket
                        .iter()
                        .map(move |(word, weight)| NGramEntry::new(key.words(), word.clone(), *weight))
                })
            })
            .collect()
    }

    /// Current weight of `next_word` after exactly `context` (no back-off).
    pub fn weight<S: AsRef<str>>(&self, context: &[S], next_word: &str) -> f64 {
        let key = ContextKey::from_words(context);
        let next = normalize(next_word);
        self.bucket(&key)
            .and_then(|b| b.iter().find(|(w, _)| *w == next).map(|(_, weight)| *weight))
            .unwrap_or(0.0)
    }

    /// Number of contexts with at least one next word.
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save the model rows to a file using bincode serialization.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &self.entries())?;
        Ok(())
    }

    /// Load a model written by `save_bincode`.
    pub fn load_bincode<P: AsRef<Path>>(path: P, config: &Config) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let entries: Vec<NGramEntry> = bincode::deserialize_from(reader)?;
        Ok(Self::from_entries(&entries, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(c: &[Candidate]) -> Vec<&str> {
        c.iter().map(|c| c.text.as_str()).collect()
    }

    fn sample() -> LanguageModel {
        let e = |ctx: &[&str], w: &str, weight: f64| {
            NGramEntry::new(ctx.iter().map(|s| s.to_string()).collect(), w, weight)
        };
        LanguageModel::from_entries(
            &[
                e(&[], "the", 50.0),
                e(&[], "i", 40.0),
                e(&[], "you", 30.0),
                e(&["good"], "morning", 8.0),
                e(&["good"], "night", 4.0),
                e(&["good"], "luck", 2.0),
                e(&["very", "good"], "job", 3.0),
            ],
            &Config::default(),
        )
    }

    #[test]
    fn predict_with_bigram_context() {
        let m = sample();
        let out = m.predict(&["good"], 3);
        assert_eq!(words(&out), vec!["morning", "night", "luck"]);
        assert_eq!(out[0].score, 1.0);
        assert_eq!(out[1].score, 0.5);
        assert!(out.iter().all(|c| c.source == CandidateSource::NextWord));
    }

    #[test]
    fn predict_prefers_trigram() {
        let m = sample();
        assert_eq!(words(&m.predict(&["very", "good"], 3)), vec!["job"]);
        // unseen trigram backs off to the bigram
        assert_eq!(words(&m.predict(&["so", "good"], 1)), vec!["morning"]);
    }

    #[test]
    fn predict_cold_start() {
        let m = sample();
        let empty: [&str; 0] = [];
        assert_eq!(words(&m.predict(&empty, 2)), vec!["the", "i"]);
        // unknown previous word also falls back to the cold-start list
        assert_eq!(words(&m.predict(&["zebra"], 1)), vec!["the"]);
        assert!(m.predict(&["good"], 0).is_empty());
        assert!(LanguageModel::new().predict(&["good"], 3).is_empty());
    }

    #[test]
    fn predict_normalizes_context() {
        let m = sample();
        assert_eq!(words(&m.predict(&["GOOD!!"], 1)), vec!["morning"]);
    }

    #[test]
    fn learn_updates_every_suffix() {
        let m = LanguageModel::new();
        m.learn(&["see", "you"], "Soon");
        assert_eq!(m.weight(&["see", "you"], "soon"), 1.0);
        assert_eq!(m.weight(&["you"], "soon"), 1.0);
        let empty: [&str; 0] = [];
        assert_eq!(m.weight(&empty, "soon"), 1.0);
        m.learn(&["you"], "soon");
        assert_eq!(m.weight(&["you"], "soon"), 2.0);
        assert_eq!(m.weight(&["see", "you"], "soon"), 1.0);
    }

    #[test]
    fn learn_can_overtake() {
        let m = sample();
        for _ in 0..7 {
            m.learn(&["good"], "luck");
        }
        assert_eq!(words(&m.predict(&["good"], 1)), vec!["luck"]);
    }

    #[test]
    fn learn_ignores_empty_word() {
        let m = LanguageModel::new();
        m.learn(&["hi"], "!!");
        assert!(m.is_empty());
    }

    #[test]
    fn train_counts_corpus() {
        let m = LanguageModel::new();
        m.train(["good morning", "good morning everyone", "good night"]);
        assert_eq!(m.weight(&["good"], "morning"), 2.0);
        assert_eq!(m.weight(&["good", "morning"], "everyone"), 1.0);
        let empty: [&str; 0] = [];
        assert_eq!(m.weight(&empty, "good"), 3.0);
    }

    #[test]
    fn context_key_suffixes() {
        let key = ContextKey::from_words(&["a", "b", "c"]);
        assert_eq!(key, ContextKey::Two("b".into(), "c".into()));
        assert_eq!(
            key.suffixes(),
            vec![
                ContextKey::Two("b".into(), "c".into()),
                ContextKey::One("c".into()),
                ContextKey::Empty
            ]
        );
        assert_eq!(ContextKey::from_words(&["...", "x"]), ContextKey::One("x".into()));
    }

    #[test]
    fn entries_round_trip() {
        let m = sample();
        let rebuilt = LanguageModel::from_entries(&m.entries(), &Config::default());
        assert_eq!(rebuilt.entries(), m.entries());
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn save_and_load_bincode_roundtrip() {
        let tmp = std::env::temp_dir().join("glide_ngram_test.bin");
        let m = sample();
        m.save_bincode(&tmp).unwrap();
        let loaded = LanguageModel::load_bincode(&tmp, &Config::default()).unwrap();
        assert_eq!(words(&loaded.predict(&["good"], 2)), vec!["morning", "night"]);
        let _ = std::fs::remove_file(tmp);
    }
}
