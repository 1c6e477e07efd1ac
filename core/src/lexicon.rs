//! Per-language word dictionary.
//!
//! A `Dictionary` is a frequency-annotated trie of normalized words. It is
//! built once from a word list and never mutated afterwards, so decoder and
//! autocorrect threads share it through an `Arc` without locking.
//!
//! Public API:
//! - `DictionaryEntry` - word, frequency and language tag
//! - `Dictionary` - trie-backed lookup, prefix completion, bincode helpers
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::normalize::normalize;
use crate::trie::TrieNode;

/// A single dictionary word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    /// Corpus frequency. Higher means more common.
    pub frequency: u32,
    pub language: String,
}

impl DictionaryEntry {
    pub fn new<W: Into<String>, L: Into<String>>(word: W, frequency: u32, language: L) -> Self {
        Self {
            word: word.into(),
            frequency,
            language: language.into(),
        }
    }
}

/// Immutable word trie for one language.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    language: String,
    root: TrieNode,
    len: usize,
}

impl Dictionary {
    /// Dictionary with no words, used for languages without assets.
    pub fn empty<L: Into<String>>(language: L) -> Self {
        Self {
            language: language.into(),
            root: TrieNode::new(),
            len: 0,
        }
    }

    /// Build from `(word, frequency)` pairs.
    ///
    /// Words are normalized before insertion; words that normalize to nothing
    /// are skipped and duplicates keep their highest frequency.
    pub fn from_words<L, I, W>(language: L, words: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = (W, u32)>,
        W: AsRef<str>,
    {
        let mut dict = Self::empty(language);
        for (word, freq) in words {
            let key = normalize(word.as_ref());
            if key.is_empty() {
                continue;
            }
            if dict.root.insert(&key, freq) {
                dict.len += 1;
            }
        }
        dict
    }

    /// Build from full entries. Entries tagged with another language are
    /// ignored.
    pub fn from_entries<L: Into<String>>(language: L, entries: &[DictionaryEntry]) -> Self {
        let language = language.into();
        let words: Vec<(&str, u32)> = entries
            .iter()
            .filter(|e| e.language == language)
            .map(|e| (e.word.as_str(), e.frequency))
            .collect();
        Self::from_words(language, words)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        self.root.contains_word(&normalize(word))
    }

    /// Frequency of `word` after normalization.
    pub fn frequency(&self, word: &str) -> Option<u32> {
        self.root.frequency(&normalize(word))
    }

    /// The `limit` most frequent words starting with `prefix`.
    pub fn complete(&self, prefix: &str, limit: usize) -> Vec<(String, u32)> {
        let key = normalize(prefix);
        if key.is_empty() {
            return Vec::new();
        }
        self.root.top_k_with_prefix(&key, limit)
    }

    /// All entries in lexicographic order.
    pub fn entries(&self) -> Vec<DictionaryEntry> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![&self.root];
        // Children are visited in reverse so pops come out in order.
        while let Some(node) = stack.pop() {
            if let Some((word, freq)) = node.word() {
                out.push(DictionaryEntry::new(word, freq, self.language.clone()));
            }
            let children: Vec<&TrieNode> = node.children().map(|(_, n)| n).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Save the word list to a file using bincode serialization.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &(self.language.as_str(), self.entries()))?;
        Ok(())
    }

    /// Load a dictionary written by `save_bincode`.
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let (language, entries): (String, Vec<DictionaryEntry>) =
            bincode::deserialize_from(reader)?;
        Ok(Self::from_entries(language, &entries))
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
