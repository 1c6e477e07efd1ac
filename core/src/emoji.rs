//! Keyword to emoji lookup.
//!
//! The ranker only lets emoji into the strip after certain trigger words;
//! this index supplies which emoji those are.
use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::candidate::{Candidate, CandidateSource};
use crate::normalize::normalize;

/// Score given to emoji listed without an explicit score.
pub const DEFAULT_EMOJI_SCORE: f64 = 0.6;

const DEFAULT_TABLE: &[(&str, &[&str])] = &[
    ("love", &["❤️", "😍", "🥰"]),
    ("heart", &["❤️"]),
    ("miss", &["🥺", "💔"]),
    ("like", &["👍"]),
    ("ok", &["👌"]),
    ("thanks", &["🙏", "😊"]),
    ("thank", &["🙏", "😊"]),
    ("congrats", &["🎉", "👏"]),
    ("smile", &["😊"]),
    ("happy", &["😊", "🥳"]),
    ("sad", &["😢", "💔"]),
    ("excited", &["🤩", "🎉"]),
    ("laugh", &["😂"]),
    ("lol", &["😂"]),
    ("fire", &["🔥"]),
    ("cool", &["😎"]),
    ("think", &["🤔"]),
    ("party", &["🎉"]),
    ("celebrate", &["🎉"]),
    ("food", &["🍔"]),
    ("eat", &["🍕"]),
    ("drink", &["☕"]),
    ("coffee", &["☕"]),
    ("beer", &["🍺"]),
    ("sun", &["☀️"]),
    ("moon", &["🌙"]),
    ("star", &["⭐"]),
    ("check", &["✅"]),
    ("yes", &["✅"]),
    ("no", &["❌"]),
    ("stop", &["🛑"]),
    ("wait", &["⏳"]),
];

/// One emoji as written in a JSON table: either a bare string or an object
/// with an explicit score.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmojiSpec {
    Plain(String),
    Scored { emoji: String, score: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct EmojiIndex {
    map: AHashMap<String, Vec<(String, f64)>>,
}

impl EmojiIndex {
    /// Index with no keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in English keyword table.
    pub fn builtin() -> Self {
        let mut index = Self::new();
        for (keyword, emojis) in DEFAULT_TABLE {
            for emoji in emojis.iter() {
                index.insert(keyword, emoji, DEFAULT_EMOJI_SCORE);
            }
        }
        index
    }

    /// Parse a table of the form `{"love": ["❤️", {"emoji": "😍", "score": 0.8}]}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Vec<EmojiSpec>> = serde_json::from_str(json)?;
        let mut index = Self::new();
        for (keyword, specs) in raw {
            for spec in specs {
                match spec {
                    EmojiSpec::Plain(emoji) => index.insert(&keyword, &emoji, DEFAULT_EMOJI_SCORE),
                    EmojiSpec::Scored { emoji, score } => index.insert(&keyword, &emoji, score),
                }
            }
        }
        Ok(index)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Add an emoji for a keyword. Repeated emoji for the same keyword are
    /// ignored.
    pub fn insert(&mut self, keyword: &str, emoji: &str, score: f64) {
        let key = normalize(keyword);
        if key.is_empty() || emoji.is_empty() {
            return;
        }
        let list = self.map.entry(key).or_default();
        if !list.iter().any(|(e, _)| e == emoji) {
            list.push((emoji.to_string(), score));
        }
    }

    /// Emoji for `word`, in table order.
    pub fn lookup(&self, word: &str, limit: usize) -> Vec<Candidate> {
        self.map
            .get(&normalize(word))
            .map(|list| {
                list.iter()
                    .take(limit)
                    .map(|(e, s)| Candidate::new(e.clone(), *s, CandidateSource::Emoji))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
