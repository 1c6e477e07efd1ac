//! Per-language dictionaries and language models.
//!
//! Everything here is built once at startup and shared read-only (the
//! language models mutate internally through `learn`). A language without a
//! pack resolves to an empty one, so every lookup simply finds nothing.
use ahash::AHashMap;
use std::sync::Arc;

use crate::emoji::EmojiIndex;
use crate::lexicon::Dictionary;
use crate::ngram::LanguageModel;

/// Dictionary and language model of one language.
#[derive(Debug, Clone)]
pub struct LanguagePack {
    pub dictionary: Arc<Dictionary>,
    pub model: Arc<LanguageModel>,
}

impl LanguagePack {
    pub fn new(dictionary: Dictionary, model: LanguageModel) -> Self {
        Self {
            dictionary: Arc::new(dictionary),
            model: Arc::new(model),
        }
    }

    pub fn empty(language: &str) -> Self {
        Self::new(Dictionary::empty(language), LanguageModel::new())
    }
}

#[derive(Debug, Clone)]
pub struct Assets {
    packs: AHashMap<String, LanguagePack>,
    emoji: EmojiIndex,
    fallback: LanguagePack,
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}

impl Assets {
    /// No languages, built-in emoji table.
    pub fn new() -> Self {
        Self {
            packs: AHashMap::new(),
            emoji: EmojiIndex::builtin(),
            fallback: LanguagePack::empty(""),
        }
    }

    /// Register a language. Tags are matched case-insensitively.
    pub fn with_pack(mut self, language: &str, dictionary: Dictionary, model: LanguageModel) -> Self {
        self.insert_pack(language, LanguagePack::new(dictionary, model));
        self
    }

    pub fn with_emoji(mut self, emoji: EmojiIndex) -> Self {
        self.emoji = emoji;
        self
    }

    pub fn insert_pack(&mut self, language: &str, pack: LanguagePack) {
        self.packs.insert(language.to_lowercase(), pack);
    }

    /// Pack for `language`, or the shared empty pack.
    pub fn pack(&self, language: &str) -> &LanguagePack {
        self.packs
            .get(&language.to_lowercase())
            .unwrap_or(&self.fallback)
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.packs.contains_key(&language.to_lowercase())
    }

    /// Registered language tags, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.packs.keys().cloned().collect();
        langs.sort();
        langs
    }

    pub fn emoji(&self) -> &EmojiIndex {
        &self.emoji
    }
}
