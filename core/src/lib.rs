//! glide-core
//!
//! Predictive text core for a soft keyboard: swipe decoding, autocorrect,
//! next-word prediction and suggestion ranking. The crate never draws
//! anything and never talks to a platform input API; it consumes geometric
//! and textual events and hands back ranked strings.
//!
//! Public API:
//! - `Keyboard` - Host-facing facade (layout, gesture, text and learn requests)
//! - `KeyboardLayoutGeometry` - Key rectangles and the characters they produce
//! - `GestureSampler` - Tap/swipe classification of one touch contact
//! - `SwipeDecoder` - Key-hit sequence to ranked words
//! - `AutocorrectEngine` - Keyboard-aware bounded edit-distance correction
//! - `LanguageModel` - Trigram/bigram/cold-start next-word table with learning
//! - `SuggestionRanker` - Final merge of word and emoji candidates
//! - `Config` - Thresholds and weights, loadable from TOML
use serde::{Deserialize, Serialize};

pub mod normalize;
pub use normalize::{is_alphabetic, normalize};

pub mod geometry;
pub use geometry::{Adjacency, Key, KeyId, KeyboardLayoutGeometry, Rect};

pub mod gesture;
pub use gesture::{GestureEnd, GesturePhase, GestureSampler, GestureState, TouchSample};

pub mod keyhit;
pub use keyhit::{map_to_keys, KeyHit, KeyHitSequence};

pub mod trie;
pub use trie::TrieNode;

pub mod lexicon;
pub use lexicon::{Dictionary, DictionaryEntry};

pub mod candidate;
pub use candidate::{Candidate, CandidateSource, SuggestionBundle};

pub mod swipe;
pub use swipe::SwipeDecoder;

pub mod autocorrect;
pub use autocorrect::{AppliedCorrection, AutocorrectEngine, CorrectionHistory};

pub mod ngram;
pub use ngram::{ContextKey, LanguageModel, NGramEntry};

pub mod emoji;
pub use emoji::EmojiIndex;

pub mod ranker;
pub use ranker::SuggestionRanker;

pub mod assets;
pub use assets::{Assets, LanguagePack};

pub mod store;

pub mod worker;
pub use worker::{Delivery, Job, RequestKind, Worker};

pub mod keyboard;
pub use keyboard::{GestureOutcome, Keyboard, TouchPhase};

/// Tunable thresholds and weights for every component.
///
/// Deserialized from TOML. Missing fields take their defaults, so a config
/// file only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Language tag used until the host calls `Keyboard::set_language`.
    pub default_language: String,

    // Gesture classification
    /// Straight-line distance from touch-down (px) after which a touch is a swipe.
    pub swipe_start_distance: f32,
    /// Minimum touch-down to touch-up duration (ms) for a decodable swipe.
    pub min_swipe_duration_ms: u64,
    /// Minimum accumulated path length (px) for a decodable swipe.
    pub min_swipe_path: f32,

    // Swipe decoding
    /// Number of swipe candidates returned.
    pub swipe_top_k: usize,
    /// Matched-letter fraction below which a dictionary word is not a candidate.
    pub min_match_fraction: f64,

    // Autocorrect
    /// Substitution cost between keys that touch on the active layout.
    pub adjacent_substitution_cost: f64,
    /// Cost of swapping two neighbouring letters ("teh" -> "the").
    pub transposition_cost: f64,
    /// Corrections costing more than this are never offered.
    pub max_correction_cost: f64,
    /// Two keys are adjacent when their centres are closer than this many key widths.
    pub adjacency_factor: f32,
    /// Maximum number of entries in the autocorrect result cache.
    pub max_cache_size: usize,
    /// How long (ms) after an applied correction it can still be reverted.
    pub revert_window_ms: u64,

    // Language model
    /// Weight added per observed (context, word) pair.
    pub learn_increment: f64,

    // Ranking
    /// Maximum number of entries in a suggestion strip.
    pub max_suggestions: usize,
    /// Maximum number of emoji blended into the strip after a trigger word.
    pub max_emoji: usize,
    /// Previous words that allow emoji in the strip.
    pub emoji_triggers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            swipe_start_distance: 50.0,
            min_swipe_duration_ms: 300,
            min_swipe_path: 100.0,
            swipe_top_k: 5,
            min_match_fraction: 0.6,
            adjacent_substitution_cost: 0.5,
            transposition_cost: 0.5,
            max_correction_cost: 2.0,
            adjacency_factor: 1.5,
            max_cache_size: 1000,
            revert_window_ms: 2000,
            learn_increment: 1.0,
            max_suggestions: 5,
            max_emoji: 2,
            emoji_triggers: [
                "love", "miss", "thanks", "thank", "congrats", "happy", "sad", "excited",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check whether `word` (any case) is one of the emoji trigger words.
    pub fn is_emoji_trigger(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.emoji_triggers.iter().any(|t| *t == lower)
    }
}
