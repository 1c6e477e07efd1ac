// Shared fixtures for the integration tests.
#![allow(dead_code)]

use glide_core::{
    Assets, Dictionary, KeyboardLayoutGeometry, LanguageModel, TouchSample,
};
use std::sync::Arc;

pub const KEY_W: f32 = 40.0;
pub const KEY_H: f32 = 60.0;

/// Words whose letters, with doubled letters collapsed, are all distinct
/// from one another.
pub const WORDS: &[&str] = &[
    "the", "hello", "world", "keyboard", "swipe", "good", "morning", "night", "quick", "brown",
    "jumps", "over", "lazy", "dog", "typing", "predict", "love", "thanks", "happy", "coffee",
    "letter", "little", "you", "see", "soon", "text", "word", "train",
];

pub fn layout() -> KeyboardLayoutGeometry {
    KeyboardLayoutGeometry::qwerty(KEY_W, KEY_H)
}

pub fn dictionary() -> Dictionary {
    Dictionary::from_words("en", WORDS.iter().map(|w| (*w, 100u32)))
}

pub fn model() -> LanguageModel {
    let model = LanguageModel::new();
    model.train([
        "good morning",
        "good morning",
        "good night",
        "thanks you",
        "see you soon",
        "see you soon",
        "the quick brown dog",
        "hello world",
    ]);
    model
}

pub fn assets() -> Arc<Assets> {
    Arc::new(Assets::new().with_pack("en", dictionary(), model()))
}

/// Touch samples resting on the centre of each letter's key in turn, two
/// samples per letter, `step_ms` apart.
pub fn trace_word(geometry: &KeyboardLayoutGeometry, word: &str, step_ms: u64) -> Vec<TouchSample> {
    let mut samples = Vec::new();
    let mut t = 0;
    for ch in word.chars() {
        let key = geometry.key_for_letter(ch).expect("letter on layout");
        let (x, y) = key.bounds.center();
        for _ in 0..2 {
            samples.push(TouchSample::new(x, y, t));
            t += step_ms;
        }
    }
    samples
}
