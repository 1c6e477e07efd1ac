//! Mapping touch samples onto the keys they pass over.
use crate::geometry::{KeyId, KeyboardLayoutGeometry};
use crate::gesture::TouchSample;

/// A letter key crossed by a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHit {
    pub key: KeyId,
    /// Lowercased letter produced by the key.
    pub letter: char,
}

/// Ordered letter keys crossed by one gesture, consecutive repeats removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyHitSequence {
    hits: Vec<KeyHit>,
}

impl KeyHitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence straight from letters, as if each letter's key had
    /// been crossed in turn. Key ids are positional placeholders.
    pub fn from_letters(letters: &str) -> Self {
        let mut seq = Self::new();
        for (i, ch) in letters.chars().enumerate() {
            if let Some(letter) = ch.to_lowercase().next().filter(|c| c.is_alphabetic()) {
                seq.push(KeyHit {
                    key: KeyId(i as u32),
                    letter,
                });
            }
        }
        seq
    }

    /// Append a hit unless it repeats the previous letter.
    fn push(&mut self, hit: KeyHit) {
        if self.hits.last().map(|h| h.letter) != Some(hit.letter) {
            self.hits.push(hit);
        }
    }

    pub fn hits(&self) -> &[KeyHit] {
        &self.hits
    }

    pub fn letters(&self) -> String {
        self.hits.iter().map(|h| h.letter).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Convert a gesture's samples into the letter keys it crossed.
///
/// For each sample the first key containing the point is taken. Non-letter
/// keys and points outside every key are skipped, and a letter is appended
/// only when it differs from the last appended one, so "hello" swiped with
/// a pause on `l` yields `h e l o`. A letter revisited later ("lol") is kept.
///
/// Pure and deterministic; empty geometry or no samples give an empty
/// sequence.
pub fn map_to_keys(samples: &[TouchSample], geometry: &KeyboardLayoutGeometry) -> KeyHitSequence {
    let mut seq = KeyHitSequence::new();
    if geometry.is_empty() {
        return seq;
    }
    for sample in samples {
        let Some(key) = geometry.key_at(sample.x, sample.y) else {
            continue;
        };
        if let Some(letter) = key.letter() {
            seq.push(KeyHit {
                key: key.id,
                letter,
            });
        }
    }
    seq
}
