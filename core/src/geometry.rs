//! Keyboard layout geometry supplied by the rendering layer.
//!
//! A `KeyboardLayoutGeometry` is built once per active layout (letters,
//! symbols, numbers) and replaced wholesale when the layout changes. It is
//! never mutated in place, so it is shared behind an `Arc`.
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Identifier of a key within one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(pub u32);

/// Axis-aligned key rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the left/top edges belong to the key, the
    /// right/bottom edges belong to the neighbour.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One key: where it is and what it types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub id: KeyId,
    pub bounds: Rect,
    /// Character produced by the key; `None` for shift, backspace, etc.
    pub output: Option<char>,
}

impl Key {
    /// Lowercased letter produced by this key, if it produces a letter.
    pub fn letter(&self) -> Option<char> {
        self.output
            .filter(|c| c.is_alphabetic())
            .and_then(|c| c.to_lowercase().next())
    }
}

/// Immutable key table for the active layout.
///
/// Keys are kept in insertion order; hit-testing returns the first key whose
/// rectangle contains the point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardLayoutGeometry {
    keys: Vec<Key>,
}

impl KeyboardLayoutGeometry {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// A standard three-row QWERTY letter layout with uniform keys.
    ///
    /// Rows are staggered by half a key and one and a half keys, as on a
    /// phone keyboard. Key ids are assigned in row-major order.
    ///
    /// # Example
    /// ```
    /// use glide_core::KeyboardLayoutGeometry;
    ///
    /// let geometry = KeyboardLayoutGeometry::qwerty(40.0, 60.0);
    /// assert_eq!(geometry.len(), 26);
    /// let q = geometry.key_at(5.0, 5.0).unwrap();
    /// assert_eq!(q.output, Some('q'));
    /// ```
    pub fn qwerty(key_width: f32, key_height: f32) -> Self {
        const ROWS: [(&str, f32); 3] = [("qwertyuiop", 0.0), ("asdfghjkl", 0.5), ("zxcvbnm", 1.5)];
        let mut keys = Vec::with_capacity(26);
        let mut next_id = 0u32;
        for (row_idx, (letters, offset)) in ROWS.iter().enumerate() {
            for (col, ch) in letters.chars().enumerate() {
                let bounds = Rect::new(
                    (offset + col as f32) * key_width,
                    row_idx as f32 * key_height,
                    key_width,
                    key_height,
                );
                keys.push(Key {
                    id: KeyId(next_id),
                    bounds,
                    output: Some(ch),
                });
                next_id += 1;
            }
        }
        Self { keys }
    }

    /// Parse a layout handed over by the rendering layer as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First key whose rectangle contains the point.
    pub fn key_at(&self, x: f32, y: f32) -> Option<&Key> {
        self.keys.iter().find(|k| k.bounds.contains(x, y))
    }

    pub fn key(&self, id: KeyId) -> Option<&Key> {
        self.keys.iter().find(|k| k.id == id)
    }

    /// First key producing `letter` (case-insensitive).
    pub fn key_for_letter(&self, letter: char) -> Option<&Key> {
        let lower = letter.to_lowercase().next()?;
        self.keys.iter().find(|k| k.letter() == Some(lower))
    }

    /// Derive the letter adjacency relation used as the autocorrect
    /// confusion matrix.
    ///
    /// Two letter keys are adjacent when the distance between their centres
    /// is at most `factor` times the wider of the two keys.
    pub fn adjacency(&self, factor: f32) -> Adjacency {
        let letters: Vec<(char, &Key)> = self
            .keys
            .iter()
            .filter_map(|k| k.letter().map(|c| (c, k)))
            .collect();

        let mut pairs = AHashSet::new();
        for (i, (a, ka)) in letters.iter().enumerate() {
            let (ax, ay) = ka.bounds.center();
            for (b, kb) in letters.iter().skip(i + 1) {
                if a == b {
                    continue;
                }
                let (bx, by) = kb.bounds.center();
                let dist = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
                let reach = factor * ka.bounds.width.max(kb.bounds.width);
                if dist <= reach {
                    pairs.insert((*a, *b));
                    pairs.insert((*b, *a));
                }
            }
        }
        Adjacency { pairs }
    }
}

/// Symmetric "these two letters sit next to each other" relation.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    pairs: AHashSet<(char, char)>,
}

impl Adjacency {
    /// Relation with no adjacent pairs (used before any layout is known).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_adjacent(&self, a: char, b: char) -> bool {
        self.pairs.contains(&(a, b))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qwerty_hit_testing() {
        let g = KeyboardLayoutGeometry::qwerty(10.0, 10.0);
        assert_eq!(g.key_at(0.0, 0.0).and_then(|k| k.output), Some('q'));
        assert_eq!(g.key_at(99.9, 9.9).and_then(|k| k.output), Some('p'));
        // 'a' row is shifted by half a key
        assert_eq!(g.key_at(5.0, 15.0).and_then(|k| k.output), Some('a'));
        assert!(g.key_at(0.0, 15.0).is_none());
        assert!(g.key_at(-1.0, 0.0).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let g = KeyboardLayoutGeometry::new(vec![
            Key {
                id: KeyId(1),
                bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
                output: Some('a'),
            },
            Key {
                id: KeyId(2),
                bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
                output: Some('b'),
            },
        ]);
        assert_eq!(g.key_at(5.0, 5.0).map(|k| k.id), Some(KeyId(1)));
    }

    #[test]
    fn test_qwerty_adjacency() {
        let g = KeyboardLayoutGeometry::qwerty(10.0, 10.0);
        let adj = g.adjacency(1.5);
        assert!(adj.is_adjacent('q', 'w'));
        assert!(adj.is_adjacent('w', 'q'));
        assert!(adj.is_adjacent('e', 'r'));
        assert!(adj.is_adjacent('s', 'w'));
        assert!(adj.is_adjacent('h', 'n'));
        assert!(!adj.is_adjacent('q', 'e'));
        assert!(!adj.is_adjacent('e', 'h'));
        assert!(!adj.is_adjacent('a', 'a'));
    }

    #[test]
    fn test_non_letter_keys_have_no_letter() {
        let key = Key {
            id: KeyId(0),
            bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
            output: Some('7'),
        };
        assert_eq!(key.letter(), None);
        let upper = Key {
            output: Some('Q'),
            ..key
        };
        assert_eq!(upper.letter(), Some('q'));
    }

    #[test]
    fn test_json_round_trip() {
        let g = KeyboardLayoutGeometry::qwerty(32.0, 48.0);
        let json = g.to_json().expect("serialize");
        let back = KeyboardLayoutGeometry::from_json(&json).expect("parse");
        assert_eq!(back, g);
    }
}
