//! Keyboard-aware autocorrect.
//!
//! Distance is a weighted optimal-string-alignment (restricted
//! Damerau-Levenshtein) distance. Insertions, deletions and ordinary
//! substitutions cost 1.0; substituting a key that touches the intended key
//! and swapping two neighbouring letters are cheaper. The DP rows are built
//! incrementally while walking the dictionary trie, so a whole subtree is
//! abandoned as soon as every cell of its row exceeds the cost cap.
//!
//! URLs, email addresses, hashtags and identifiers are never touched, and a
//! correction the user rejected once is not offered again.
use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::sync::Arc;

use ahash::AHashSet;
use lru::LruCache;
use tracing::{debug, trace};

use crate::assets::Assets;
use crate::candidate::{Candidate, CandidateSource};
use crate::geometry::{Adjacency, KeyboardLayoutGeometry};
use crate::lexicon::Dictionary;
use crate::normalize::{match_case, normalize};
use crate::trie::TrieNode;
use crate::Config;

/// Per-thread correction engine. Owned by the worker.
pub struct AutocorrectEngine {
    assets: Arc<Assets>,
    adjacency: Adjacency,
    adjacency_factor: f32,
    adjacent_cost: f64,
    transposition_cost: f64,
    max_cost: f64,
    /// (language, normalized word) -> normalized correction
    cache: RefCell<LruCache<(String, String), Option<String>>>,
    cache_hits: Cell<usize>,
    cache_misses: Cell<usize>,
    /// Rejected (original, correction) pairs, lowercased.
    blacklist: AHashSet<(String, String)>,
}

/// A dictionary word within the cost cap.
#[derive(Debug, Clone, PartialEq)]
struct Scored {
    word: String,
    cost: f64,
    frequency: u32,
}

/// Read-only inputs of one trie walk.
struct Search<'a> {
    target: &'a [char],
    adjacency: &'a Adjacency,
    adjacent_cost: f64,
    transposition_cost: f64,
    max_cost: f64,
}

impl AutocorrectEngine {
    pub fn new(config: &Config, assets: Arc<Assets>) -> Self {
        let capacity = NonZeroUsize::new(config.max_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            assets,
            adjacency: Adjacency::empty(),
            adjacency_factor: config.adjacency_factor,
            adjacent_cost: config.adjacent_substitution_cost,
            transposition_cost: config.transposition_cost,
            max_cost: config.max_correction_cost,
            cache: RefCell::new(LruCache::new(capacity)),
            cache_hits: Cell::new(0),
            cache_misses: Cell::new(0),
            blacklist: AHashSet::new(),
        }
    }

    /// Rebuild the confusion matrix from a new layout.
    ///
    /// Clears the cache, since cached results depend on adjacency.
    pub fn set_layout(&mut self, geometry: &KeyboardLayoutGeometry) {
        self.adjacency = geometry.adjacency(self.adjacency_factor);
        self.clear_cache();
        debug!(keys = geometry.len(), "autocorrect adjacency rebuilt");
    }

    /// Best correction for `word`, or `None` when the word is fine or
    /// nothing close enough exists.
    ///
    /// The returned word follows the capitalization of the input.
    pub fn correct(&self, word: &str, language: &str) -> Option<String> {
        if is_protected(word) {
            return None;
        }
        let key = normalize(word);
        if !is_correctable(&key) {
            return None;
        }

        let cache_key = (language.to_string(), key);
        if let Some(cached) = self.cache.borrow_mut().get(&cache_key) {
            self.cache_hits.set(self.cache_hits.get() + 1);
            return cached.as_ref().map(|c| match_case(word, c));
        }
        self.cache_misses.set(self.cache_misses.get() + 1);

        let dictionary = &self.assets.pack(language).dictionary;
        let best = if dictionary.root().contains_word(&cache_key.1) {
            None
        } else {
            self.search(&cache_key.1, dictionary)
                .into_iter()
                .find(|s| !self.is_blacklisted(&cache_key.1, &s.word))
                .map(|s| s.word)
        };
        trace!(word = %cache_key.1, correction = ?best, "autocorrect lookup");

        let out = best.as_ref().map(|c| match_case(word, c));
        self.cache.borrow_mut().put(cache_key, best);
        out
    }

    /// Up to `limit` correction candidates for `word`, best first.
    ///
    /// Scores are `1 - cost / (max_cost + 1)`. The word itself is never
    /// suggested.
    pub fn suggest(&self, word: &str, language: &str, limit: usize) -> Vec<Candidate> {
        if is_protected(word) || limit == 0 {
            return Vec::new();
        }
        let key = normalize(word);
        if !is_correctable(&key) {
            return Vec::new();
        }
        let dictionary = &self.assets.pack(language).dictionary;
        self.search(&key, dictionary)
            .into_iter()
            .filter(|s| s.word != key && !self.is_blacklisted(&key, &s.word))
            .take(limit)
            .map(|s| {
                let score = 1.0 - s.cost / (self.max_cost + 1.0);
                Candidate::new(match_case(word, &s.word), score, CandidateSource::Autocorrect)
            })
            .collect()
    }

    /// Weighted distance between two words under the current layout.
    pub fn distance(&self, a: &str, b: &str) -> f64 {
        let target: Vec<char> = b.chars().collect();
        let search = self.search_params(&target);
        let mut rows = vec![initial_row(target.len())];
        let mut prev: Option<char> = None;
        for ch in a.chars() {
            let row = search.next_row(&rows, ch, prev);
            rows.push(row);
            prev = Some(ch);
        }
        rows.last().map(|r| r[target.len()]).unwrap_or(0.0)
    }

    fn search_params<'a>(&'a self, target: &'a [char]) -> Search<'a> {
        Search {
            target,
            adjacency: &self.adjacency,
            adjacent_cost: self.adjacent_cost,
            transposition_cost: self.transposition_cost,
            max_cost: self.max_cost,
        }
    }

    /// All words sharing the first letter, within one letter of the length
    /// and within the cost cap; sorted by cost, frequency, then alphabet.
    fn search(&self, key: &str, dictionary: &Dictionary) -> Vec<Scored> {
        let target: Vec<char> = key.chars().collect();
        let Some(&first) = target.first() else {
            return Vec::new();
        };
        let Some(start) = dictionary.root().child(first) else {
            return Vec::new();
        };

        let search = self.search_params(&target);
        let mut rows = vec![initial_row(target.len())];
        let mut found = Vec::new();
        search.walk(start, first, None, &mut rows, &mut found);

        found.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.word.cmp(&b.word))
        });
        found
    }

    /// Never again turn `original` into `correction`.
    pub fn blacklist_correction(&mut self, original: &str, correction: &str) {
        let pair = (normalize(original), normalize(correction));
        debug!(original = %pair.0, correction = %pair.1, "correction blacklisted");
        if self.blacklist.insert(pair) {
            self.clear_cache();
        }
    }

    pub fn is_blacklisted(&self, original: &str, correction: &str) -> bool {
        self.blacklist
            .contains(&(original.to_lowercase(), correction.to_lowercase()))
    }

    pub fn clear_blacklist(&mut self) {
        self.blacklist.clear();
        self.clear_cache();
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// (hits, misses) since construction.
    pub fn cache_stats(&self) -> (usize, usize) {
        (self.cache_hits.get(), self.cache_misses.get())
    }

    pub fn cache_size(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// Raw tokens that are not words: URLs, email addresses, hashtags and
/// identifiers.
fn is_protected(raw: &str) -> bool {
    raw.contains("://")
        || (raw.contains('@') && raw.contains('.'))
        || raw.starts_with('#')
        || raw.contains('_')
        || raw.contains('-')
}

fn is_correctable(key: &str) -> bool {
    key.chars().count() >= 2 && !key.chars().any(char::is_numeric)
}

/// A correction the host applied to the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCorrection {
    pub original: String,
    pub corrected: String,
    pub t_ms: u64,
}

/// The last applied correction, revertible for a short window.
#[derive(Debug, Clone)]
pub struct CorrectionHistory {
    last: Option<AppliedCorrection>,
    window_ms: u64,
}

impl CorrectionHistory {
    pub fn new(window_ms: u64) -> Self {
        Self {
            last: None,
            window_ms,
        }
    }

    pub fn record(&mut self, original: &str, corrected: &str, t_ms: u64) {
        self.last = Some(AppliedCorrection {
            original: original.to_string(),
            corrected: corrected.to_string(),
            t_ms,
        });
    }

    /// The last correction if it is younger than the window at `now_ms`.
    pub fn revert_candidate(&self, now_ms: u64) -> Option<&AppliedCorrection> {
        self.last
            .as_ref()
            .filter(|c| now_ms.saturating_sub(c.t_ms) < self.window_ms)
    }

    /// Like `revert_candidate`, but consumes it: a correction is reverted
    /// at most once.
    pub fn take_revert(&mut self, now_ms: u64) -> Option<AppliedCorrection> {
        self.revert_candidate(now_ms)?;
        self.last.take()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

fn initial_row(m: usize) -> Vec<f64> {
    (0..=m).map(|j| j as f64).collect()
}

impl Search<'_> {
    fn substitution(&self, a: char, b: char) -> f64 {
        if a == b {
            0.0
        } else if self.adjacency.is_adjacent(a, b) {
            self.adjacent_cost
        } else {
            1.0
        }
    }

    /// DP row for appending `ch` (preceded by `prev`) to the candidate.
    /// `rows` holds every row so far, the last one being the row for `prev`.
    fn next_row(&self, rows: &[Vec<f64>], ch: char, prev: Option<char>) -> Vec<f64> {
        let m = self.target.len();
        let i = rows.len();
        let above = &rows[i - 1];
        let mut row = Vec::with_capacity(m + 1);
        row.push(i as f64);
        for j in 1..=m {
            let t = self.target[j - 1];
            let mut cost = (above[j] + 1.0)
                .min(row[j - 1] + 1.0)
                .min(above[j - 1] + self.substitution(ch, t));
            if let Some(p) = prev {
                if i >= 2 && j >= 2 && ch != p && ch == self.target[j - 2] && p == t {
                    cost = cost.min(rows[i - 2][j - 2] + self.transposition_cost);
                }
            }
            row.push(cost);
        }
        row
    }

    fn walk(
        &self,
        node: &TrieNode,
        ch: char,
        prev: Option<char>,
        rows: &mut Vec<Vec<f64>>,
        found: &mut Vec<Scored>,
    ) {
        let m = self.target.len();
        let row = self.next_row(rows, ch, prev);
        let depth = rows.len();
        let row_min = row.iter().copied().fold(f64::INFINITY, f64::min);

        if let Some((word, frequency)) = node.word() {
            let cost = row[m];
            if depth + 1 >= m && depth <= m + 1 && cost <= self.max_cost {
                found.push(Scored {
                    word: word.to_string(),
                    cost,
                    frequency,
                });
            }
        }

        if row_min > self.max_cost || depth > m {
            return;
        }
        rows.push(row);
        for (next, child) in node.children() {
            self.walk(child, next, Some(ch), rows, found);
        }
        rows.pop();
    }
}
