//! Swipe decoding: key-hit sequence to ranked dictionary words.
//!
//! The decoder walks the dictionary trie once per request, advancing a
//! subsequence cursor over the swiped letters. A word qualifies when
//!
//! - its first and last letters equal the first and last swiped letters,
//! - its letters appear in order in the swiped sequence (a doubled letter in
//!   the word may reuse the key hit of its twin, because the mapper drops
//!   consecutive repeats),
//! - enough of the swiped letters are used: `matched / sequence length` is at
//!   least `min_match_fraction`.
//!
//! Qualifying words score `fraction * ln(frequency + 1)`. A word spelled
//! exactly by the swiped letters always comes first.
use ahash::AHashMap;
use tracing::debug;

use crate::candidate::{Candidate, CandidateSource};
use crate::keyhit::KeyHitSequence;
use crate::lexicon::Dictionary;
use crate::trie::TrieNode;
use crate::Config;

#[derive(Debug, Clone)]
pub struct SwipeDecoder {
    top_k: usize,
    min_fraction: f64,
}

/// Walk state below one trie node.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    /// First sequence position still available for matching.
    next: usize,
    /// Sequence positions consumed so far.
    matched: usize,
    prev: char,
}

/// Best match found for a word during the walk.
#[derive(Debug, Clone, Copy)]
struct Match {
    fraction: f64,
    frequency: u32,
}

impl Default for SwipeDecoder {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl SwipeDecoder {
    pub fn new(config: &Config) -> Self {
        Self {
            top_k: config.swipe_top_k,
            min_fraction: config.min_match_fraction,
        }
    }

    /// Decode a key-hit sequence against `dictionary`.
    ///
    /// Sequences of length 0 or 1 and empty dictionaries give no candidates.
    pub fn decode(&self, sequence: &KeyHitSequence, dictionary: &Dictionary) -> Vec<Candidate> {
        self.decode_letters(&sequence.letters(), dictionary)
    }

    /// Decode a plain letter string, as if each letter were a key hit.
    pub fn decode_letters(&self, letters: &str, dictionary: &Dictionary) -> Vec<Candidate> {
        let seq: Vec<char> = letters.chars().flat_map(char::to_lowercase).collect();
        if seq.len() <= 1 || dictionary.is_empty() || self.top_k == 0 {
            return Vec::new();
        }

        let literal: String = seq.iter().collect();
        let exact = dictionary.root().frequency(&literal);

        let mut found: AHashMap<String, Match> = AHashMap::new();
        if let Some(start) = dictionary.root().child(seq[0]) {
            let cursor = Cursor {
                next: 1,
                matched: 1,
                prev: seq[0],
            };
            self.walk(start, &seq, cursor, &mut found);
        }

        let mut ranked: Vec<(String, Match)> = found
            .into_iter()
            .filter(|(w, _)| *w != literal)
            .collect();
        ranked.sort_by(|(wa, a), (wb, b)| {
            score(b)
                .total_cmp(&score(a))
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| wa.chars().count().cmp(&wb.chars().count()))
                .then_with(|| wa.cmp(wb))
        });

        let mut out: Vec<Candidate> = Vec::with_capacity(self.top_k);
        if let Some(freq) = exact {
            let own = score(&Match {
                fraction: 1.0,
                frequency: freq,
            });
            // Never below the best approximate match so a stable re-sort keeps it first.
            let best_other = ranked.first().map(|(_, m)| score(m)).unwrap_or(own);
            out.push(Candidate::new(
                literal.clone(),
                own.max(best_other),
                CandidateSource::Swipe,
            ));
        }
        out.extend(
            ranked
                .into_iter()
                .map(|(w, m)| Candidate::new(w, score(&m), CandidateSource::Swipe)),
        );
        out.truncate(self.top_k);

        debug!(
            sequence = %literal,
            candidates = out.len(),
            exact = exact.is_some(),
            "swipe decoded"
        );
        out
    }

    fn walk(
        &self,
        node: &TrieNode,
        seq: &[char],
        cursor: Cursor,
        found: &mut AHashMap<String, Match>,
    ) {
        let n = seq.len();
        if let Some((word, frequency)) = node.word() {
            if Some(&cursor.prev) == seq.last() {
                let fraction = cursor.matched as f64 / n as f64;
                if fraction >= self.min_fraction {
                    let entry = found.entry(word.to_string()).or_insert(Match {
                        fraction,
                        frequency,
                    });
                    if fraction > entry.fraction {
                        entry.fraction = fraction;
                    }
                }
            }
        }

        for (ch, child) in node.children() {
            if ch == cursor.prev {
                self.walk(child, seq, Cursor { prev: ch, ..cursor }, found);
            }
            let Some(offset) = seq[cursor.next..].iter().position(|&c| c == ch) else {
                continue;
            };
            let advanced = Cursor {
                next: cursor.next + offset + 1,
                matched: cursor.matched + 1,
                prev: ch,
            };
            // Even matching every remaining letter cannot reach the threshold.
            let reachable = (advanced.matched + n - advanced.next) as f64 / n as f64;
            if reachable >= self.min_fraction {
                self.walk(child, seq, advanced, found);
            }
        }
    }
}

fn score(m: &Match) -> f64 {
    m.fraction * (m.frequency as f64 + 1.0).ln()
}
