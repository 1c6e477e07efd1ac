/// Prefix trie holding normalized dictionary words and their frequencies.
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// A prefix tree (trie) node.
///
/// Children are ordered by character so traversals are deterministic. Each
/// node also records the highest word frequency found anywhere below it,
/// which lets top-k searches skip whole subtrees.
///
/// # Example
/// ```
/// use glide_core::trie::TrieNode;
///
/// let mut trie = TrieNode::new();
/// trie.insert("the", 500);
/// trie.insert("then", 40);
///
/// assert!(trie.contains_word("the"));
/// assert!(!trie.contains_word("th"));
/// assert_eq!(trie.top_k_with_prefix("th", 1), vec![("the".to_string(), 500)]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct TrieNode {
    children: BTreeMap<char, Box<TrieNode>>,
    /// When the path to this node spells a word, the word and its frequency.
    word: Option<(String, u32)>,
    max_freq_in_subtree: u32,
}

impl TrieNode {
    /// Create a new empty trie root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a word. Re-inserting keeps the higher frequency.
    ///
    /// Returns `true` if the word was not present before.
    pub fn insert(&mut self, word: &str, frequency: u32) -> bool {
        let mut node = self;
        node.max_freq_in_subtree = node.max_freq_in_subtree.max(frequency);
        for ch in word.chars() {
            node = node
                .children
                .entry(ch)
                .or_insert_with(|| Box::new(TrieNode::new()));
            node.max_freq_in_subtree = node.max_freq_in_subtree.max(frequency);
        }
        match node.word.as_mut() {
            Some((_, existing)) => {
                *existing = (*existing).max(frequency);
                false
            }
            None => {
                node.word = Some((word.to_string(), frequency));
                true
            }
        }
    }

    /// Node reached by following `prefix`, if any.
    pub fn descend(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = self;
        for ch in prefix.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    /// Check whether the trie contains exactly the given word.
    ///
    /// Returns `true` only if `word` exists as a complete word, not just as a
    /// prefix.
    pub fn contains_word(&self, word: &str) -> bool {
        self.frequency(word).is_some()
    }

    /// Frequency of a complete word.
    pub fn frequency(&self, word: &str) -> Option<u32> {
        self.descend(word)?.word.as_ref().map(|(_, f)| *f)
    }

    /// Word ending at this node.
    pub fn word(&self) -> Option<(&str, u32)> {
        self.word.as_ref().map(|(w, f)| (w.as_str(), *f))
    }

    pub fn child(&self, ch: char) -> Option<&TrieNode> {
        self.children.get(&ch).map(|b| b.as_ref())
    }

    pub fn children(&self) -> impl Iterator<Item = (char, &TrieNode)> {
        self.children.iter().map(|(c, n)| (*c, n.as_ref()))
    }

    pub fn max_freq_in_subtree(&self) -> u32 {
        self.max_freq_in_subtree
    }

    /// The `k` most frequent words starting with `prefix`, most frequent
    /// first (ties alphabetical).
    ///
    /// Subtrees whose best frequency cannot beat the current k-th result are
    /// never visited.
    pub fn top_k_with_prefix(&self, prefix: &str, k: usize) -> Vec<(String, u32)> {
        if k == 0 {
            return Vec::new();
        }
        let Some(start) = self.descend(prefix) else {
            return Vec::new();
        };

        // Min-heap on (freq, Reverse(word)): the root is the entry to evict.
        let mut heap: BinaryHeap<Reverse<(u32, Reverse<String>)>> = BinaryHeap::new();
        start.collect_top_k(k, &mut heap);

        let mut out: Vec<(String, u32)> = heap
            .into_iter()
            .map(|Reverse((f, Reverse(w)))| (w, f))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    fn collect_top_k(&self, k: usize, heap: &mut BinaryHeap<Reverse<(u32, Reverse<String>)>>) {
        if let Some((w, f)) = &self.word {
            let entry = Reverse((*f, Reverse(w.clone())));
            if heap.len() < k {
                heap.push(entry);
            } else if heap.peek().is_some_and(|min| entry < *min) {
                heap.pop();
                heap.push(entry);
            }
        }

        for child in self.children.values() {
            let floor = if heap.len() == k {
                heap.peek().map(|Reverse((f, _))| *f).unwrap_or(0)
            } else {
                0
            };
            if heap.len() < k || child.max_freq_in_subtree >= floor {
                child.collect_top_k(k, heap);
            }
        }
    }
}
