//! Prefix tree of frequent event sequences annotated with support counts
//!
//! A `PatternTrie` node stands for one frequent prefix. Its `count` is the
//! number of training sequences containing that prefix, and its children map
//! the next key to the node for the one-longer prefix. The root is the empty
//! prefix; its count is the size of the sequence database.
//!
//! The structure is a single concrete record type generic over the key, so
//! the beam matcher and the segmenter work on any `Ord` key.

use std::collections::BTreeMap;

/// One node of a pattern trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTrie<K> {
    count: usize,
    children: BTreeMap<K, PatternTrie<K>>,
}

impl<K: Ord + Clone> PatternTrie<K> {
    /// Leaf node with the given support
    pub fn new(count: usize) -> Self {
        Self {
            count,
            children: BTreeMap::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn child(&self, key: &K) -> Option<&PatternTrie<K>> {
        self.children.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.children.contains_key(key)
    }

    /// Children in key order
    pub fn children(&self) -> impl Iterator<Item = (&K, &PatternTrie<K>)> {
        self.children.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.children.keys()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child keys ordered by descending child support, ties by key
    pub fn keys_by_support(&self) -> Vec<&K> {
        let mut keys: Vec<_> = self.children.iter().collect();
        keys.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        keys.into_iter().map(|(key, _)| key).collect()
    }

    /// Record `path` with support `count`
    ///
    /// Missing intermediate prefixes are created with count 0; a miner inserts
    /// every frequent prefix itself, so those placeholders get overwritten.
    pub fn insert(&mut self, path: &[K], count: usize) {
        let mut node = self;
        for key in path {
            node = node
                .children
                .entry(key.clone())
                .or_insert_with(|| PatternTrie::new(0));
        }
        node.count = count;
    }

    /// Node for the prefix `path`, if recognized
    pub fn get(&self, path: &[K]) -> Option<&PatternTrie<K>> {
        let mut node = self;
        for key in path {
            node = node.children.get(key)?;
        }
        Some(node)
    }

    /// Number of prefixes stored below the root
    pub fn len(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += node.children.len();
            stack.extend(node.children.values());
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Every stored prefix with its support, shortest first
    pub fn prefixes(&self) -> Vec<(Vec<K>, usize)> {
        let mut out = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((Vec::new(), self));
        while let Some((prefix, node)) = queue.pop_front() {
            for (key, child) in &node.children {
                let mut path = prefix.clone();
                path.push(key.clone());
                out.push((path.clone(), child.count));
                queue.push_back((path, child));
            }
        }
        out
    }
}
