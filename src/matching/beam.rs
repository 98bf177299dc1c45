use crate::trie::PatternTrie;
use std::collections::VecDeque;

/// Bounded-divergence beam search of a sequence against a pattern trie
///
/// For each observed element the matcher searches breadth-first below its
/// current trie position. A direct child costs nothing; each further level
/// (grandchild, great-grandchild, ...) is one unit of divergence, explored up
/// to the remaining budget `d - k`. The shallowest node carrying the element
/// wins and becomes the new position. If nothing within budget matches, the
/// whole sequence fails.
///
/// The running divergence is updated as `k = min(k, j)`: it records the best
/// divergence seen, not a cumulative cost. Since `k` starts at 0 this keeps
/// the full budget available at every step. Changing the rule changes which
/// paths count as matching, so it is kept as is.
///
/// This is a heuristic alignment, not a containment proof.
#[derive(Debug, Clone, Copy)]
pub struct TrieMatcher<'a, K> {
    trie: &'a PatternTrie<K>,
    max_divergence: usize,
}

impl<'a, K: Ord + Clone> TrieMatcher<'a, K> {
    pub fn new(trie: &'a PatternTrie<K>, max_divergence: usize) -> Self {
        Self {
            trie,
            max_divergence,
        }
    }

    /// Final divergence `k` if `sequence` is covered within budget, `None` otherwise
    ///
    /// ```
    /// use loggraph::matching::TrieMatcher;
    /// use loggraph::trie::PatternTrie;
    ///
    /// let mut trie = PatternTrie::new(2);
    /// trie.insert(&[1], 2);
    /// trie.insert(&[1, 2], 2);
    /// trie.insert(&[1, 2, 3], 2);
    ///
    /// assert_eq!(TrieMatcher::new(&trie, 0).matches(&[1, 2, 3]), Some(0));
    /// assert_eq!(TrieMatcher::new(&trie, 0).matches(&[1, 3]), None);
    /// assert_eq!(TrieMatcher::new(&trie, 1).matches(&[1, 3]), Some(0));
    /// ```
    pub fn matches(&self, sequence: &[K]) -> Option<usize> {
        let mut position = self.trie;
        let mut k = 0;

        for element in sequence {
            let budget = self.max_divergence.saturating_sub(k);
            let (node, j) = Self::search(position, element, budget)?;
            k = k.min(j);
            position = node;
        }

        Some(k)
    }

    pub fn is_covered(&self, sequence: &[K]) -> bool {
        self.matches(sequence).is_some()
    }

    /// Shallowest descendant of `start` reached by an edge labelled `target`
    fn search<'t>(
        start: &'t PatternTrie<K>,
        target: &K,
        budget: usize,
    ) -> Option<(&'t PatternTrie<K>, usize)> {
        let mut queue: VecDeque<(&K, &PatternTrie<K>, usize)> = start
            .children()
            .map(|(key, child)| (key, child, 0))
            .collect();

        while let Some((key, node, depth)) = queue.pop_front() {
            if key == target {
                return Some((node, depth));
            }
            if depth < budget {
                queue.extend(node.children().map(|(k, c)| (k, c, depth + 1)));
            }
        }

        None
    }
}
