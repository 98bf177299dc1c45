use crate::trie::PatternTrie;

/// Greedy partition of an item stream into runs recognized by a trie
///
/// Starting from the head of the remaining items, the segmenter walks down
/// the trie. At each node it looks for the next wanted key anywhere later in
/// the remaining items (skipping non-matching items in between), trying
/// continuations in order of descending support. The items it walked over
/// form one run and are removed; the rest keeps its relative order. A head
/// item the trie does not know becomes a run of its own.
///
/// Every iteration removes at least one item, so the loop terminates and
/// every input item lands in exactly one run.
#[derive(Debug, Clone, Copy)]
pub struct TrieSegmenter<'a, K> {
    trie: &'a PatternTrie<K>,
}

impl<'a, K: Ord + Clone> TrieSegmenter<'a, K> {
    pub fn new(trie: &'a PatternTrie<K>) -> Self {
        Self { trie }
    }

    /// Partition `items`, projecting each item to its trie key with `key`
    ///
    /// ```
    /// use loggraph::matching::TrieSegmenter;
    /// use loggraph::trie::PatternTrie;
    ///
    /// let mut trie = PatternTrie::new(3);
    /// trie.insert(&[2], 3);
    /// trie.insert(&[2, 3], 3);
    ///
    /// let runs = TrieSegmenter::new(&trie).segment(vec![4, 2, 9, 3, 1], |x| *x);
    /// assert_eq!(runs, vec![vec![4], vec![2, 3], vec![9], vec![1]]);
    /// ```
    pub fn segment<T, F>(&self, items: impl IntoIterator<Item = T>, key: F) -> Vec<Vec<T>>
    where
        F: Fn(&T) -> K,
    {
        let mut remaining: Vec<T> = items.into_iter().collect();
        let mut runs = Vec::new();

        while !remaining.is_empty() {
            let keys: Vec<K> = remaining.iter().map(&key).collect();
            let indices = self.match_indices(&keys);

            if indices.is_empty() {
                runs.push(vec![remaining.remove(0)]);
                continue;
            }

            let mut run: Vec<T> = indices
                .iter()
                .rev()
                .map(|&index| remaining.remove(index))
                .collect();
            run.reverse();
            runs.push(run);
        }

        runs
    }

    /// Key partition without a projection
    pub fn segment_keys(&self, keys: &[K]) -> Vec<Vec<K>> {
        self.segment(keys.iter().cloned(), K::clone)
    }

    /// Strictly increasing positions of the run that starts at `keys[0]`
    fn match_indices(&self, keys: &[K]) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut node = self.trie;
        let mut next = 0;

        while next < keys.len() {
            let Some(child) = node.child(&keys[next]) else {
                break;
            };
            node = child;
            indices.push(next);
            let current = next;

            let found = node.keys_by_support().into_iter().find_map(|wanted| {
                keys[current + 1..]
                    .iter()
                    .position(|k| k == wanted)
                    .map(|offset| current + 1 + offset)
            });
            match found {
                Some(position) => next = position,
                None => break,
            }
        }

        indices
    }
}
