//! Frequent sequential pattern mining
//!
//! The pipeline only depends on the contract
//! `mine(sequences, min_support) -> PatternTrie`, expressed as the
//! [`SequenceMiner`] trait. [`PrefixSpan`] is the default implementation:
//! support is counted once per sequence, patterns are (not necessarily
//! contiguous) subsequences, and every frequent pattern becomes a trie node.
//!
//! Pei, J., Han, J., et al. (2001). PrefixSpan: Mining sequential patterns
//! efficiently by prefix-projected pattern growth. ICDE.

use crate::catalog::EventId;
use crate::trie::PatternTrie;
use crate::windowing::Sequence;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum support threshold, absolute or relative to the dataset size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinSupport {
    Absolute(usize),
    Ratio(f64),
}

impl MinSupport {
    /// Absolute count for a dataset of `n_sequences`: `floor(ratio * n)` for ratios
    pub fn resolve(&self, n_sequences: usize) -> usize {
        match *self {
            MinSupport::Absolute(count) => count,
            MinSupport::Ratio(ratio) => (ratio * n_sequences as f64).floor() as usize,
        }
    }
}

impl Default for MinSupport {
    fn default() -> Self {
        MinSupport::Ratio(0.05)
    }
}

/// Builds a pattern trie from a sequence database
pub trait SequenceMiner {
    fn mine(&self, sequences: &[Sequence], min_support: usize) -> PatternTrie<EventId>;
}

/// Prefix-projected pattern growth
#[derive(Debug, Clone, Default)]
pub struct PrefixSpan {
    /// Longest pattern to grow; `None` grows until support runs out
    pub max_pattern_len: Option<usize>,
}

/// `(sequence index, suffix start)` pairs of a projected database
type Projection = Vec<(usize, usize)>;

impl SequenceMiner for PrefixSpan {
    fn mine(&self, sequences: &[Sequence], min_support: usize) -> PatternTrie<EventId> {
        // An item that never occurs has support 0 and is never frequent.
        let min_support = min_support.max(1);
        let max_len = self.max_pattern_len.unwrap_or(usize::MAX);

        let mut trie = PatternTrie::new(sequences.len());
        let root: Projection = (0..sequences.len()).map(|s| (s, 0)).collect();
        let mut worklist: Vec<(Vec<EventId>, Projection)> = vec![(Vec::new(), root)];

        while let Some((pattern, projection)) = worklist.pop() {
            if pattern.len() >= max_len {
                continue;
            }

            let mut support: BTreeMap<EventId, usize> = BTreeMap::new();
            for &(s, start) in &projection {
                let distinct: BTreeSet<EventId> = sequences[s][start..].iter().copied().collect();
                for item in distinct {
                    *support.entry(item).or_insert(0) += 1;
                }
            }

            for (item, count) in support {
                if count < min_support {
                    continue;
                }
                let projected: Projection = projection
                    .iter()
                    .filter_map(|&(s, start)| {
                        sequences[s][start..]
                            .iter()
                            .position(|&e| e == item)
                            .map(|offset| (s, start + offset + 1))
                    })
                    .collect();

                let mut grown = pattern.clone();
                grown.push(item);
                trie.insert(&grown, count);
                worklist.push((grown, projected));
            }
        }

        trie
    }
}
