//! Comparison of statically derived paths against mined patterns
//!
//! Three views, from strictest to loosest:
//!
//! 1. exact path-set overlap between a source graph and a pattern graph
//! 2. similarity-threshold overlap: source paths with some pattern path whose
//!    cyclic similarity is above the threshold
//! 3. beam coverage: source paths the trie matcher accepts within a
//!    divergence budget

use crate::catalog::EventId;
use crate::log_graph::{LogGraph, LogPath};
use crate::matching::{similarity, TrieMatcher};
use crate::trie::PatternTrie;
use serde::Serialize;
use std::collections::BTreeSet;

/// Exact path-set overlap of two graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PathOverlap {
    /// Paths present in both graphs
    pub matching_paths: usize,
    /// Size of the union of both path sets
    pub all_paths: usize,
}

impl PathOverlap {
    /// `matching_paths / all_paths`, 0 for two empty graphs
    pub fn jaccard(&self) -> f64 {
        if self.all_paths == 0 {
            return 0.0;
        }
        self.matching_paths as f64 / self.all_paths as f64
    }
}

/// Everything the `compare` command reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub source_statements: usize,
    pub source_paths: usize,
    pub sequences: usize,
    pub min_support: usize,
    pub patterns: usize,
    pub pattern_paths: usize,
    #[serde(flatten)]
    pub overlap: PathOverlap,
    pub similarity_threshold: f64,
    pub similar_paths: usize,
    pub max_divergence: usize,
    pub beam_matched_paths: usize,
}

/// Exact overlap of the path sets of `a` and `b`
pub fn path_overlap(a: &LogGraph, b: &LogGraph) -> PathOverlap {
    let a: BTreeSet<LogPath> = a.paths().into_iter().collect();
    let b: BTreeSet<LogPath> = b.paths().into_iter().collect();
    PathOverlap {
        matching_paths: a.intersection(&b).count(),
        all_paths: a.union(&b).count(),
    }
}

/// Number of `source_paths` with some pattern path scoring above `threshold`
pub fn similar_path_count(
    source_paths: &[LogPath],
    pattern_paths: &[LogPath],
    threshold: f64,
) -> usize {
    source_paths
        .iter()
        .filter(|source| {
            pattern_paths
                .iter()
                .any(|pattern| similarity(source, pattern) > threshold)
        })
        .count()
}

/// Number of `source_paths` the trie matcher covers within `max_divergence`
pub fn beam_matched_count(
    source_paths: &[LogPath],
    trie: &PatternTrie<EventId>,
    max_divergence: usize,
) -> usize {
    let matcher = TrieMatcher::new(trie, max_divergence);
    source_paths
        .iter()
        .filter(|path| matcher.is_covered(path))
        .count()
}
