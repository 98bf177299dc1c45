// Sequence-to-pattern matching primitives
//
// Three ways of relating observed (or statically derived) event sequences to
// mined patterns:
//
// - cyclic edit distance / similarity: phase-insensitive comparison of two
//   finite sequences, so a retry loop entered at a different point still
//   compares as the same pattern
// - TrieMatcher: bounded-divergence beam search of a sequence against a trie
// - TrieSegmenter: greedy partition of a stream into trie-recognized runs
//
// All three are pure, synchronous and iterative (worklists, no recursion).

mod beam;
mod segment;
mod similarity;

pub use beam::TrieMatcher;
pub use segment::TrieSegmenter;
pub use similarity::{cyclic_edit_distance, edit_distance, similarity};
