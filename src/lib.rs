//! loggraph - static log graphs versus runtime log patterns
//!
//! This library builds a graph of log statements from a Java source tree
//! (via an external static analyzer), mines frequent event sequences from
//! runtime logs of the same system, and compares the two: exact path
//! overlap, cyclic-similarity overlap and bounded beam matching against the
//! pattern trie. A greedy segmenter splits raw event streams into pattern
//! runs.

pub mod batch;
pub mod catalog;
pub mod cli;
pub mod compare;
pub mod config;
pub mod identifiers;
pub mod log_graph;
pub mod log_parser;
pub mod matching;
pub mod mining;
pub mod pipeline;
pub mod report;
pub mod trie;
pub mod windowing;
