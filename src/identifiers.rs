//! Identifier heuristics over log statement variables
//!
//! A statement "carries an identifier" when one of its template variables
//! looks like it names an entity (`requestId`, `filePath`, `hostName`, ...).
//! A dominator carrying an identifier is an injection opportunity for every
//! statement it dominates.

use crate::log_graph::{LogGraph, LogStatement};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z][a-z]*").expect("word pattern compiles"));

/// Word suffixes that mark a variable as an identifier
pub const IDENTIFIER_SUFFIXES: [&str; 8] =
    ["id", "path", "address", "host", "ip", "name", "url", "uri"];

/// True if any camel-case word of `variable` ends with an identifier suffix
///
/// ```
/// use loggraph::identifiers::is_identifier;
///
/// assert!(is_identifier("requestId"));
/// assert!(is_identifier("remote_host"));
/// assert!(!is_identifier("count"));
/// ```
pub fn is_identifier(variable: &str) -> bool {
    WORD.find_iter(variable).any(|word| {
        let word = word.as_str().to_lowercase();
        IDENTIFIER_SUFFIXES
            .iter()
            .any(|suffix| word.ends_with(suffix))
    })
}

/// True if `statement` has at least one identifier variable
pub fn has_identifier(statement: &LogStatement) -> bool {
    statement.variables().into_iter().any(is_identifier)
}

/// Per-project statement counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementStats {
    pub stmt_count: usize,
    pub stmt_with_id_count: usize,
    /// Summed over statements: dominators carrying an identifier
    pub stmt_with_injection_count: usize,
}

impl StatementStats {
    pub fn from_graph(graph: &LogGraph) -> Self {
        let mut stats = Self::default();
        for statement in graph.iter() {
            stats.stmt_count += 1;
            if has_identifier(statement) {
                stats.stmt_with_id_count += 1;
            }
            stats.stmt_with_injection_count += graph
                .dominators(statement.event_id)
                .into_iter()
                .filter(|dominator| has_identifier(dominator))
                .count();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_graph::{AnalyzerCommand, AnalyzerRow};

    fn gather_row(idom: &str, id: &str, template: &str) -> AnalyzerRow {
        let fields: Vec<String> = [idom, id, "info", template]
            .iter()
            .map(|s| s.to_string())
            .collect();
        AnalyzerRow::from_record(AnalyzerCommand::Gather, &fields).unwrap()
    }

    #[test]
    fn test_identifier_suffixes() {
        for name in ["id", "filePath", "ipAddress", "hostname", "baseUri"] {
            assert!(is_identifier(name), "{name}");
        }
        for name in ["count", "size", "", "_", "elapsedMs"] {
            assert!(!is_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_words_split_on_case_and_digits() {
        // "idx" is a word of its own, and it does not end with "id"
        assert!(!is_identifier("idx"));
        assert!(is_identifier("node2Id"));
    }

    #[test]
    fn test_stats_count_injection_per_dominator() {
        let rows = vec![
            gather_row("", "0", "request {requestId} accepted"),
            gather_row("0", "1", "validated {count} fields"),
            gather_row("1", "2", "stored {bytes} bytes"),
            gather_row("", "3", "idle"),
        ];
        let graph = LogGraph::from_rows(&rows).unwrap();
        let stats = StatementStats::from_graph(&graph);

        assert_eq!(stats.stmt_count, 4);
        assert_eq!(stats.stmt_with_id_count, 1);
        // statements 1 and 2 both have statement 0 in their dominator chain
        assert_eq!(stats.stmt_with_injection_count, 2);
    }

    #[test]
    fn test_stats_of_empty_graph() {
        assert_eq!(
            StatementStats::from_graph(&LogGraph::new()),
            StatementStats::default()
        );
    }
}
