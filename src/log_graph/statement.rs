use crate::catalog::{EventId, Location};
use crate::log_graph::rows::AnalyzerRow;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w*)\}").expect("placeholder pattern compiles"));

/// One static log call site
///
/// Statements created from mined patterns only know their event id; the
/// remaining fields stay empty until a union with a source graph fills them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogStatement {
    pub event_id: EventId,
    pub location: Option<Location>,
    pub package: Vec<String>,
    pub class_name: String,
    pub method_name: String,
    /// Uppercased severity tag (`INFO`, `WARN`, ...)
    pub level: String,
    /// Message format string with `{name}` placeholders
    pub template: String,
}

impl LogStatement {
    /// Statement with nothing but an id
    pub fn bare(event_id: EventId) -> Self {
        Self {
            event_id,
            location: None,
            package: Vec::new(),
            class_name: String::new(),
            method_name: String::new(),
            level: String::new(),
            template: String::new(),
        }
    }

    pub fn from_row(row: &AnalyzerRow) -> Self {
        let location = match (row.file_name(), row.line_number) {
            (Some(file_name), Some(line_number)) => Some(Location::new(file_name, line_number)),
            _ => None,
        };
        Self {
            event_id: row.event_id,
            location,
            package: row.package.clone(),
            class_name: row.class_name.clone(),
            method_name: row.method_name.clone(),
            level: row.level.clone(),
            template: row.template.clone(),
        }
    }

    /// True when only the id is known
    pub fn is_bare(&self) -> bool {
        self.location.is_none() && self.level.is_empty() && self.template.is_empty()
    }

    /// `(file_name, line_number)` of the call site
    pub fn loc(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Placeholder names in the template, in order of appearance
    ///
    /// ```
    /// use loggraph::log_graph::LogStatement;
    ///
    /// let mut stmt = LogStatement::bare(0);
    /// stmt.template = "connecting to {host} as {userName} ({})".to_string();
    /// assert_eq!(stmt.variables(), vec!["host", "userName", ""]);
    /// ```
    pub fn variables(&self) -> Vec<&str> {
        PLACEHOLDER
            .captures_iter(&self.template)
            .filter_map(|captures| captures.get(1).map(|m| m.as_str()))
            .collect()
    }
}
