//! Analyzer row protocol
//!
//! The static analyzer writes one quote-all CSV record per log statement.
//! `output` records carry nine columns:
//!
//! ```text
//! "idom","event_id","file_path","package","class","method","line","level","template"
//! ```
//!
//! `gather` records carry four: `"idom","event_id","level","template"`.
//! A negative or empty `idom` means the statement has no dominator.
//!
//! Templates are free text, so fields may contain commas, doubled quotes and
//! newlines; [`RecordReader`] handles all three.

use crate::catalog::EventId;
use std::io::{self, BufRead};
use std::path::Path;

/// Analyzer subcommand, which also fixes the record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerCommand {
    Output,
    Gather,
}

impl AnalyzerCommand {
    pub fn keyword(&self) -> &'static str {
        match self {
            AnalyzerCommand::Output => "output",
            AnalyzerCommand::Gather => "gather",
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            AnalyzerCommand::Output => 9,
            AnalyzerCommand::Gather => 4,
        }
    }
}

/// One log statement as reported by the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerRow {
    pub immediate_dominator: Option<EventId>,
    pub event_id: EventId,
    pub file_path: Option<String>,
    pub package: Vec<String>,
    pub class_name: String,
    pub method_name: String,
    pub line_number: Option<u32>,
    pub level: String,
    pub template: String,
}

impl AnalyzerRow {
    /// Decode one record in the layout of `command`
    pub fn from_record(command: AnalyzerCommand, fields: &[String]) -> Result<Self, String> {
        if fields.len() != command.columns() {
            return Err(format!(
                "expected {} columns for `{}`, got {}",
                command.columns(),
                command.keyword(),
                fields.len()
            ));
        }

        match command {
            AnalyzerCommand::Output => Ok(Self {
                immediate_dominator: parse_dominator(&fields[0])?,
                event_id: parse_event_id(&fields[1])?,
                file_path: Some(fields[2].clone()),
                package: fields[3]
                    .split('.')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect(),
                class_name: fields[4].clone(),
                method_name: fields[5].clone(),
                line_number: Some(
                    fields[6]
                        .trim()
                        .parse()
                        .map_err(|_| format!("invalid line number: {:?}", fields[6]))?,
                ),
                level: fields[7].to_uppercase(),
                template: fields[8].clone(),
            }),
            AnalyzerCommand::Gather => Ok(Self {
                immediate_dominator: parse_dominator(&fields[0])?,
                event_id: parse_event_id(&fields[1])?,
                file_path: None,
                package: Vec::new(),
                class_name: String::new(),
                method_name: String::new(),
                line_number: None,
                level: fields[2].to_uppercase(),
                template: fields[3].clone(),
            }),
        }
    }

    /// Bare file name of `file_path`
    pub fn file_name(&self) -> Option<String> {
        self.file_path.as_deref().map(|path| {
            Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string())
        })
    }
}

fn parse_dominator(field: &str) -> Result<Option<EventId>, String> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    let id: i64 = field
        .parse()
        .map_err(|_| format!("invalid dominator id: {:?}", field))?;
    if id < 0 {
        return Ok(None);
    }
    EventId::try_from(id)
        .map(Some)
        .map_err(|_| format!("dominator id out of range: {}", id))
}

fn parse_event_id(field: &str) -> Result<EventId, String> {
    field
        .trim()
        .parse()
        .map_err(|_| format!("invalid event id: {:?}", field))
}

/// Streaming reader of CSV records
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    line_number: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_number: 0,
        }
    }

    /// Physical line on which the most recently returned record ended
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next record, or `None` at end of input
    ///
    /// A quoted field may span physical lines; an unterminated quote at EOF
    /// is an `InvalidData` error.
    pub fn next_record(&mut self) -> io::Result<Option<Vec<String>>> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut started = false;
        let mut line = String::new();

        loop {
            line.clear();
            if self.inner.read_line(&mut line)? == 0 {
                if in_quotes {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unterminated quoted field at line {}", self.line_number),
                    ));
                }
                if !started {
                    return Ok(None);
                }
                fields.push(field);
                return Ok(Some(fields));
            }
            self.line_number += 1;

            if !in_quotes && !started && line.trim().is_empty() {
                continue;
            }
            started = true;

            let mut chars = line.chars().peekable();
            while let Some(c) = chars.next() {
                match (in_quotes, c) {
                    (true, '"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    (true, '"') => in_quotes = false,
                    (true, c) => field.push(c),
                    (false, '"') => in_quotes = true,
                    (false, ',') => fields.push(std::mem::take(&mut field)),
                    (false, '\n') => {}
                    (false, '\r') if chars.peek() == Some(&'\n') => {}
                    (false, c) => field.push(c),
                }
            }

            if !in_quotes {
                fields.push(field);
                return Ok(Some(fields));
            }
        }
    }
}

/// Encode fields as one quote-all CSV record (no trailing newline)
pub fn to_record(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Vec<Vec<String>> {
        let mut reader = RecordReader::new(input.as_bytes());
        let mut records = Vec::new();
        while let Some(record) = reader.next_record().unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn test_quote_all_records() {
        let records = read_all("\"1\",\"2\",\"a, b\"\n\"-1\",\"3\",\"say \"\"hi\"\"\"\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], vec!["1", "2", "a, b"]);
        assert_eq!(records[1][2], "say \"hi\"");
    }

    #[test]
    fn test_multiline_field() {
        let records = read_all("\"1\",\"line one\nline two\"\n\"2\",\"x\"\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][1], "line one\nline two");
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let records = read_all("\n\"1\",\"2\"\r\n\n");
        assert_eq!(records, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let mut reader = RecordReader::new("\"1\",\"oops\n".as_bytes());
        assert!(reader.next_record().is_err());
    }

    #[test]
    fn test_output_row() {
        let fields: Vec<String> = [
            "-1",
            "4",
            "src/main/java/org/x/Foo.java",
            "org.x",
            "org.x.Foo",
            "run",
            "42",
            "info",
            "started {jobId}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let row = AnalyzerRow::from_record(AnalyzerCommand::Output, &fields).unwrap();
        assert_eq!(row.immediate_dominator, None);
        assert_eq!(row.event_id, 4);
        assert_eq!(row.package, vec!["org", "x"]);
        assert_eq!(row.level, "INFO");
        assert_eq!(row.line_number, Some(42));
        assert_eq!(row.file_name().as_deref(), Some("Foo.java"));
    }

    #[test]
    fn test_gather_row() {
        let fields: Vec<String> = ["", "7", "Warn", "retry {host}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row = AnalyzerRow::from_record(AnalyzerCommand::Gather, &fields).unwrap();
        assert_eq!(row.immediate_dominator, None);
        assert_eq!(row.level, "WARN");
        assert_eq!(row.file_name(), None);
    }

    #[test]
    fn test_wrong_column_count() {
        let fields = vec!["1".to_string(), "2".to_string()];
        assert!(AnalyzerRow::from_record(AnalyzerCommand::Output, &fields).is_err());
    }

    #[test]
    fn test_bad_ids() {
        let fields: Vec<String> = ["x", "7", "INFO", "t"].iter().map(|s| s.to_string()).collect();
        assert!(AnalyzerRow::from_record(AnalyzerCommand::Gather, &fields).is_err());
    }

    #[test]
    fn test_to_record_round_trips_quotes() {
        let fields = vec!["a\"b".to_string(), "c,d".to_string()];
        let encoded = to_record(&fields);
        assert_eq!(encoded, "\"a\"\"b\",\"c,d\"");
        assert_eq!(read_all(&encoded), vec![fields]);
    }
}
