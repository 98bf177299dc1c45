//! Log line recognition
//!
//! Turns one raw log line into `(timestamp, event_id)`. Recognition is a fixed
//! structural pattern: a leading timestamp, then somewhere a bracketed locator
//! `(File.java:method(123))`, then free text. The message text is ignored.
//!
//! The parser is best-effort. Noise lines, stack trace continuations and
//! foreign formats are reported as a [`LineSkip`] and the caller moves on.
//!
//! ```text
//! 2015-10-18 18:01:47,978 INFO [main] org.apache.App: started (App.java:main(42)) ok
//! └──────── timestamp ──┘                                      └file──┘      └line
//! ```

use crate::catalog::{EventCatalog, EventId, Location};
use chrono::NaiveDateTime;
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Default pattern for log4j-style Java logs with a `(File.java:method(line))` locator
pub const JAVA_LOCATOR_PATTERN: &str = r"^(?P<timestamp>[\d -:,]+) .*? \((?P<file_name>\w+\.java):.+?\((?P<line_number>\d+)\)\)(?:\s.*)?$";

/// Timestamp layout after the millisecond comma has been normalized to a dot
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

static DEFAULT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(JAVA_LOCATOR_PATTERN).expect("built-in log pattern compiles"));

/// Why a line produced no event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineSkip {
    #[error("line does not match the log format")]
    NoMatch,

    #[error("malformed timestamp: {0}")]
    BadTimestamp(String),

    #[error("malformed line number: {0}")]
    BadLineNumber(String),

    #[error("location {0} is not a known log statement")]
    UnknownLocation(Location),

    #[error("no event id left to assign to {0}")]
    CatalogFull(Location),
}

/// Regex-driven, stateless log line parser
#[derive(Debug, Clone)]
pub struct LogLineParser {
    pattern: Regex,
}

impl Default for LogLineParser {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl LogLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser for a custom log layout
    ///
    /// The pattern must define the named groups `timestamp`, `file_name`
    /// and `line_number`.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(pattern)?;
        for group in ["timestamp", "file_name", "line_number"] {
            if !pattern.capture_names().flatten().any(|name| name == group) {
                return Err(regex::Error::Syntax(format!(
                    "log pattern is missing the named group `{}`",
                    group
                )));
            }
        }
        Ok(Self { pattern })
    }

    /// Recognize the structural fields of a line without resolving an event id
    pub fn recognize(&self, line: &str) -> Result<(NaiveDateTime, Location), LineSkip> {
        let line = line.trim_end_matches(['\r', '\n']);
        let captures = self.pattern.captures(line).ok_or(LineSkip::NoMatch)?;

        let raw_timestamp = captures["timestamp"].trim();
        let timestamp = parse_timestamp(raw_timestamp)
            .ok_or_else(|| LineSkip::BadTimestamp(raw_timestamp.to_string()))?;

        let raw_line = &captures["line_number"];
        let line_number = raw_line
            .parse::<u32>()
            .map_err(|_| LineSkip::BadLineNumber(raw_line.to_string()))?;

        Ok((timestamp, Location::new(&captures["file_name"], line_number)))
    }

    /// Parse a line against a fixed catalog; unknown locations are skipped
    pub fn parse(
        &self,
        line: &str,
        catalog: &EventCatalog,
    ) -> Result<(NaiveDateTime, EventId), LineSkip> {
        let (timestamp, location) = self.recognize(line)?;
        match catalog.get(&location) {
            Some(id) => Ok((timestamp, id)),
            None => Err(LineSkip::UnknownLocation(location)),
        }
    }

    /// Parse a line, allocating a fresh id for locations seen for the first time
    pub fn parse_allocating(
        &self,
        line: &str,
        catalog: &mut EventCatalog,
    ) -> Result<(NaiveDateTime, EventId), LineSkip> {
        let (timestamp, location) = self.recognize(line)?;
        match catalog.id_of(location.clone()) {
            Some(id) => Ok((timestamp, id)),
            None => Err(LineSkip::CatalogFull(location)),
        }
    }

    /// Parse every recognizable line of a reader against a fixed catalog
    ///
    /// Lines that fail are logged at debug level and dropped. Bytes that are
    /// not valid UTF-8 are replaced, so a garbled line costs only itself. An
    /// I/O error ends the stream at that point.
    pub fn parse_reader<R: BufRead>(
        &self,
        mut reader: R,
        catalog: &EventCatalog,
    ) -> Vec<(NaiveDateTime, EventId)> {
        let mut events = Vec::new();
        let mut buf = Vec::new();
        let mut line_number = 0;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => line_number += 1,
                Err(e) => {
                    debug!("stopped reading log at line {}: {}", line_number + 1, e);
                    break;
                }
            }
            let line = String::from_utf8_lossy(&buf);
            match self.parse(&line, catalog) {
                Ok(event) => events.push(event),
                Err(LineSkip::NoMatch) => {}
                Err(skip) => debug!("skipping log line {}: {}", line_number, skip),
            }
        }
        events
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&raw.replace(',', "."), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const HADOOP_LINE: &str = "2015-10-18 18:01:47,978 INFO [main] org.apache.hadoop.mapreduce.v2.app.MRAppMaster: Created MRAppMaster (MRAppMaster.java:main(1407)) for application";

    #[test]
    fn test_recognize_hadoop_line() {
        let parser = LogLineParser::new();
        let (timestamp, location) = parser.recognize(HADOOP_LINE).unwrap();

        assert_eq!(location, Location::new("MRAppMaster.java", 1407));
        assert_eq!(timestamp.second(), 47);
        assert_eq!(timestamp.nanosecond(), 978_000_000);
    }

    #[test]
    fn test_recognize_without_trailing_text() {
        let parser = LogLineParser::new();
        let line = "2015-10-18 18:01:47,978 INFO [main] x.Y: hello (Y.java:run(12))";
        let (_, location) = parser.recognize(line).unwrap();
        assert_eq!(location.line_number, 12);
    }

    #[test]
    fn test_noise_line_is_no_match() {
        let parser = LogLineParser::new();
        assert_eq!(
            parser.recognize("\tat org.apache.Foo.bar(Foo.java:12)"),
            Err(LineSkip::NoMatch)
        );
        assert_eq!(parser.recognize(""), Err(LineSkip::NoMatch));
    }

    #[test]
    fn test_bad_timestamp_is_skipped() {
        let parser = LogLineParser::new();
        let line = "2015-13-45 99:01:47,978 INFO x: msg (A.java:m(1)) tail";
        assert!(matches!(
            parser.recognize(line),
            Err(LineSkip::BadTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_unknown_location() {
        let parser = LogLineParser::new();
        let catalog = EventCatalog::new();
        assert_eq!(
            parser.parse(HADOOP_LINE, &catalog),
            Err(LineSkip::UnknownLocation(Location::new(
                "MRAppMaster.java",
                1407
            )))
        );
    }

    #[test]
    fn test_parse_known_location() {
        let parser = LogLineParser::new();
        let catalog =
            EventCatalog::from_assigned([(Location::new("MRAppMaster.java", 1407), 3)]);
        let (_, id) = parser.parse(HADOOP_LINE, &catalog).unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn test_parse_allocating() {
        let parser = LogLineParser::new();
        let mut catalog = EventCatalog::new();
        let (_, first) = parser.parse_allocating(HADOOP_LINE, &mut catalog).unwrap();
        let (_, again) = parser.parse_allocating(HADOOP_LINE, &mut catalog).unwrap();
        assert_eq!(first, 0);
        assert_eq!(again, 0);
    }

    #[test]
    fn test_parse_reader_drops_noise() {
        let parser = LogLineParser::new();
        let catalog = EventCatalog::from_assigned([(Location::new("A.java", 5), 0)]);
        let log = "\
2020-01-01 00:00:00,001 INFO t: one (A.java:m(5)) x
java.lang.RuntimeException: boom
\tat A.m(A.java:5)
2020-01-01 00:00:00,002 INFO t: two (B.java:m(9)) x
2020-01-01 00:00:00,003 INFO t: three (A.java:m(5)) x
";
        let events = parser.parse_reader(log.as_bytes(), &catalog);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|(_, id)| *id == 0));
    }

    #[test]
    fn test_parse_reader_survives_invalid_utf8() {
        let parser = LogLineParser::new();
        let catalog = EventCatalog::from_assigned([(Location::new("A.java", 5), 0)]);
        let mut log = Vec::new();
        log.extend_from_slice(b"2020-01-01 00:00:00,001 INFO t: one (A.java:m(5)) x\n");
        log.extend_from_slice(b"binary noise \xff\xfe\n");
        log.extend_from_slice(b"2020-01-01 00:00:00,002 INFO t: caf\xe9 (A.java:m(5)) x\n");
        log.extend_from_slice(b"2020-01-01 00:00:00,003 INFO t: three (A.java:m(5)) x");

        let events = parser.parse_reader(log.as_slice(), &catalog);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_parse_allocating_when_catalog_is_full() {
        let parser = LogLineParser::new();
        let mut catalog =
            EventCatalog::from_assigned([(Location::new("Other.java", 1), EventId::MAX)]);
        assert_eq!(
            parser.parse_allocating(HADOOP_LINE, &mut catalog),
            Err(LineSkip::CatalogFull(Location::new("MRAppMaster.java", 1407)))
        );
    }

    #[test]
    fn test_with_pattern_requires_groups() {
        assert!(LogLineParser::with_pattern(r"^(?P<timestamp>\S+)").is_err());
        let parser = LogLineParser::with_pattern(
            r"^(?P<timestamp>\S+ \S+) \[(?P<file_name>\w+\.java):(?P<line_number>\d+)\]",
        )
        .unwrap();
        let (_, location) = parser
            .recognize("2020-01-01 00:00:00,5 [Main.java:77] hi")
            .unwrap();
        assert_eq!(location, Location::new("Main.java", 77));
    }
}
