//! Access-log line parser.
//!
//! Matches the combined format written by the ingress controllers:
//!
//! ```text
//! remote - - [time] "method path protocol" status bytes_sent "url" "user_agent" "-"
//! ```
//!
//! Matching is anchored at the start of the line only, so anything after
//! the final `"-"` is ignored. [`LogParser::parse_line`] tells a line that
//! is not valid UTF-8 apart from one that does not match; neither is an
//! error.

use ingress_core::LogRecord;
use regex::{Captures, Regex};

/// The fixed line grammar, one named group per [`LogRecord`] field.
pub const LOG_LINE_PATTERN: &str = r#"^(?P<remote>[^ ]*) - - \[(?P<time>[^\]]*)\] "(?P<method>\S+)(?: +(?P<path>[^"]*) +\S*)?" (?P<status>\d+) (?P<bytes_sent>\d+) "(?P<url>[^ ]*)" "(?P<user_agent>[^"]*)" "-""#;

/// What one raw line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(LogRecord),
    /// Valid UTF-8 that does not fit the grammar.
    Unmatched,
    /// Not valid UTF-8.
    Undecodable,
}

impl LineOutcome {
    pub fn into_record(self) -> Option<LogRecord> {
        match self {
            LineOutcome::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Compiled access-log grammar. Build once, share across pods.
#[derive(Debug, Clone)]
pub struct LogParser {
    re: Regex,
}

impl LogParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            re: Regex::new(LOG_LINE_PATTERN)?,
        })
    }

    /// Classify a raw line as delivered by a log source.
    pub fn parse_line(&self, line: &[u8]) -> LineOutcome {
        let Ok(text) = std::str::from_utf8(line) else {
            return LineOutcome::Undecodable;
        };
        match self.parse(text) {
            Some(record) => LineOutcome::Record(record),
            None => LineOutcome::Unmatched,
        }
    }

    /// Like [`parse_line`](Self::parse_line), folding both misses into `None`.
    pub fn parse_bytes(&self, line: &[u8]) -> Option<LogRecord> {
        self.parse_line(line).into_record()
    }

    pub fn parse(&self, line: &str) -> Option<LogRecord> {
        let caps = self.re.captures(line)?;
        Some(LogRecord {
            remote: group(&caps, "remote"),
            time: group(&caps, "time"),
            method: group(&caps, "method"),
            path: group(&caps, "path"),
            status: group(&caps, "status"),
            bytes_sent: group(&caps, "bytes_sent"),
            url: group(&caps, "url"),
            user_agent: group(&caps, "user_agent"),
        })
    }
}

fn group(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
