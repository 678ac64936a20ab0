//! ingress-logparse: the access-log grammar.
//!
//! [`LogParser`] turns one raw line into a [`LogRecord`](ingress_core::LogRecord)
//! or nothing; [`filter::admits`] decides whether that record is counted.

pub mod filter;
pub mod parser;

pub use filter::admits;
pub use parser::{LineOutcome, LogParser, LOG_LINE_PATTERN};
