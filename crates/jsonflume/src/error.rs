//! Error types for the parser and the path-pattern compiler.
use thiserror::Error;

/// A fatal parse failure, with the position of the offending input.
///
/// Once a `ParseError` has been returned, the parser refuses further writes
/// until [`crate::StreamParser::resume`] clears the recorded error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub(crate) message: String,
    /// 1-based line of the failure.
    pub line: usize,
    /// Column of the failure, counted in characters from the start of the
    /// line.
    pub column: usize,
    /// Character offset of the failure from the start of the input.
    pub position: usize,
}

impl ParseError {
    /// The human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A path pattern that could not be tokenized.
///
/// Raised synchronously by [`crate::JsonPath::compile`]; pattern problems are
/// never deferred to match time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path pattern {pattern:?} could not be tokenised at offset {offset}")]
pub struct PatternError {
    /// The full pattern that failed to compile.
    pub pattern: String,
    /// Byte offset of the first unrecognizable token.
    pub offset: usize,
}
