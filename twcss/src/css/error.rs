//! Syntax errors raised while lexing or parsing CSS

use thiserror::Error;

/// A malformed-input error with a 1-based source position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} on line {line} and column {column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// Build an error positioned at byte `offset` of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Convert a byte offset into a 1-based line and column (columns count chars).
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
