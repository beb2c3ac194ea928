//! Diagnostic reporting for the Clot frontend
//!
//! Parse diagnostics carry a 1-based line and column into the original
//! source and a canonical message. Machine-readable output is available
//! through serde.

use serde::Serialize;
use std::fmt;

/// A diagnostic produced while parsing a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source line (1-indexed)
    pub line: usize,

    /// Source column (1-indexed, first character of the offending lexeme)
    pub column: usize,

    /// Canonical message
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}
