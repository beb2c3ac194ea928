//! Source file loading
//!
//! The grammar is line-oriented, so sources are handed to the parser as a
//! sequence of lines with a stable 1:1 mapping to the file — diagnostics
//! index directly into this sequence.

use std::io;
use std::path::Path;

/// Read a source file into its lines. Line terminators (`\n` and `\r\n`)
/// are stripped.
pub fn load_lines(path: &Path) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(split_lines(&content))
}

/// Split already-loaded source text into lines
pub fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}
