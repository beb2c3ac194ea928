//! Frontend for the Clot language
//!
//! This module provides:
//! - Line lexer (tokenization)
//! - Parser (AST construction)
//! - AST definitions
//! - Source loading

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;

pub use ast::Program;
pub use lexer::tokenize_line;
pub use parser::Parser;
pub use token::{Token, TokenKind};

use crate::diagnostics::Diagnostic;
use std::path::Path;

/// Parse a source file into a program
pub fn parse_file(path: &Path) -> Result<Program, Diagnostic> {
    let lines = source::load_lines(path).map_err(|e| {
        Diagnostic::new(1, 1, format!("could not open file: {}: {}", path.display(), e))
    })?;
    Parser::new(lines).parse()
}

/// Parse in-memory source text into a program
pub fn parse_source(source_text: &str) -> Result<Program, Diagnostic> {
    Parser::new(source::split_lines(source_text)).parse()
}
