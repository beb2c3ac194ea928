//! Line-oriented lexer for Clot source code
//!
//! The lexer is stateless across lines: each call tokenizes exactly one line
//! and reports 1-based columns relative to that line. It never fails; input
//! it cannot classify becomes an `Unknown` token and the parser reports the
//! precise error.

use logos::Logos;

use crate::parser::token::{Token, TokenKind};

/// Tokenize a single source line.
///
/// An unterminated string literal produces one `Unknown` token whose lexeme
/// is the remainder of the line starting at the opening quote.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(line);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let column = span.start + 1;

        match result {
            Ok(TokenKind::Str) => {
                let slice = lexer.slice();
                let content = &slice[1..slice.len() - 1];
                tokens.push(Token::new(TokenKind::Str, unescape(content), column));
            }
            Ok(TokenKind::UnterminatedStr) => {
                tokens.push(Token::new(TokenKind::Unknown, &line[span.start..], column));
                break;
            }
            Ok(kind) => tokens.push(Token::new(kind, lexer.slice(), column)),
            Err(()) => tokens.push(Token::new(TokenKind::Unknown, lexer.slice(), column)),
        }
    }

    tokens
}

/// Decode the two recognized escapes, `\\` and `\"`. Any other backslash
/// sequence is preserved verbatim.
fn unescape(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut chars = content.chars();

    while let Some(character) = chars.next() {
        if character != '\\' {
            text.push(character);
            continue;
        }

        match chars.next() {
            Some('\\') => text.push('\\'),
            Some('"') => text.push('"'),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }

    text
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
