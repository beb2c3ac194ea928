//! Token definitions for the Clot lexer

use logos::Logos;
use std::fmt;

/// Token kinds recognized by the line lexer.
///
/// Identifiers may contain `.` as interior characters, so `user.age` is a
/// single `Identifier` token. Keywords win over the identifier rule only on
/// exact matches; `printx` and `print.log` are plain identifiers.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+|//[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("print")]
    Print,
    #[token("println")]
    Println,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("endif")]
    EndIf,
    #[token("long")]
    Long,
    #[token("byte")]
    Byte,
    #[token("func")]
    Func,
    #[token("endfunc")]
    EndFunc,
    #[token("import")]
    Import,
    #[token("return")]
    Return,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("endtry")]
    EndTry,
    #[token("while")]
    While,
    #[token("endwhile")]
    EndWhile,

    // Literals
    #[token("true")]
    #[token("false")]
    Boolean,

    #[regex(r"[0-9]+\.?[0-9]*|\.[0-9]+")]
    Number,

    /// A terminated string literal; the token lexeme holds the unescaped text.
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    /// A string literal that never closed before the end of the line. The
    /// lexer downgrades this to `Unknown` carrying the rest of the line.
    #[regex(r#""([^"\\]|\\.)*\\?"#)]
    UnterminatedStr,

    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*", priority = 1)]
    Identifier,

    // Operators
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,

    // Punctuation
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("&")]
    Ampersand,

    /// Anything the lexer could not classify
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Print => "print",
            TokenKind::Println => "println",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::EndIf => "endif",
            TokenKind::Long => "long",
            TokenKind::Byte => "byte",
            TokenKind::Func => "func",
            TokenKind::EndFunc => "endfunc",
            TokenKind::Import => "import",
            TokenKind::Return => "return",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::EndTry => "endtry",
            TokenKind::While => "while",
            TokenKind::EndWhile => "endwhile",
            TokenKind::Boolean => "boolean",
            TokenKind::Number => "number",
            TokenKind::Str | TokenKind::UnterminatedStr => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Assign => "=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Not => "!",
            TokenKind::EqualEqual => "==",
            TokenKind::BangEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Ampersand => "&",
            TokenKind::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// A token with its source lexeme and 1-based column within its line.
///
/// For `Str` tokens the lexeme is the unescaped string content; for every
/// other kind it is the raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, column: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            column,
        }
    }
}
