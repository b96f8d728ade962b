use crate::error::Position;
use serde::{Deserialize, Serialize};

/// A single token from the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token (empty for punctuation)
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// Start position of the token
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// All token types in the zerotape format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// `$` followed by hex digits
    DollarHex,
    /// `0x` followed by hex digits
    Hex,
    /// One digit, a point and exactly two digits
    Decimal,
    /// Plain decimal integer
    Integer,
    /// The `nil` literal
    Nil,
    /// Identifier
    Name,

    // Punctuation
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `,`
    Comma,
    /// `-`
    Minus,
    /// `/`
    Slash,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `=`
    Equals,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Punctuation token for a byte, if it is one
    pub fn punctuation(c: u8) -> Option<TokenKind> {
        let kind = match c {
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'*' => TokenKind::Star,
            b'+' => TokenKind::Plus,
            b',' => TokenKind::Comma,
            b'-' => TokenKind::Minus,
            b'/' => TokenKind::Slash,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b'=' => TokenKind::Equals,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this token is one of the literal value forms
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::DollarHex
                | TokenKind::Hex
                | TokenKind::Decimal
                | TokenKind::Integer
                | TokenKind::Nil
        )
    }

    /// Human-readable name used in diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::DollarHex => "dollar-hex literal",
            TokenKind::Hex => "hex literal",
            TokenKind::Decimal => "decimal",
            TokenKind::Integer => "integer",
            TokenKind::Nil => "`nil`",
            TokenKind::Name => "identifier",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::Star => "`*`",
            TokenKind::Plus => "`+`",
            TokenKind::Comma => "`,`",
            TokenKind::Minus => "`-`",
            TokenKind::Slash => "`/`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Equals => "`=`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::Eof => "end of file",
        }
    }
}
