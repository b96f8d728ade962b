//! Lexical analysis for zerotape
//!
//! Converts source text into a stream of tokens. Literal tokens are found by
//! trying each recogniser in turn (dollar-hex, hex, decimal, integer, `nil`,
//! name); anything else must be a single punctuation byte.

mod scanner;
mod token;

pub use scanner::{Recognised, Scanner};
pub use token::{Token, TokenKind};
