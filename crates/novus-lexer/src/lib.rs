//! Byte-stream lexer for the novus language (spec §4.1).
//!
//! Consumes a `&str` and hands out one [`Token`] per [`Lexer::next_token`]
//! call, tracking byte spans throughout. Whitespace is skipped; comments
//! become tokens. The lexer never panics on malformed input — invalid
//! characters, unterminated literals, and malformed numeric literals all
//! produce an `Error` token carrying a message and span, so a caller can
//! keep calling `next_token` and let the parser decide how to recover.

mod error;
mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{keyword, Operator, Token, TokenKind};
