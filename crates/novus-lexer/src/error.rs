//! Error-token constructors.
//!
//! Every lexical error still produces a [`Token`] carrying a message and a
//! span (spec §4.1: "all error tokens still carry a span so the parser can
//! continue") rather than aborting the scan. Messages mirror
//! `examples/original_source/src/lex/error.cpp`.

use novus_common::Span;

use crate::token::{Token, TokenKind};

fn error_token(message: String, span: Span) -> Token {
    Token::new(TokenKind::Error(message), span)
}

pub fn err_invalid_character(c: char, span: Span) -> Token {
    error_token(format!("Invalid character '{c}'."), span)
}

pub fn err_lit_int_too_big(span: Span) -> Token {
    error_token("Integer literal too big.".to_string(), span)
}

pub fn err_lit_int_invalid_char(span: Span) -> Token {
    error_token("Integer literal contains an invalid character.".to_string(), span)
}

pub fn err_lit_int_ends_with_separator(span: Span) -> Token {
    error_token("Integer literal ends with a separator character.".to_string(), span)
}

pub fn err_lit_int_doubled_separator(span: Span) -> Token {
    error_token("Integer literal contains a doubled separator character.".to_string(), span)
}

pub fn err_unterminated_string_literal(span: Span) -> Token {
    error_token("Unterminated string literal.".to_string(), span)
}

pub fn err_unterminated_char_literal(span: Span) -> Token {
    error_token("Unterminated character literal.".to_string(), span)
}

pub fn err_invalid_escape_sequence(span: Span) -> Token {
    error_token("Invalid escape sequence.".to_string(), span)
}
