use crate::token::{Operator, TokenKind};
use crate::Lexer;

fn kinds(src: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(src);
    let mut out = Vec::new();
    loop {
        let tok = lexer.next_token();
        if tok.is_eof() {
            break;
        }
        out.push(tok.kind);
    }
    out
}

#[test]
fn lexes_keywords_and_identifiers() {
    assert_eq!(
        kinds("fun act myName"),
        vec![
            TokenKind::Fun,
            TokenKind::Act,
            TokenKind::Ident("myName".to_string()),
        ]
    );
}

#[test]
fn eof_repeats_after_exhaustion() {
    let mut lexer = Lexer::new("x");
    assert_eq!(lexer.next_token().kind, TokenKind::Ident("x".to_string()));
    assert!(lexer.next_token().is_eof());
    assert!(lexer.next_token().is_eof());
}

#[test]
fn lexes_int_and_long_literals_with_separators() {
    assert_eq!(kinds("1_000"), vec![TokenKind::LitInt(1000)]);
    assert_eq!(kinds("42L"), vec![TokenKind::LitLong(42)]);
}

#[test]
fn trailing_separator_is_an_error() {
    let mut lexer = Lexer::new("1_");
    let tok = lexer.next_token();
    assert!(tok.is_error());
}

#[test]
fn doubled_separator_is_an_error() {
    let mut lexer = Lexer::new("1__2");
    let tok = lexer.next_token();
    assert!(tok.is_error());
}

#[test]
fn lexes_float_literal_with_exponent() {
    assert_eq!(kinds("1.5e2"), vec![TokenKind::LitFloat(150.0)]);
}

#[test]
fn lexes_string_with_escapes() {
    assert_eq!(
        kinds(r#""a\nb""#),
        vec![TokenKind::LitString("a\nb".to_string())]
    );
}

#[test]
fn unterminated_string_is_an_error() {
    let mut lexer = Lexer::new("\"abc");
    assert!(lexer.next_token().is_error());
}

#[test]
fn lexes_char_literal() {
    assert_eq!(kinds("'x'"), vec![TokenKind::LitChar('x')]);
}

#[test]
fn line_comment_is_a_token_not_trivia() {
    assert_eq!(
        kinds("// hello\nfun"),
        vec![TokenKind::LineComment(" hello".to_string()), TokenKind::Fun]
    );
}

#[test]
fn lexes_two_char_operators_before_one_char() {
    assert_eq!(
        kinds("<= < >= > == != && || -> ::"),
        vec![
            TokenKind::Op(Operator::LeEq),
            TokenKind::Op(Operator::Le),
            TokenKind::Op(Operator::GtEq),
            TokenKind::Op(Operator::Gt),
            TokenKind::Op(Operator::EqEq),
            TokenKind::Op(Operator::BangEq),
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::Arrow,
            TokenKind::Op(Operator::ColonColon),
        ]
    );
}

#[test]
fn invalid_character_is_an_error_token() {
    let mut lexer = Lexer::new("@");
    assert!(lexer.next_token().is_error());
}

#[test]
fn operator_func_names_match_fixed_table() {
    assert_eq!(Operator::Plus.func_name(), "__op_plus");
    assert_eq!(Operator::SquareSquare.func_name(), "__op_squaresquare");
}
