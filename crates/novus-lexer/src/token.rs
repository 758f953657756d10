//! Token kinds produced by the [`crate::Lexer`].

use novus_common::Span;

/// Operators with a fixed precedence/overload identity (spec §4.2, §4.4).
/// Mirrors the source language's `prog::Operator` enum one-for-one; the
/// short-circuit (`&&`, `||`) and ternary (`?` `:`) tokens are deliberately
/// *not* represented here because they are not overloadable operators —
/// they lower straight to `Switch` rather than a named function call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Star,
    Slash,
    Rem,
    Amp,
    Pipe,
    ShiftL,
    ShiftR,
    Hat,
    Tilde,
    EqEq,
    Bang,
    BangEq,
    Le,
    LeEq,
    Gt,
    GtEq,
    ColonColon,
    SquareSquare,
    ParenParen,
    QMarkQMark,
}

impl Operator {
    /// The fixed `__op_*` name this operator lowers to as a call (spec §4.4).
    pub fn func_name(self) -> &'static str {
        match self {
            Operator::Plus => "__op_plus",
            Operator::PlusPlus => "__op_plusplus",
            Operator::Minus => "__op_minus",
            Operator::MinusMinus => "__op_minusminus",
            Operator::Star => "__op_star",
            Operator::Slash => "__op_slash",
            Operator::Rem => "__op_rem",
            Operator::Amp => "__op_amp",
            Operator::Pipe => "__op_pipe",
            Operator::ShiftL => "__op_shiftl",
            Operator::ShiftR => "__op_shiftr",
            Operator::Hat => "__op_hat",
            Operator::Tilde => "__op_tilde",
            Operator::EqEq => "__op_eqeq",
            Operator::Bang => "__op_bang",
            Operator::BangEq => "__op_bangeq",
            Operator::Le => "__op_less",
            Operator::LeEq => "__op_lesseq",
            Operator::Gt => "__op_gt",
            Operator::GtEq => "__op_gteq",
            Operator::ColonColon => "__op_coloncolon",
            Operator::SquareSquare => "__op_squaresquare",
            Operator::ParenParen => "__op_parenparen",
            Operator::QMarkQMark => "__op_qmarkqmark",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    Fun,
    Act,
    Struct,
    Union,
    Enum,
    Import,
    Is,
    As,
    Fork,
    Lazy,
    Intrinsic,
    If,
    Else,
    True,
    False,

    // Literals
    Ident(String),
    LitInt(i64),
    LitLong(i64),
    LitFloat(f64),
    LitString(String),
    LitChar(char),

    // Trivia kept as a token (spec §4.1: "comments are tokens")
    LineComment(String),

    // Operators that participate in overload resolution
    Op(Operator),

    // Punctuation with no operator identity
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Arrow,
    Eq,
    QMark,
    AmpAmp,
    PipePipe,

    Error(String),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}

/// Keyword lookup used by the lexer after scanning an identifier run.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "fun" => TokenKind::Fun,
        "act" => TokenKind::Act,
        "struct" => TokenKind::Struct,
        "union" => TokenKind::Union,
        "enum" => TokenKind::Enum,
        "import" => TokenKind::Import,
        "is" => TokenKind::Is,
        "as" => TokenKind::As,
        "fork" => TokenKind::Fork,
        "lazy" => TokenKind::Lazy,
        "intrinsic" => TokenKind::Intrinsic,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    })
}
