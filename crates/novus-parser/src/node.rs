//! The parse tree: `Expr`/`ExprKind` and `Item`/`ItemKind` (spec §3's
//! `ParseNode`, split into an expression and a statement family since Rust
//! has no single polymorphic node base to hang both off).
//!
//! Every node owns its children and carries a [`Span`]; an `ErrorNode` is
//! realized as `ExprKind::Error`/`ItemKind::Error` rather than a panic or a
//! `Result` — a syntax error never aborts parsing (spec §4.2).

use novus_common::Span;
use novus_lexer::Operator;

/// `name` or `name{T1,T2,...}` — a type reference as written in source,
/// resolved to a `TypeId` by the frontend.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeExpr {
    pub name: String,
    pub type_params: Vec<TypeExpr>,
    pub span: Span,
}

/// A function/lambda parameter, with its optional trailing-argument
/// initializer (spec §4.4: "optional arguments... expanded at every call
/// site lacking that argument").
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Expr::new(ExprKind::Error(message.into()), span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    LitBool(bool),
    LitInt(i64),
    LitLong(i64),
    LitFloat(f64),
    LitString(String),
    LitChar(char),

    /// A bare identifier: either a const reference or a zero-arg call,
    /// disambiguated by the frontend (spec §4.4).
    Ident(String),

    /// `(expr)` — kept as its own node (rather than collapsed away) so its
    /// span covers the parens for diagnostics.
    Paren(Box<Expr>),

    /// `a; b; c` — sequenced sub-expressions, last one's value is the
    /// group's value. Always 2 or more elements.
    Group(Vec<Expr>),

    Unary {
        op: Operator,
        operand: Box<Expr>,
    },
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `a && b` / `a || b` — not `Operator`s (non-overloadable), kept as
    /// their own nodes rather than collapsed into a `Conditional` here so
    /// the frontend's short-circuit lowering (spec §4.4) sees the original
    /// shape rather than having to recognize a synthesized one.
    LogicalAnd {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    LogicalOr {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `fork expr` / `lazy expr` — wraps a call, changing its `CallMode`
    /// and result type (spec §4.4 fork/lazy modifiers).
    Fork(Box<Expr>),
    Lazy(Box<Expr>),

    /// `name{T1,T2}(args)` or `name(args)` — function call, templated
    /// instance construction, or struct/union constructor; the frontend
    /// disambiguates by what `name` resolves to.
    Call {
        callee: String,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
    },

    /// `expr(args)` where `expr` is itself an expression rather than a bare
    /// name — e.g. `(f1)()` or `table[0]()` (spec §8 scenario 6's `CallDyn`
    /// on a function literal). A plain `name(args)` never produces this: it
    /// is folded into `Call` eagerly by `parse_ident_or_call` before this
    /// node's postfix loop ever sees the `(`.
    CallDyn {
        target: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `target[index]`, lowers to a call of `__op_squaresquare`.
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },

    Field {
        target: Box<Expr>,
        name: String,
    },

    /// `name = value` — declares (or rebinds) a local constant; the
    /// expression's own value is the assigned value.
    ConstDecl {
        name: String,
        value: Box<Expr>,
    },

    /// `cond ? ifTrue : ifFalse` — sugar for a 1-condition `Switch`.
    Conditional {
        cond: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },

    /// `if c1 -> b1  if c2 -> b2  else -> bN` — `branches.len() ==
    /// conditions.len() + 1`.
    Switch {
        conditions: Vec<Expr>,
        branches: Vec<Expr>,
    },

    /// `target is Type` — union type-check, yields `bool`.
    Is {
        target: Box<Expr>,
        ty: TypeExpr,
    },

    /// `target as Type bind` — union type-check-and-bind; `bind` names the
    /// constant the narrowed value is bound to on success.
    As {
        target: Box<Expr>,
        ty: TypeExpr,
        bind: Option<String>,
    },

    /// `lambda (params) -> retType body` — anonymous function literal.
    Lambda {
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        is_action: bool,
        body: Box<Expr>,
    },

    /// A syntax error recovered from: carries the diagnostic message.
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

impl Item {
    pub fn new(kind: ItemKind, span: Span) -> Self {
        Item { kind, span }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Item::new(ItemKind::Error(message.into()), span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ItemKind::Error(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    Func {
        name: String,
        type_params: Vec<String>,
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        is_action: bool,
        is_implicit_conv: bool,
        body: Expr,
    },
    Struct {
        name: String,
        type_params: Vec<String>,
        fields: Vec<(String, TypeExpr)>,
    },
    Union {
        name: String,
        type_params: Vec<String>,
        members: Vec<TypeExpr>,
    },
    Enum {
        name: String,
        entries: Vec<(String, Option<i32>)>,
    },
    Import {
        path: String,
    },
    /// A top-level bare expression, executed at program startup.
    Exec(Expr),
    Error(String),
}
