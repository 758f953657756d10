//! Recursive-descent + Pratt parser turning a `novus` token stream into a
//! parse tree (spec §4.2, §3's `ParseNode`).
//!
//! A syntax error never aborts parsing: the offending node becomes
//! [`node::ExprKind::Error`] / [`node::ItemKind::Error`] and the parser
//! resynchronizes at the next statement boundary. Lifting those error nodes
//! into diagnostics is the frontend's job (spec §4.4 pass 1), not this
//! crate's — `novus-parser` has no dependency on `novus-common`'s
//! diagnostic types beyond `Span`.

pub mod node;
pub mod parser;
pub mod precedence;

pub use node::{Expr, ExprKind, Item, ItemKind, Param, TypeExpr};
pub use parser::Parser;
