//! The program IR: types, functions, expressions, and the `Program` that
//! owns them all (spec §3).
//!
//! Every id (`TypeId`, `FuncId`, `ConstId`, `FieldId`) is opaque and only
//! meaningful relative to the single [`Program`] that issued it. Operators
//! are not redefined here — they are [`novus_lexer::Operator`], re-exported
//! as [`Operator`], since the lexer already owns the fixed `__op_*` name
//! table that both the parser and this crate's `GetExpr`-equivalent lean
//! on (spec §4.4).

pub mod expr;
pub mod func;
pub mod ids;
pub mod intrinsics;
pub mod program;
pub mod tables;
pub mod templates;
pub mod types;

pub use expr::{CallMode, Expr, ExprKind};
pub use func::{FuncDecl, FuncDef, FuncKind, IntrinsicOp};
pub use ids::{ConstId, FieldId, FuncId, TypeId};
pub use intrinsics::{register_intrinsics, Primitives};
pub use novus_lexer::Operator;
pub use program::Program;
pub use tables::{ConstDecl, ConstDeclTable, TypeSet};
pub use templates::{FuncTemplate, FuncTemplateTable, TypeSubstitutionTable, TypeTemplate, TypeTemplateTable};
pub use types::{DelegateDef, EnumDef, EnumEntry, FieldDeclTable, LazyDef, StructDef, TypeInfo, TypeKind, UnionDef};
