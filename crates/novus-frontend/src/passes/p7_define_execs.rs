//! Pass 7: lower every top-level bare-expression statement into an
//! execute-statement, run at program startup in file-then-declaration
//! order (spec §4.4 pass 7).
//!
//! An exec statement has no parameters and isn't itself callable, so it
//! gets an empty [`ConstDeclTable`] and no `self_call` context — a bare
//! `self(...)` at the top level is exactly as nonsensical as one inside a
//! struct field initializer, and `SelfCallInNonFunc` already says so.

use novus_common::SourceTable;
use novus_ir::{ConstDeclTable, Primitives};

use crate::context::AnalysisContext;
use crate::get_expr::GetExpr;

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives) {
    let items = ctx.exec_items.clone();
    for (file, body) in items {
        let mut consts = ConstDeclTable::new();
        let lowered = {
            let mut lowerer = GetExpr {
                ctx: &mut *ctx,
                sources: &mut *sources,
                file,
                primitives,
                type_sub: None,
                consts: &mut consts,
                self_call: None,
            };
            lowerer.lower(&body)
        };
        ctx.program.add_exec(lowered);
    }
}
