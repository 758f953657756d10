//! Pass 1: lift every `ItemKind::Error`/`ExprKind::Error` node left behind
//! by recovery-on-error parsing into a real diagnostic, so a syntax error
//! is reported even though parsing itself never aborts (spec §4.2, §4.4
//! pass 1).

use novus_common::{DiagnosticKind, FileId, SourceTable};
use novus_parser::{Expr, ExprKind, Item, ItemKind, Param};

use crate::context::AnalysisContext;

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable) {
    let files = ctx.files.clone();
    for file in files {
        let items = ctx.trees.get(&file).cloned().unwrap_or_default();
        for item in &items {
            visit_item(ctx, sources, file, item);
        }
    }
}

fn visit_item(ctx: &mut AnalysisContext, sources: &mut SourceTable, file: FileId, item: &Item) {
    match &item.kind {
        ItemKind::Error(message) => report(ctx, sources, file, message, item.span),
        ItemKind::Func { params, ret: _, body, .. } => {
            for p in params {
                visit_param(ctx, sources, file, p);
            }
            visit_expr(ctx, sources, file, body);
        }
        ItemKind::Exec(expr) => visit_expr(ctx, sources, file, expr),
        ItemKind::Struct { .. } | ItemKind::Union { .. } | ItemKind::Enum { .. } | ItemKind::Import { .. } => {}
    }
}

fn visit_param(ctx: &mut AnalysisContext, sources: &mut SourceTable, file: FileId, p: &Param) {
    if let Some(default) = &p.default {
        visit_expr(ctx, sources, file, default);
    }
}

fn visit_expr(ctx: &mut AnalysisContext, sources: &mut SourceTable, file: FileId, e: &Expr) {
    match &e.kind {
        ExprKind::Error(message) => report(ctx, sources, file, message, e.span),
        ExprKind::LitBool(_)
        | ExprKind::LitInt(_)
        | ExprKind::LitLong(_)
        | ExprKind::LitFloat(_)
        | ExprKind::LitString(_)
        | ExprKind::LitChar(_)
        | ExprKind::Ident(_) => {}
        ExprKind::Paren(inner) | ExprKind::Fork(inner) | ExprKind::Lazy(inner) => visit_expr(ctx, sources, file, inner),
        ExprKind::Group(items) => {
            for i in items {
                visit_expr(ctx, sources, file, i);
            }
        }
        ExprKind::Unary { operand, .. } => visit_expr(ctx, sources, file, operand),
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::LogicalAnd { lhs, rhs } | ExprKind::LogicalOr { lhs, rhs } => {
            visit_expr(ctx, sources, file, lhs);
            visit_expr(ctx, sources, file, rhs);
        }
        ExprKind::Call { args, .. } => {
            for a in args {
                visit_expr(ctx, sources, file, a);
            }
        }
        ExprKind::CallDyn { target, args } => {
            visit_expr(ctx, sources, file, target);
            for a in args {
                visit_expr(ctx, sources, file, a);
            }
        }
        ExprKind::Index { target, index } => {
            visit_expr(ctx, sources, file, target);
            visit_expr(ctx, sources, file, index);
        }
        ExprKind::Field { target, .. } => visit_expr(ctx, sources, file, target),
        ExprKind::ConstDecl { value, .. } => visit_expr(ctx, sources, file, value),
        ExprKind::Conditional { cond, if_true, if_false } => {
            visit_expr(ctx, sources, file, cond);
            visit_expr(ctx, sources, file, if_true);
            visit_expr(ctx, sources, file, if_false);
        }
        ExprKind::Switch { conditions, branches } => {
            for c in conditions {
                visit_expr(ctx, sources, file, c);
            }
            for b in branches {
                visit_expr(ctx, sources, file, b);
            }
        }
        ExprKind::Is { target, .. } => visit_expr(ctx, sources, file, target),
        ExprKind::As { target, .. } => visit_expr(ctx, sources, file, target),
        ExprKind::Lambda { params, body, .. } => {
            for p in params {
                visit_param(ctx, sources, file, p);
            }
            visit_expr(ctx, sources, file, body);
        }
    }
}

fn report(ctx: &mut AnalysisContext, sources: &mut SourceTable, file: FileId, message: &str, span: novus_common::Span) {
    let source = sources.intern_loc(file, span);
    ctx.error(DiagnosticKind::ParseError { message: message.to_string() }, Some(source));
}
