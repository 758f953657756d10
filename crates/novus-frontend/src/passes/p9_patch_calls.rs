//! Pass 9: pad every call site that omitted a trailing optional argument
//! with that parameter's (already-lowered, pass 6) initializer expression
//! (spec §4.4 pass 9).
//!
//! A freshly cloned initializer is walked the same way its owning call's
//! body is, so an initializer that itself omits an optional argument
//! expands recursively; `source_loc_file/line/column` intrinsic calls
//! found anywhere in that cloned subtree are replaced with literals for
//! the *original* call site, not the initializer's own declaration site —
//! one `anchor: Option<SourceId>` threaded through the walk carries that
//! distinction: `None` at ordinary body level (a `source_loc_*` call
//! there already has the right location from pass 6/7), `Some(id)` once
//! inside an expansion, where `id` stays pinned to the outermost call
//! throughout however many initializers it pulls in. The same field
//! bounds the recursion: past
//! [`novus_common::limits::MAX_OPT_ARG_EXPANSION_DEPTH`] the chain is
//! assumed cyclic and reported as `CyclicOptArgInitializer` at that
//! outermost call, with placeholder arguments filled in so the tree stays
//! well-formed.

use novus_common::limits::MAX_OPT_ARG_EXPANSION_DEPTH;
use novus_common::{DiagnosticKind, SourceId, SourceTable};
use novus_ir::{Expr, ExprKind, FuncId, FuncKind, IntrinsicOp, Primitives};

use crate::context::AnalysisContext;

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives) {
    let fids: Vec<FuncId> = ctx.pending_funcs.keys().copied().collect();
    for fid in fids {
        let Some(mut def) = ctx.program.func_def(fid).cloned() else { continue };
        walk(ctx, sources, primitives, &mut def.body, None, 0);
        ctx.program.define_func(def);
    }

    let mut execs = ctx.program.exec_stmts().to_vec();
    for e in &mut execs {
        walk(ctx, sources, primitives, e, None, 0);
    }
    *ctx.program.exec_stmts_mut() = execs;
}

fn placeholder_expr(primitives: &Primitives, source: Option<SourceId>) -> Expr {
    Expr::new(ExprKind::LitInt(0), primitives.int, source)
}

fn source_loc_literal(func: FuncId, ctx: &mut AnalysisContext, sources: &SourceTable, primitives: &Primitives, anchor: SourceId) -> Option<Expr> {
    let FuncKind::Intrinsic(op) = ctx.program.func_decl(func).kind else { return None };
    let (file, span) = sources.resolve(anchor);
    match op {
        IntrinsicOp::SourceLocFile => {
            let id = sources.file(file).id.clone();
            let atom = ctx.program.interner_mut().intern(&id);
            Some(Expr::new(ExprKind::LitString(atom), primitives.string, Some(anchor)))
        }
        IntrinsicOp::SourceLocLine => {
            let pos = sources.file(file).line_index().pos(span.start);
            Some(Expr::new(ExprKind::LitInt(pos.line as i64), primitives.int, Some(anchor)))
        }
        IntrinsicOp::SourceLocColumn => {
            let pos = sources.file(file).line_index().pos(span.start);
            Some(Expr::new(ExprKind::LitInt(pos.column as i64), primitives.int, Some(anchor)))
        }
        _ => None,
    }
}

fn walk(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives, e: &mut Expr, anchor: Option<SourceId>, depth: u32) {
    if let Some(id) = anchor {
        if let ExprKind::Call { func, args, .. } = &e.kind {
            if args.is_empty() {
                if let Some(lit) = source_loc_literal(*func, ctx, sources, primitives, id) {
                    *e = lit;
                    return;
                }
            }
        }
    }
    match &mut e.kind {
        ExprKind::Call { func, args, .. } => {
            for a in args.iter_mut() {
                walk(ctx, sources, primitives, a, anchor, depth);
            }
            let this_anchor = anchor.or(e.source);
            pad_call(ctx, sources, primitives, *func, args, this_anchor, depth);
        }
        ExprKind::CallDyn { lhs, args, .. } => {
            walk(ctx, sources, primitives, lhs, anchor, depth);
            for a in args.iter_mut() {
                walk(ctx, sources, primitives, a, anchor, depth);
            }
        }
        ExprKind::CallSelf { args } => {
            for a in args.iter_mut() {
                walk(ctx, sources, primitives, a, anchor, depth);
            }
        }
        ExprKind::Closure { bound_args, .. } => {
            for a in bound_args.iter_mut() {
                walk(ctx, sources, primitives, a, anchor, depth);
            }
        }
        ExprKind::Assign(_, v) => walk(ctx, sources, primitives, v, anchor, depth),
        ExprKind::Group(items) => {
            for i in items.iter_mut() {
                walk(ctx, sources, primitives, i, anchor, depth);
            }
        }
        ExprKind::Field(inner, _) => walk(ctx, sources, primitives, inner, anchor, depth),
        ExprKind::UnionCheck(inner, _) => walk(ctx, sources, primitives, inner, anchor, depth),
        ExprKind::UnionGet(inner, _, _) => walk(ctx, sources, primitives, inner, anchor, depth),
        ExprKind::Switch { conditions, branches } => {
            for c in conditions.iter_mut() {
                walk(ctx, sources, primitives, c, anchor, depth);
            }
            for b in branches.iter_mut() {
                walk(ctx, sources, primitives, b, anchor, depth);
            }
        }
        ExprKind::LitBool(_)
        | ExprKind::LitChar(_)
        | ExprKind::LitInt(_)
        | ExprKind::LitLong(_)
        | ExprKind::LitFloat(_)
        | ExprKind::LitString(_)
        | ExprKind::LitEnum(..)
        | ExprKind::LitFunc(_)
        | ExprKind::Const(_) => {}
    }
}

fn pad_call(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    primitives: &Primitives,
    func: FuncId,
    args: &mut Vec<Expr>,
    anchor: Option<SourceId>,
    depth: u32,
) {
    let decl = ctx.program.func_decl(func);
    let arity = decl.input.arity();
    let required = decl.required_input_count();
    if args.len() >= arity {
        return;
    }
    if depth > MAX_OPT_ARG_EXPANSION_DEPTH {
        ctx.error(DiagnosticKind::CyclicOptArgInitializer, anchor);
        for _ in args.len()..arity {
            args.push(placeholder_expr(primitives, anchor));
        }
        return;
    }
    let Some(initializers) = ctx.program.func_def(func).map(|d| d.opt_arg_initializers.clone()) else {
        for _ in args.len()..arity {
            args.push(placeholder_expr(primitives, anchor));
        }
        return;
    };
    for i in args.len()..arity {
        let idx = i - required;
        let Some(template) = initializers.get(idx).cloned() else { break };
        let mut expanded = template;
        walk(ctx, sources, primitives, &mut expanded, anchor, depth + 1);
        args.push(expanded);
    }
}
