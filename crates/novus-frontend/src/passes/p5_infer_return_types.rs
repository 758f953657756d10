//! Pass 5: settle the return type of every function declared without one
//! (spec §4.4 pass 5).
//!
//! Each round re-lowers an unresolved function's body with a "trial"
//! diagnostics buffer swapped in, so a speculative lowering that hits a
//! dead end doesn't leak a diagnostic into the real list; the resulting
//! type is committed via [`novus_ir::Program::set_func_output`] only when
//! the trial came back clean, so the next round's callers (and the
//! function's own `self(...)` calls) see the improved guess. The loop
//! stops once a round makes no further changes, or after
//! [`novus_common::limits::MAX_RETURN_TYPE_INFER_ROUNDS`] rounds; anything
//! still unresolved is reported as `UnableToInferFuncReturnType`.
//!
//! A trial is "clean" if it raises no diagnostic other than
//! `SelfCallWithoutInferredRetType` — that one is expected on a function's
//! first round or two (its own return type isn't known yet) and is exactly
//! what "propagate the function's currently best-known return type"
//! (spec §4.4) means in practice: the self-call's contribution to the
//! body's type is provisional until a later round re-lowers it with a real
//! guess in hand. Tolerating it is what lets ordinary structural recursion
//! (a base case plus one self-call) converge at all.
//!
//! Mutual recursion between two *different* inferred-return functions is
//! not iteratively refined the same way: an ordinary call site reads
//! whatever output its callee currently has declared (its pass-4
//! placeholder, or the best guess a prior round already committed), with
//! no equivalent "this is still provisional" diagnostic to suppress. This
//! is a known narrowing from the original's fixed point — recorded, not
//! silently dropped.

use rustc_hash::FxHashSet;

use novus_common::limits::MAX_RETURN_TYPE_INFER_ROUNDS;
use novus_common::{DiagnosticKind, SourceTable};
use novus_ir::{ConstDeclTable, FuncId, Primitives};

use crate::context::AnalysisContext;
use crate::get_expr::{GetExpr, SelfCallInfo};

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives) {
    let mut unresolved: Vec<FuncId> = ctx
        .pending_funcs
        .iter()
        .filter(|(_, pf)| pf.declared_ret.is_none())
        .map(|(&fid, _)| fid)
        .collect();
    unresolved.sort();

    let mut resolved: FxHashSet<FuncId> = FxHashSet::default();

    for _round in 0..MAX_RETURN_TYPE_INFER_ROUNDS {
        let mut progressed = false;
        for &fid in &unresolved {
            let before = ctx.program.func_decl(fid).output;
            let is_first_clean_pass = !resolved.contains(&fid);
            if let Some(ty) = try_infer(ctx, sources, primitives, fid, resolved.contains(&fid)) {
                if is_first_clean_pass || ty != before {
                    progressed = true;
                }
                resolved.insert(fid);
                ctx.program.set_func_output(fid, ty);
            }
        }
        if !progressed {
            break;
        }
    }

    for fid in unresolved {
        if !resolved.contains(&fid) {
            let pf = &ctx.pending_funcs[&fid];
            let name = ctx.program.func_decl(fid).name.clone();
            let source = sources.intern_loc(pf.file, pf.span);
            ctx.error(DiagnosticKind::UnableToInferFuncReturnType { name }, Some(source));
        }
    }
}

fn try_infer(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    primitives: &Primitives,
    fid: FuncId,
    has_prior_guess: bool,
) -> Option<novus_ir::TypeId> {
    let pf = &ctx.pending_funcs[&fid];
    let file = pf.file;
    let arity = pf.param_names.len();
    let body = pf.body.clone();
    let param_names = pf.param_names.clone();
    let param_types = pf.param_types.clone();

    let ret_guess = has_prior_guess.then(|| ctx.program.func_decl(fid).output);

    let mut consts = ConstDeclTable::new();
    for (name, ty) in param_names.into_iter().zip(param_types.into_iter()) {
        consts.declare_input(name, ty);
    }

    let saved = std::mem::take(&mut ctx.diagnostics);
    let result_ty = {
        let mut lowerer = GetExpr {
            ctx,
            sources,
            file,
            primitives,
            type_sub: None,
            consts: &mut consts,
            self_call: Some(SelfCallInfo { ret_type: ret_guess, arity }),
        };
        lowerer.lower(&body).get_type()
    };
    let trial = std::mem::replace(&mut ctx.diagnostics, saved);

    let clean = trial
        .iter()
        .all(|d| matches!(d.kind, DiagnosticKind::SelfCallWithoutInferredRetType));
    clean.then_some(result_ty)
}
