//! Pass 6: lower every pending function's body (and its optional-argument
//! initializers) and commit the result as a [`novus_ir::FuncDef`] (spec
//! §4.4 pass 6).
//!
//! By this point pass 5 has patched every inferred-return function's
//! `FuncDecl::output` to its settled type, so this pass treats every
//! function identically: lower the body with `self_call.ret_type` set to
//! the function's own (now final) output, then reconcile against it via
//! [`crate::get_expr::GetExpr::finish_func_body`].
//!
//! An optional parameter's initializer is lowered once here, not per call
//! site, against a scope holding only the parameters declared before it —
//! `fn f(a: int, b: int = a + 1)` can reach `a`, never a parameter to its
//! right. Pass 9 copies the resulting [`novus_ir::Expr`] into every call
//! site missing that argument.

use novus_common::SourceTable;
use novus_ir::{ConstDeclTable, FuncDef, FuncId, Primitives};

use crate::context::AnalysisContext;
use crate::get_expr::{GetExpr, SelfCallInfo};

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives) {
    let mut pending: Vec<FuncId> = ctx.pending_funcs.keys().copied().collect();
    pending.sort();
    for fid in pending {
        define_one(ctx, sources, primitives, fid);
    }
}

fn define_one(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives, fid: FuncId) {
    let pf = &ctx.pending_funcs[&fid];
    let file = pf.file;
    let name = ctx.program.func_decl(fid).name.clone();
    let arity = pf.param_names.len();
    let declared_output = ctx.program.func_decl(fid).output;
    let body = pf.body.clone();
    let param_names = pf.param_names.clone();
    let param_types = pf.param_types.clone();
    let opt_initializers = pf.opt_initializers.clone();

    let mut consts = ConstDeclTable::new();
    for (n, ty) in param_names.iter().zip(param_types.iter()) {
        consts.declare_input(n.clone(), *ty);
    }

    let final_body = {
        let mut lowerer = GetExpr {
            ctx: &mut *ctx,
            sources: &mut *sources,
            file,
            primitives,
            type_sub: None,
            consts: &mut consts,
            self_call: Some(SelfCallInfo { ret_type: Some(declared_output), arity }),
        };
        let body_e = lowerer.lower(&body);
        lowerer.finish_func_body(body_e, declared_output, &name, body.span)
    };

    let mut lowered_initializers = Vec::with_capacity(opt_initializers.iter().filter(|o| o.is_some()).count());
    for (i, init) in opt_initializers.iter().enumerate() {
        let Some(init_expr) = init else { continue };
        let mut scope = ConstDeclTable::new();
        for (n, ty) in param_names[..i].iter().zip(param_types[..i].iter()) {
            scope.declare_input(n.clone(), *ty);
        }
        let mut lowerer = GetExpr {
            ctx: &mut *ctx,
            sources: &mut *sources,
            file,
            primitives,
            type_sub: None,
            consts: &mut scope,
            self_call: None,
        };
        lowered_initializers.push(lowerer.lower(init_expr));
    }

    ctx.program.define_func(FuncDef {
        id: fid,
        consts,
        body: final_body,
        opt_arg_initializers: lowered_initializers,
    });
}
