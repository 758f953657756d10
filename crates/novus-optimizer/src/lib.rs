//! Fixed-point optimizer (spec §4.5): tree-shake, constant elimination,
//! literal precomputation, and call inlining, run to a fixed point bounded
//! by [`novus_common::limits::MAX_OPTIMIZER_ROUNDS`].
//!
//! Grounded on `examples/mohsen1-tsz/src/transforms`' rewrite-to-fixed-point
//! idiom (an ES5-lowering pass driver there runs transforms until a round
//! changes nothing) and named after `tsz-lowering`'s crate role in the
//! teacher's own pipeline.

mod const_elim;
mod fold;
mod inline;
mod treeshake;

use novus_common::limits::MAX_OPTIMIZER_ROUNDS;
use novus_ir::{Expr, ExprKind, Program};

fn run_const_elim(expr: Expr, program: &Program) -> (Expr, bool) {
    let Expr { kind, ty, source } = expr;
    let mut changed = false;
    let kind = match kind {
        ExprKind::Group(items) => {
            let mut rewritten = Vec::with_capacity(items.len());
            for item in items {
                let (item, c) = run_const_elim(item, program);
                changed |= c;
                rewritten.push(item);
            }
            let (rewritten, c) = const_elim::run_on_group(rewritten, program);
            changed |= c;
            ExprKind::Group(rewritten)
        }
        ExprKind::Assign(id, rhs) => {
            let (rhs, c) = run_const_elim(*rhs, program);
            changed |= c;
            ExprKind::Assign(id, Box::new(rhs))
        }
        ExprKind::Call { func, args, mode } => {
            let mut rewritten = Vec::with_capacity(args.len());
            for a in args {
                let (a, c) = run_const_elim(a, program);
                changed |= c;
                rewritten.push(a);
            }
            ExprKind::Call { func, args: rewritten, mode }
        }
        ExprKind::CallDyn { lhs, args, fork } => {
            let (lhs, c) = run_const_elim(*lhs, program);
            changed |= c;
            let mut rewritten = Vec::with_capacity(args.len());
            for a in args {
                let (a, c) = run_const_elim(a, program);
                changed |= c;
                rewritten.push(a);
            }
            ExprKind::CallDyn { lhs: Box::new(lhs), args: rewritten, fork }
        }
        ExprKind::CallSelf { args } => {
            let mut rewritten = Vec::with_capacity(args.len());
            for a in args {
                let (a, c) = run_const_elim(a, program);
                changed |= c;
                rewritten.push(a);
            }
            ExprKind::CallSelf { args: rewritten }
        }
        ExprKind::Field(target, fid) => {
            let (target, c) = run_const_elim(*target, program);
            changed |= c;
            ExprKind::Field(Box::new(target), fid)
        }
        ExprKind::UnionCheck(target, ty) => {
            let (target, c) = run_const_elim(*target, program);
            changed |= c;
            ExprKind::UnionCheck(Box::new(target), ty)
        }
        ExprKind::UnionGet(target, ty, cid) => {
            let (target, c) = run_const_elim(*target, program);
            changed |= c;
            ExprKind::UnionGet(Box::new(target), ty, cid)
        }
        ExprKind::Switch { conditions, branches } => {
            let mut new_conditions = Vec::with_capacity(conditions.len());
            for e in conditions {
                let (e, c) = run_const_elim(e, program);
                changed |= c;
                new_conditions.push(e);
            }
            let mut new_branches = Vec::with_capacity(branches.len());
            for e in branches {
                let (e, c) = run_const_elim(e, program);
                changed |= c;
                new_branches.push(e);
            }
            ExprKind::Switch { conditions: new_conditions, branches: new_branches }
        }
        ExprKind::Closure { func, bound_args } => {
            let mut rewritten = Vec::with_capacity(bound_args.len());
            for a in bound_args {
                let (a, c) = run_const_elim(a, program);
                changed |= c;
                rewritten.push(a);
            }
            ExprKind::Closure { func, bound_args: rewritten }
        }
        leaf => leaf,
    };
    (Expr::new(kind, ty, source), changed)
}

/// Runs the fixed-point driver over every function body, optional-argument
/// initializer, and exec statement, then tree-shakes once more
/// unconditionally (spec §4.5: "tree-shake before the round; also
/// unconditionally at the very end").
pub fn optimize(mut program: Program) -> Program {
    for round in 0..MAX_OPTIMIZER_ROUNDS {
        treeshake::run(&mut program);
        let graph = inline::build_graph(&program);
        let mut changed = false;

        let func_ids: Vec<_> = program.defined_func_ids().collect();
        for fid in func_ids {
            let mut def = program.func_def(fid).expect("id came from defined_func_ids").clone();

            let (body, c1) = run_const_elim(def.body, &program);
            changed |= c1;
            let (body, c2) = fold::run(body, &mut program);
            changed |= c2;
            let (body, c3) = inline::run(body, &mut program, &graph, Some(fid), &mut def.consts);
            changed |= c3;
            def.body = body;

            let mut new_inits = Vec::with_capacity(def.opt_arg_initializers.len());
            for init in def.opt_arg_initializers {
                let (init, c1) = run_const_elim(init, &program);
                let (init, c2) = fold::run(init, &mut program);
                let (init, c3) = inline::run(init, &mut program, &graph, Some(fid), &mut def.consts);
                changed |= c1 || c2 || c3;
                new_inits.push(init);
            }
            def.opt_arg_initializers = new_inits;

            program.define_func(def);
        }

        let exec_stmts: Vec<Expr> = program.exec_stmts().to_vec();
        let mut new_execs = Vec::with_capacity(exec_stmts.len());
        let mut scratch_consts = novus_ir::ConstDeclTable::new();
        for stmt in exec_stmts {
            let (stmt, c1) = run_const_elim(stmt, &program);
            let (stmt, c2) = fold::run(stmt, &mut program);
            let (stmt, c3) = inline::run(stmt, &mut program, &graph, None, &mut scratch_consts);
            changed |= c1 || c2 || c3;
            new_execs.push(stmt);
        }
        *program.exec_stmts_mut() = new_execs;

        tracing::debug!(round, changed, "optimizer round complete");
        if !changed {
            break;
        }
    }

    treeshake::run(&mut program);
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use novus_ir::{register_intrinsics, CallMode, FuncDecl, FuncKind, FuncDef, TypeSet};

    #[test]
    fn one_plus_two_optimizes_to_a_literal() {
        let mut program = Program::new();
        let prim = register_intrinsics(&mut program);
        let plus = program
            .funcs_named("__op_plus")
            .iter()
            .copied()
            .find(|f| program.func_decl(*f).input.0 == vec![prim.int, prim.int])
            .unwrap();

        let body = Expr::new(
            ExprKind::Call {
                func: plus,
                args: vec![Expr::new(ExprKind::LitInt(1), prim.int, None), Expr::new(ExprKind::LitInt(2), prim.int, None)],
                mode: CallMode::Normal,
            },
            prim.int,
            None,
        );
        let f = program.declare_func(|id| FuncDecl {
            id,
            name: "f".to_string(),
            kind: FuncKind::User,
            input: TypeSet::new(vec![]),
            output: prim.int,
            opt_input_count: 0,
            is_implicit_conv: false,
            is_action: false,
        });
        program.define_func(FuncDef { id: f, consts: novus_ir::ConstDeclTable::new(), body: body.clone(), opt_arg_initializers: vec![] });
        program.add_exec(Expr::new(ExprKind::LitFunc(f), prim.int, None));

        let optimized = optimize(program);
        let def = optimized.func_def(f).expect("f survives tree-shake (referenced from an exec stmt)");
        assert!(matches!(def.body.kind, ExprKind::LitInt(3)));
    }

    #[test]
    fn unreferenced_function_is_tree_shaken() {
        let mut program = Program::new();
        let prim = register_intrinsics(&mut program);
        let dead = program.declare_func(|id| FuncDecl {
            id,
            name: "dead".to_string(),
            kind: FuncKind::User,
            input: TypeSet::new(vec![]),
            output: prim.int,
            opt_input_count: 0,
            is_implicit_conv: false,
            is_action: false,
        });
        program.define_func(FuncDef {
            id: dead,
            consts: novus_ir::ConstDeclTable::new(),
            body: Expr::new(ExprKind::LitInt(0), prim.int, None),
            opt_arg_initializers: vec![],
        });

        let optimized = optimize(program);
        assert!(optimized.func_def(dead).is_none());
    }
}
