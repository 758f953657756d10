//! Tree-shake: "compute the transitive set of functions ... reachable from
//! exec statements; drop the rest" (spec §4.5, point 1). Runs before every
//! round and once more, unconditionally, after the fixed point settles.

use rustc_hash::FxHashSet;

use novus_ir::{Expr, ExprKind, FuncId, Program};

fn visit_expr(expr: &Expr, reachable: &mut FxHashSet<FuncId>, worklist: &mut Vec<FuncId>) {
    let mut mark = |fid: FuncId, worklist: &mut Vec<FuncId>| {
        if reachable.insert(fid) {
            worklist.push(fid);
        }
    };
    match &expr.kind {
        ExprKind::LitFunc(fid) => mark(*fid, worklist),
        ExprKind::Closure { func, bound_args } => {
            mark(*func, worklist);
            for a in bound_args {
                visit_expr(a, reachable, worklist);
            }
        }
        ExprKind::Assign(_, rhs) => visit_expr(rhs, reachable, worklist),
        ExprKind::Group(items) => {
            for e in items {
                visit_expr(e, reachable, worklist);
            }
        }
        ExprKind::Call { func, args, .. } => {
            mark(*func, worklist);
            for a in args {
                visit_expr(a, reachable, worklist);
            }
        }
        ExprKind::CallDyn { lhs, args, .. } => {
            visit_expr(lhs, reachable, worklist);
            for a in args {
                visit_expr(a, reachable, worklist);
            }
        }
        ExprKind::CallSelf { args } => {
            for a in args {
                visit_expr(a, reachable, worklist);
            }
        }
        ExprKind::Field(target, _) => visit_expr(target, reachable, worklist),
        ExprKind::UnionCheck(target, _) => visit_expr(target, reachable, worklist),
        ExprKind::UnionGet(target, _, _) => visit_expr(target, reachable, worklist),
        ExprKind::Switch { conditions, branches } => {
            for e in conditions.iter().chain(branches.iter()) {
                visit_expr(e, reachable, worklist);
            }
        }
        ExprKind::LitBool(_)
        | ExprKind::LitChar(_)
        | ExprKind::LitInt(_)
        | ExprKind::LitLong(_)
        | ExprKind::LitFloat(_)
        | ExprKind::LitString(_)
        | ExprKind::LitEnum(_, _)
        | ExprKind::Const(_) => {}
    }
}

/// Returns the set of functions reachable from the program's exec
/// statements, walking call/reference edges through every reachable
/// function's body and optional-argument initializers.
pub fn reachable_funcs(program: &Program) -> FxHashSet<FuncId> {
    let mut reachable = FxHashSet::default();
    let mut worklist = Vec::new();

    for stmt in program.exec_stmts() {
        visit_expr(stmt, &mut reachable, &mut worklist);
    }

    while let Some(fid) = worklist.pop() {
        if let Some(def) = program.func_def(fid) {
            visit_expr(&def.body, &mut reachable, &mut worklist);
            for init in &def.opt_arg_initializers {
                visit_expr(init, &mut reachable, &mut worklist);
            }
        }
    }

    reachable
}

/// Drops every function body not reachable from an exec statement.
pub fn run(program: &mut Program) {
    let reachable = reachable_funcs(program);
    program.retain_func_defs(&reachable);
}
