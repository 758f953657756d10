//! Constant elimination (spec §4.5, point 2): a const declared in a
//! `Group` (not its last element) is dropped and every use replaced by a
//! clone of its assignment expression, when the const is used at most once
//! or the assignment is cheap to duplicate. Side-effecting assignments are
//! never moved.

use novus_ir::{ConstId, Expr, ExprKind, FuncId, IntrinsicOp, Program};

fn is_action(program: &Program, fid: FuncId) -> bool {
    program.func_decl(fid).is_action
}

fn has_side_effect(expr: &Expr, program: &Program) -> bool {
    expr.has_side_effect(|fid| is_action(program, fid))
}

/// "Literal, pure intrinsic with cheap args, or another const" (spec §4.5).
fn is_cheap(expr: &Expr, program: &Program) -> bool {
    match &expr.kind {
        ExprKind::LitBool(_)
        | ExprKind::LitChar(_)
        | ExprKind::LitInt(_)
        | ExprKind::LitLong(_)
        | ExprKind::LitFloat(_)
        | ExprKind::LitString(_)
        | ExprKind::LitEnum(_, _)
        | ExprKind::Const(_) => true,
        ExprKind::Call { func, args, mode } => {
            *mode == novus_ir::CallMode::Normal
                && matches!(program.func_decl(*func).kind, novus_ir::FuncKind::Intrinsic(op) if op.is_precomputable())
                && args.iter().all(|a| is_cheap(a, program))
        }
        _ => false,
    }
}

fn count_uses(expr: &Expr, id: ConstId) -> usize {
    match &expr.kind {
        ExprKind::Const(c) => usize::from(*c == id),
        ExprKind::Assign(_, rhs) => count_uses(rhs, id),
        ExprKind::Group(items) => items.iter().map(|e| count_uses(e, id)).sum(),
        ExprKind::Call { args, .. } => args.iter().map(|a| count_uses(a, id)).sum(),
        ExprKind::CallDyn { lhs, args, .. } => count_uses(lhs, id) + args.iter().map(|a| count_uses(a, id)).sum::<usize>(),
        ExprKind::CallSelf { args } => args.iter().map(|a| count_uses(a, id)).sum(),
        ExprKind::Field(target, _) => count_uses(target, id),
        ExprKind::UnionCheck(target, _) => count_uses(target, id),
        ExprKind::UnionGet(target, _, _) => count_uses(target, id),
        ExprKind::Switch { conditions, branches } => {
            conditions.iter().chain(branches.iter()).map(|e| count_uses(e, id)).sum()
        }
        ExprKind::Closure { bound_args, .. } => bound_args.iter().map(|e| count_uses(e, id)).sum(),
        ExprKind::LitBool(_)
        | ExprKind::LitChar(_)
        | ExprKind::LitInt(_)
        | ExprKind::LitLong(_)
        | ExprKind::LitFloat(_)
        | ExprKind::LitString(_)
        | ExprKind::LitEnum(_, _)
        | ExprKind::LitFunc(_) => 0,
    }
}

fn substitute(expr: &mut Expr, id: ConstId, value: &Expr) {
    match &mut expr.kind {
        ExprKind::Const(c) if *c == id => *expr = value.clone(),
        ExprKind::Const(_) => {}
        ExprKind::Assign(_, rhs) => substitute(rhs, id, value),
        ExprKind::Group(items) => items.iter_mut().for_each(|e| substitute(e, id, value)),
        ExprKind::Call { args, .. } => args.iter_mut().for_each(|a| substitute(a, id, value)),
        ExprKind::CallDyn { lhs, args, .. } => {
            substitute(lhs, id, value);
            args.iter_mut().for_each(|a| substitute(a, id, value));
        }
        ExprKind::CallSelf { args } => args.iter_mut().for_each(|a| substitute(a, id, value)),
        ExprKind::Field(target, _) => substitute(target, id, value),
        ExprKind::UnionCheck(target, _) => substitute(target, id, value),
        ExprKind::UnionGet(target, _, _) => substitute(target, id, value),
        ExprKind::Switch { conditions, branches } => {
            conditions.iter_mut().chain(branches.iter_mut()).for_each(|e| substitute(e, id, value));
        }
        ExprKind::Closure { bound_args, .. } => bound_args.iter_mut().for_each(|e| substitute(e, id, value)),
        ExprKind::LitBool(_)
        | ExprKind::LitChar(_)
        | ExprKind::LitInt(_)
        | ExprKind::LitLong(_)
        | ExprKind::LitFloat(_)
        | ExprKind::LitString(_)
        | ExprKind::LitEnum(_, _)
        | ExprKind::LitFunc(_) => {}
    }
}

/// Eliminates consts directly within one `Group`'s own element list. Scope
/// is deliberately limited to this group's siblings, not nested groups
/// (e.g. `Switch` branches) — a simplification of spec §4.5's wider
/// "used at most once" analysis that only misses opportunities, never
/// produces an incorrect program.
pub fn run_on_group(mut elems: Vec<Expr>, program: &Program) -> (Vec<Expr>, bool) {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < elems.len() {
        let eligible = matches!(&elems[i].kind, ExprKind::Assign(_, rhs) if !has_side_effect(rhs, program));
        if !eligible {
            i += 1;
            continue;
        }
        let ExprKind::Assign(id, rhs) = &elems[i].kind else { unreachable!() };
        let id = *id;
        let rhs = (**rhs).clone();
        let uses: usize = elems[i + 1..].iter().map(|e| count_uses(e, id)).sum();
        if uses <= 1 || is_cheap(&rhs, program) {
            for e in &mut elems[i + 1..] {
                substitute(e, id, &rhs);
            }
            elems.remove(i);
            changed = true;
        } else {
            i += 1;
        }
    }
    (elems, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use novus_ir::{register_intrinsics, ConstDeclTable, Expr as E, TypeId};

    fn leaf(kind: ExprKind, ty: TypeId) -> E {
        E::new(kind, ty, None)
    }

    #[test]
    fn single_use_const_is_inlined_and_dropped() {
        let mut program = Program::new();
        let prim = register_intrinsics(&mut program);
        let mut consts = ConstDeclTable::new();
        let id = consts.declare_local("x".to_string(), prim.int);

        let group = vec![
            leaf(ExprKind::Assign(id, Box::new(leaf(ExprKind::LitInt(41), prim.int))), prim.int),
            leaf(ExprKind::Const(id), prim.int),
        ];
        let (rewritten, changed) = run_on_group(group, &program);
        assert!(changed);
        assert_eq!(rewritten.len(), 1);
        assert!(matches!(rewritten[0].kind, ExprKind::LitInt(41)));
    }

    #[test]
    fn multi_use_non_cheap_const_is_kept() {
        let mut program = Program::new();
        let prim = register_intrinsics(&mut program);
        let concat = program.funcs_named("__op_plus").iter().copied().find(|f| program.func_decl(*f).input.arity() == 2 && program.func_decl(*f).input.0[0] == prim.string).unwrap();
        let mut consts = ConstDeclTable::new();
        let id = consts.declare_local("x".to_string(), prim.string);

        let group = vec![
            leaf(
                ExprKind::Assign(
                    id,
                    Box::new(leaf(
                        ExprKind::Call {
                            func: concat,
                            args: vec![
                                leaf(ExprKind::LitString(program.interner_mut().intern("a")), prim.string),
                                leaf(ExprKind::LitString(program.interner_mut().intern("b")), prim.string),
                            ],
                            mode: novus_ir::CallMode::Normal,
                        },
                        prim.string,
                    )),
                ),
                prim.string,
            ),
            leaf(ExprKind::Const(id), prim.string),
            leaf(ExprKind::Const(id), prim.string),
        ];
        let (rewritten, changed) = run_on_group(group, &program);
        assert!(!changed);
        assert_eq!(rewritten.len(), 3);
    }
}
