//! Literal precomputation (spec §4.5, point 3): folds calls to pure
//! intrinsics with all-literal arguments, collapses no-op conversions,
//! prunes `Switch`es on literal conditions, collapses struct-construct +
//! immediate-field-read, turns `CallDyn` on a known target into a direct
//! `Call`, and collapses `lazy_get` of a freshly constructed lazy value.

use novus_ir::{CallMode, Expr, ExprKind, FuncKind, IntrinsicOp, Program, TypeKind};

fn eval_intrinsic(op: IntrinsicOp, args: &[ExprKind], program: &mut Program) -> Option<ExprKind> {
    use ExprKind::*;
    use IntrinsicOp::*;
    match (op, args) {
        (AddInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a.wrapping_add(*b))),
        (SubInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a.wrapping_sub(*b))),
        (MulInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a.wrapping_mul(*b))),
        (NegateInt, [LitInt(a)]) => Some(LitInt(a.wrapping_neg())),
        (IncrementInt, [LitInt(a)]) => Some(LitInt(a.wrapping_add(1))),
        (DecrementInt, [LitInt(a)]) => Some(LitInt(a.wrapping_sub(1))),
        (ShiftLeftInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a.wrapping_shl(*b as u32))),
        (ShiftRightInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a.wrapping_shr(*b as u32))),
        (AndInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a & b)),
        (OrInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a | b)),
        (XorInt, [LitInt(a), LitInt(b)]) => Some(LitInt(a ^ b)),
        (InvInt, [LitInt(a)]) => Some(LitInt(!a)),
        (CheckEqInt, [LitInt(a), LitInt(b)]) => Some(LitBool(a == b)),
        (CheckNEqInt, [LitInt(a), LitInt(b)]) => Some(LitBool(a != b)),
        (CheckLeInt, [LitInt(a), LitInt(b)]) => Some(LitBool(a < b)),
        (CheckLeEqInt, [LitInt(a), LitInt(b)]) => Some(LitBool(a <= b)),
        (CheckGtInt, [LitInt(a), LitInt(b)]) => Some(LitBool(a > b)),
        (CheckGtEqInt, [LitInt(a), LitInt(b)]) => Some(LitBool(a >= b)),

        (ConvIntLong, [LitInt(a)]) => Some(LitLong(*a)),
        (ConvCharLong, [LitChar(a)]) => Some(LitLong(*a as i64)),
        (ConvIntFloat, [LitInt(a)]) => Some(LitFloat(*a as f64)),
        (ConvIntChar, [LitInt(a)]) => u32::try_from(*a).ok().and_then(char::from_u32).map(LitChar),
        (ConvIntString, [LitInt(a)]) => Some(LitString(program.interner_mut().intern(&a.to_string()))),

        (AddFloat, [LitFloat(a), LitFloat(b)]) => Some(LitFloat(a + b)),
        (SubFloat, [LitFloat(a), LitFloat(b)]) => Some(LitFloat(a - b)),
        (MulFloat, [LitFloat(a), LitFloat(b)]) => Some(LitFloat(a * b)),
        (NegateFloat, [LitFloat(a)]) => Some(LitFloat(-a)),
        (PowFloat, [LitFloat(a), LitFloat(b)]) => Some(LitFloat(a.powf(*b))),
        (SqrtFloat, [LitFloat(a)]) => Some(LitFloat(a.sqrt())),
        (SinFloat, [LitFloat(a)]) => Some(LitFloat(a.sin())),
        (CosFloat, [LitFloat(a)]) => Some(LitFloat(a.cos())),
        (TanFloat, [LitFloat(a)]) => Some(LitFloat(a.tan())),
        (ASinFloat, [LitFloat(a)]) => Some(LitFloat(a.asin())),
        (ACosFloat, [LitFloat(a)]) => Some(LitFloat(a.acos())),
        (ATanFloat, [LitFloat(a)]) => Some(LitFloat(a.atan())),
        (ATan2Float, [LitFloat(a), LitFloat(b)]) => Some(LitFloat(a.atan2(*b))),
        (CheckEqFloat, [LitFloat(a), LitFloat(b)]) => Some(LitBool(a == b)),
        (CheckNEqFloat, [LitFloat(a), LitFloat(b)]) => Some(LitBool(a != b)),
        (CheckLeFloat, [LitFloat(a), LitFloat(b)]) => Some(LitBool(a < b)),
        (CheckLeEqFloat, [LitFloat(a), LitFloat(b)]) => Some(LitBool(a <= b)),
        (CheckGtFloat, [LitFloat(a), LitFloat(b)]) => Some(LitBool(a > b)),
        (CheckGtEqFloat, [LitFloat(a), LitFloat(b)]) => Some(LitBool(a >= b)),

        (AndBool, [LitBool(a), LitBool(b)]) => Some(LitBool(*a && *b)),
        (OrBool, [LitBool(a), LitBool(b)]) => Some(LitBool(*a || *b)),
        (InvBool, [LitBool(a)]) => Some(LitBool(!a)),
        (CheckEqBool, [LitBool(a), LitBool(b)]) => Some(LitBool(a == b)),
        (CheckNEqBool, [LitBool(a), LitBool(b)]) => Some(LitBool(a != b)),

        (CheckEqChar, [LitChar(a), LitChar(b)]) => Some(LitBool(a == b)),
        (CheckNEqChar, [LitChar(a), LitChar(b)]) => Some(LitBool(a != b)),

        _ => None,
    }
}

fn fold_switch(conditions: Vec<Expr>, branches: Vec<Expr>, ty: novus_ir::TypeId, source: Option<novus_common::SourceId>) -> (Expr, bool) {
    let mut new_conditions = Vec::new();
    let mut new_branches = Vec::new();
    let mut changed = false;

    for (i, cond) in conditions.into_iter().enumerate() {
        match cond.kind {
            ExprKind::LitBool(true) => return (branches[i].clone(), true),
            ExprKind::LitBool(false) => changed = true,
            _ => {
                new_conditions.push(cond);
                new_branches.push(branches[i].clone());
            }
        }
    }
    new_branches.push(branches[branches.len() - 1].clone());

    if new_conditions.is_empty() {
        return (new_branches.pop().expect("else branch always present"), true);
    }
    (Expr::new(ExprKind::Switch { conditions: new_conditions, branches: new_branches }, ty, source), changed)
}

/// Bottom-up fold of a single expression tree.
pub fn run(expr: Expr, program: &mut Program) -> (Expr, bool) {
    let Expr { kind, ty, source } = expr;
    let (kind, mut changed) = fold_children(kind, program);

    match kind {
        ExprKind::Call { func, args, mode } if mode == CallMode::Normal => {
            if let FuncKind::Intrinsic(op) = program.func_decl(func).kind {
                if op.is_precomputable() {
                    let arg_kinds: Vec<ExprKind> = args.iter().map(|a| a.kind.clone()).collect();
                    if let Some(folded) = eval_intrinsic(op, &arg_kinds, program) {
                        return (Expr::new(folded, ty, source), true);
                    }
                }
            }
            if program.func_decl(func).kind == FuncKind::NoOp {
                if let [only] = args.as_slice() {
                    if only.ty == ty {
                        return (only.clone(), true);
                    }
                }
            }
            if program.func_decl(func).kind == FuncKind::LazyGet {
                if let [Expr { kind: ExprKind::Call { func: inner_func, args: inner_args, mode: CallMode::Lazy }, .. }] =
                    args.as_slice()
                {
                    let collapsed = Expr::new(
                        ExprKind::Call { func: *inner_func, args: inner_args.clone(), mode: CallMode::Normal },
                        ty,
                        source,
                    );
                    return (collapsed, true);
                }
            }
            (Expr::new(ExprKind::Call { func, args, mode }, ty, source), changed)
        }
        ExprKind::Field(target, field_id) => {
            if let ExprKind::Call { func, args, mode: CallMode::Normal } = &target.kind {
                if program.func_decl(*func).kind == FuncKind::MakeStruct {
                    if let TypeKind::Struct(def) = &program.type_info(target.ty).kind {
                        if let Some(pos) = def.fields.position_of(field_id) {
                            return (args[pos].clone(), true);
                        }
                    }
                }
            }
            (Expr::new(ExprKind::Field(target, field_id), ty, source), changed)
        }
        ExprKind::CallDyn { lhs, args, fork } => {
            let Expr { kind: lhs_kind, ty: lhs_ty, source: lhs_source } = *lhs;
            match lhs_kind {
                ExprKind::LitFunc(func) => {
                    let mode = if fork { CallMode::Fork } else { CallMode::Normal };
                    (Expr::new(ExprKind::Call { func, args, mode }, ty, source), true)
                }
                ExprKind::Closure { func, bound_args } => {
                    let mode = if fork { CallMode::Fork } else { CallMode::Normal };
                    let all_args: Vec<Expr> = args.into_iter().chain(bound_args).collect();
                    (Expr::new(ExprKind::Call { func, args: all_args, mode }, ty, source), true)
                }
                other => {
                    let lhs = Box::new(Expr::new(other, lhs_ty, lhs_source));
                    (Expr::new(ExprKind::CallDyn { lhs, args, fork }, ty, source), changed)
                }
            }
        }
        ExprKind::Switch { conditions, branches } => {
            let (folded, switch_changed) = fold_switch(conditions, branches, ty, source);
            (folded, changed || switch_changed)
        }
        other => (Expr::new(other, ty, source), changed),
    }
}

fn fold_children(kind: ExprKind, program: &mut Program) -> (ExprKind, bool) {
    let mut changed = false;
    let mut fold_one = |e: Expr, program: &mut Program| {
        let (e2, c) = run(e, program);
        changed |= c;
        e2
    };
    let kind = match kind {
        ExprKind::Assign(id, rhs) => ExprKind::Assign(id, Box::new(fold_one(*rhs, program))),
        ExprKind::Group(items) => ExprKind::Group(items.into_iter().map(|e| fold_one(e, program)).collect()),
        ExprKind::Call { func, args, mode } => {
            ExprKind::Call { func, args: args.into_iter().map(|e| fold_one(e, program)).collect(), mode }
        }
        ExprKind::CallDyn { lhs, args, fork } => ExprKind::CallDyn {
            lhs: Box::new(fold_one(*lhs, program)),
            args: args.into_iter().map(|e| fold_one(e, program)).collect(),
            fork,
        },
        ExprKind::CallSelf { args } => ExprKind::CallSelf { args: args.into_iter().map(|e| fold_one(e, program)).collect() },
        ExprKind::Field(target, fid) => ExprKind::Field(Box::new(fold_one(*target, program)), fid),
        ExprKind::UnionCheck(target, ty) => ExprKind::UnionCheck(Box::new(fold_one(*target, program)), ty),
        ExprKind::UnionGet(target, ty, cid) => ExprKind::UnionGet(Box::new(fold_one(*target, program)), ty, cid),
        ExprKind::Switch { conditions, branches } => ExprKind::Switch {
            conditions: conditions.into_iter().map(|e| fold_one(e, program)).collect(),
            branches: branches.into_iter().map(|e| fold_one(e, program)).collect(),
        },
        ExprKind::Closure { func, bound_args } => {
            ExprKind::Closure { func, bound_args: bound_args.into_iter().map(|e| fold_one(e, program)).collect() }
        }
        leaf => leaf,
    };
    (kind, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use novus_ir::{register_intrinsics, CallMode};

    #[test]
    fn literal_addition_folds_to_a_literal() {
        let mut program = Program::new();
        let prim = register_intrinsics(&mut program);
        let plus = program
            .funcs_named("__op_plus")
            .iter()
            .copied()
            .find(|f| program.func_decl(*f).input.0 == vec![prim.int, prim.int])
            .unwrap();
        let call = Expr::new(
            ExprKind::Call {
                func: plus,
                args: vec![Expr::new(ExprKind::LitInt(1), prim.int, None), Expr::new(ExprKind::LitInt(2), prim.int, None)],
                mode: CallMode::Normal,
            },
            prim.int,
            None,
        );
        let (folded, changed) = run(call, &mut program);
        assert!(changed);
        assert!(matches!(folded.kind, ExprKind::LitInt(3)));
    }

    #[test]
    fn division_is_never_folded() {
        let mut program = Program::new();
        let prim = register_intrinsics(&mut program);
        let div = program
            .funcs_named("__op_slash")
            .iter()
            .copied()
            .find(|f| program.func_decl(*f).input.0 == vec![prim.int, prim.int])
            .unwrap();
        let call = Expr::new(
            ExprKind::Call {
                func: div,
                args: vec![Expr::new(ExprKind::LitInt(4), prim.int, None), Expr::new(ExprKind::LitInt(0), prim.int, None)],
                mode: CallMode::Normal,
            },
            prim.int,
            None,
        );
        let (folded, changed) = run(call, &mut program);
        assert!(!changed);
        assert!(matches!(folded.kind, ExprKind::Call { .. }));
    }
}
