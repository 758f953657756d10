//! Overload resolution (spec §4.7) and implicit-conversion lookup.

use novus_ir::{FuncDecl, FuncId, Program, TypeId};

/// Filters applied to the candidate list before counting conversions (spec
/// §4.7: "options (`ExclActions`, `ExclPureFuncs`, `ExclNonUser`,
/// `maxImplicitConvs`)").
#[derive(Clone, Copy, Debug, Default)]
pub struct OverloadOptions {
    pub excl_actions: bool,
    pub excl_pure_funcs: bool,
    pub excl_non_user: bool,
    pub max_implicit_convs: u32,
}

pub enum OverloadResult {
    Found(FuncId),
    Ambiguous,
    NoMatch,
}

/// `findImplicitConv(S, T)`: a user function named `T` with input `(S)`
/// marked `implicit` (spec §4.7: "a cheap table lookup").
pub fn find_implicit_conv(program: &Program, from: TypeId, to: TypeId) -> Option<FuncId> {
    let to_name = program.type_info(to).name.clone();
    program
        .funcs_named(&to_name)
        .iter()
        .copied()
        .find(|&id| {
            let decl = program.func_decl(id);
            decl.is_implicit_conv && decl.input.arity() == 1 && decl.input.0[0] == from
        })
}

/// Minimum implicit conversions needed to call `decl` with `args`, or
/// `None` if arity mismatches or some argument has no conversion path
/// (spec §4.7: "count the minimum implicit conversions required per
/// argument slot (0 if exact match, 1 if a conversion exists, else
/// reject)").
fn conversion_cost(program: &Program, decl: &FuncDecl, args: &[TypeId], max_convs: u32) -> Option<u32> {
    if args.len() < decl.required_input_count() || args.len() > decl.input.arity() {
        return None;
    }
    let mut cost = 0u32;
    for (arg_ty, param_ty) in args.iter().zip(decl.input.0.iter()) {
        if arg_ty == param_ty {
            continue;
        }
        if find_implicit_conv(program, *arg_ty, *param_ty).is_some() {
            cost += 1;
            if cost > max_convs.max(1) {
                return None;
            }
        } else {
            return None;
        }
    }
    Some(cost)
}

/// Pick the candidate from `names` with the fewest implicit conversions;
/// ties are ambiguous (spec §4.7: "if two candidates tie on conversion
/// count, resolution is ambiguous").
pub fn resolve_overload(program: &Program, candidates: &[FuncId], args: &[TypeId], opts: OverloadOptions) -> OverloadResult {
    let max_convs = if opts.max_implicit_convs == 0 { 1 } else { opts.max_implicit_convs };

    let mut best: Option<(FuncId, u32)> = None;
    let mut tied = false;

    for &id in candidates {
        let decl = program.func_decl(id);
        if opts.excl_actions && decl.is_action {
            continue;
        }
        if opts.excl_pure_funcs && !decl.is_action {
            continue;
        }
        if opts.excl_non_user && !matches!(decl.kind, novus_ir::FuncKind::User) {
            continue;
        }
        let Some(cost) = conversion_cost(program, decl, args, max_convs) else {
            continue;
        };
        match best {
            None => best = Some((id, cost)),
            Some((_, best_cost)) if cost < best_cost => {
                best = Some((id, cost));
                tied = false;
            }
            Some((_, best_cost)) if cost == best_cost => tied = true,
            _ => {}
        }
    }

    match best {
        Some((id, _)) if !tied => OverloadResult::Found(id),
        Some(_) => OverloadResult::Ambiguous,
        None => OverloadResult::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novus_ir::{FuncKind, TypeKind, TypeSet};

    fn make_func(program: &mut Program, name: &str, input: Vec<TypeId>, output: TypeId, is_implicit_conv: bool) -> FuncId {
        program.declare_func(|id| FuncDecl {
            id,
            name: name.to_string(),
            kind: FuncKind::User,
            input: TypeSet::new(input),
            output,
            opt_input_count: 0,
            is_implicit_conv,
            is_action: false,
        })
    }

    #[test]
    fn exact_match_wins_over_conversion() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".into(), TypeKind::Int);
        let float_ty = program.declare_type("float".into(), TypeKind::Float);
        make_func(&mut program, "__op_plus", vec![float_ty, float_ty], float_ty, false);
        let to_float = make_func(&mut program, "float", vec![int_ty], float_ty, true);
        let _ = to_float;
        let exact = make_func(&mut program, "__op_plus", vec![int_ty, int_ty], int_ty, false);

        let candidates = program.funcs_named("__op_plus").to_vec();
        let result = resolve_overload(&program, &candidates, &[int_ty, int_ty], OverloadOptions::default());
        match result {
            OverloadResult::Found(id) => assert_eq!(id, exact),
            _ => panic!("expected exact match to win"),
        }
    }

    #[test]
    fn implicit_conversion_lookup_finds_marked_function() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".into(), TypeKind::Int);
        let float_ty = program.declare_type("float".into(), TypeKind::Float);
        let conv = make_func(&mut program, "float", vec![int_ty], float_ty, true);
        assert_eq!(find_implicit_conv(&program, int_ty, float_ty), Some(conv));
        assert_eq!(find_implicit_conv(&program, float_ty, int_ty), None);
    }

    #[test]
    fn no_candidate_matches_arity_is_no_match() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".into(), TypeKind::Int);
        make_func(&mut program, "f", vec![int_ty], int_ty, false);
        let candidates = program.funcs_named("f").to_vec();
        let result = resolve_overload(&program, &candidates, &[], OverloadOptions::default());
        assert!(matches!(result, OverloadResult::NoMatch));
    }
}
