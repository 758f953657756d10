//! End-to-end optimizer scenarios: analyze a real source, then optimize it,
//! and assert on the resulting IR shape (spec §8's "folds to litInt(3)"
//! class of testable properties).

use novus_common::SourceTable;
use novus_ir::ExprKind;

fn optimized(text: &str) -> novus_ir::Program {
    let mut sources = SourceTable::new();
    let main = sources.add("main".into(), None, text.to_string());
    let program = novus_frontend::analyze(&mut sources, &[main]).expect("clean analysis");
    novus_optimizer::optimize(program)
}

#[test]
fn one_plus_two_folds_to_a_literal() {
    let program = optimized("fun f() -> int 1 + 2\nf()");
    let f = program.funcs_named("f")[0];
    let def = program.func_def(f).expect("f survives tree-shake");
    assert!(matches!(def.body.kind, ExprKind::LitInt(3)), "got {:?}", def.body.kind);
}

#[test]
fn struct_field_read_folds_to_the_initializer() {
    let program = optimized("struct S = int a, bool b\nfun f() -> int S(1, true).a\nf()");
    let f = program.funcs_named("f")[0];
    let def = program.func_def(f).expect("f survives tree-shake");
    assert!(matches!(def.body.kind, ExprKind::LitInt(1)), "got {:?}", def.body.kind);
}

/// Spec §8 scenario 6 describes the intermediate state right after the
/// `CallDyn`-on-a-function-literal rule fires: `Call(f1)`. A full
/// `optimize()` run then keeps going per point 4 (call-inline is also
/// "non-recursive user calls", which `f1` is) and inlines that call too,
/// converging on the literal `f1` returns.
#[test]
fn call_dyn_on_a_function_literal_is_collapsed_and_then_inlined() {
    let program = optimized("fun f1() -> int 42\nfun f2() -> int (f1)()\nf2()");
    let f2 = program.funcs_named("f2")[0];
    let def = program.func_def(f2).expect("f2 survives tree-shake");
    // f1 takes no arguments, so inlining its body needs no pre-assignment
    // prelude and splices the body in directly rather than wrapping a
    // singleton Group around it.
    assert!(matches!(def.body.kind, ExprKind::LitInt(42)), "got {:?}", def.body.kind);
}

#[test]
fn unreferenced_function_does_not_survive_optimization() {
    let program = optimized("fun unused() -> int 1\nfun f() -> int 2\nf()");
    assert!(program.funcs_named("unused").iter().all(|fid| program.func_def(*fid).is_none()));
}
