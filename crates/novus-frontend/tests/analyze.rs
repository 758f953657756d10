//! End-to-end `analyze` scenarios, each asserting the exact IR shape a
//! single source produces before any optimization runs.

use novus_common::SourceTable;
use novus_ir::{ExprKind, FuncKind, TypeKind};

fn analyze_ok(text: &str) -> novus_ir::Program {
    let mut sources = SourceTable::new();
    let main = sources.add("main".into(), None, text.to_string());
    match novus_frontend::analyze(&mut sources, &[main]) {
        Ok(program) => program,
        Err(diags) => panic!("expected a clean analysis, got diagnostics: {:?}", diags.iter().map(|d| d.message()).collect::<Vec<_>>()),
    }
}

#[test]
fn one_plus_two_calls_the_builtin_plus_operator() {
    let program = analyze_ok("fun f() -> int 1 + 2");
    let fid = program.funcs_named("f")[0];
    let def = program.func_def(fid).expect("f is defined");
    let ExprKind::Call { func, args, .. } = &def.body.kind else {
        panic!("expected a Call node, got {:?}", def.body.kind);
    };
    assert_eq!(program.func_decl(*func).name, "__op_plus");
    assert!(matches!(program.func_decl(*func).kind, FuncKind::Intrinsic(_)));
    assert_eq!(args.len(), 2);
    assert!(matches!(args[0].kind, ExprKind::LitInt(1)));
    assert!(matches!(args[1].kind, ExprKind::LitInt(2)));
}

#[test]
fn enum_entries_get_explicit_and_implied_successor_values() {
    let program = analyze_ok("enum E = a : 42, b : -1337, c");
    let id = program.find_type_by_name("E").expect("E is declared");
    let TypeKind::Enum(def) = &program.type_info(id).kind else {
        panic!("expected an enum");
    };
    assert_eq!(def.value_of("a"), Some(42));
    assert_eq!(def.value_of("b"), Some(-1337));
    assert_eq!(def.value_of("c"), Some(-1336));
}

#[test]
fn struct_fields_keep_declaration_order() {
    let program = analyze_ok("struct S = int a, bool b");
    let id = program.find_type_by_name("S").expect("S is declared");
    let TypeKind::Struct(def) = &program.type_info(id).kind else {
        panic!("expected a struct");
    };
    let names: Vec<&str> = def.fields.iter().map(|(name, _, _)| name).collect();
    assert_eq!(names, vec!["a", "b"]);
    let (_, a_ty) = def.fields.get("a").unwrap();
    assert_eq!(program.type_info(a_ty).name, "int");
    let (_, b_ty) = def.fields.get("b").unwrap();
    assert_eq!(program.type_info(b_ty).name, "bool");
}

#[test]
fn struct_construction_then_field_access_lowers_to_call_then_field() {
    let program = analyze_ok("struct S = int a, bool b\nfun f() -> int S(1, true).a");
    let fid = program.funcs_named("f")[0];
    let def = program.func_def(fid).expect("f is defined");
    let ExprKind::Field(target, field_id) = &def.body.kind else {
        panic!("expected a Field node, got {:?}", def.body.kind);
    };
    let struct_id = program.find_type_by_name("S").unwrap();
    let TypeKind::Struct(struct_def) = &program.type_info(struct_id).kind else {
        unreachable!()
    };
    assert_eq!(*field_id, struct_def.fields.get("a").unwrap().0);
    let ExprKind::Call { func, args, .. } = &target.kind else {
        panic!("expected a Call node under the Field, got {:?}", target.kind);
    };
    assert!(matches!(program.func_decl(*func).kind, FuncKind::MakeStruct));
    assert_eq!(args.len(), 2);
}

#[test]
fn union_member_check_lowers_to_union_check() {
    let program = analyze_ok("union U = int, float\nfun f(U u) -> bool u is int");
    let fid = program.funcs_named("f")[0];
    let def = program.func_def(fid).expect("f is defined");
    assert!(matches!(def.body.kind, ExprKind::UnionCheck(_, _)));
}

#[test]
fn union_downcast_then_conditional_lowers_to_union_get_then_switch() {
    let program = analyze_ok("union U = int, float\nfun f(U u) -> bool u as int i ? i == 0 : false");
    let fid = program.funcs_named("f")[0];
    let def = program.func_def(fid).expect("f is defined");
    let ExprKind::Switch { conditions, branches } = &def.body.kind else {
        panic!("expected a Switch node, got {:?}", def.body.kind);
    };
    assert_eq!(conditions.len(), 1);
    assert_eq!(branches.len(), 2);
    assert!(matches!(conditions[0].kind, ExprKind::UnionGet(_, _, _)));
}

#[test]
fn omitted_optional_argument_is_patched_in_from_the_initializer() {
    let program = analyze_ok("fun f(int a = 0) -> int a\nfun g() -> int f()");
    let g = program.funcs_named("g")[0];
    let g_def = program.func_def(g).expect("g is defined");
    let ExprKind::Call { func, args, .. } = &g_def.body.kind else {
        panic!("expected a Call node, got {:?}", g_def.body.kind);
    };
    assert_eq!(program.func_decl(*func).name, "f");
    assert_eq!(args.len(), 1);
    assert!(matches!(args[0].kind, ExprKind::LitInt(0)));
}

#[test]
fn call_dyn_on_a_function_literal_is_preserved_pre_optimization() {
    let program = analyze_ok("fun f1() -> int 42\nfun f2() -> int (f1)()");
    let f2 = program.funcs_named("f2")[0];
    let def = program.func_def(f2).expect("f2 is defined");
    let ExprKind::CallDyn { lhs, args, .. } = &def.body.kind else {
        panic!("expected a CallDyn node, got {:?}", def.body.kind);
    };
    assert!(args.is_empty());
    assert!(matches!(lhs.kind, ExprKind::LitFunc(_)));
}

#[test]
fn cyclic_struct_is_rejected() {
    let mut sources = SourceTable::new();
    let main = sources.add("main".into(), None, "struct A = B b\nstruct B = A a".to_string());
    let err = novus_frontend::analyze(&mut sources, &[main]).expect_err("a direct struct cycle must be rejected");
    assert!(err.iter().any(|d| matches!(d.kind, novus_common::DiagnosticKind::CyclicStruct { .. })));
}

#[test]
fn syntax_error_is_reported_without_panicking() {
    let mut sources = SourceTable::new();
    let main = sources.add("main".into(), None, "fun f() -> int +".to_string());
    let err = novus_frontend::analyze(&mut sources, &[main]).expect_err("malformed source must fail analysis");
    assert!(!err.is_empty());
}
