use super::*;
use crate::node::{ExprKind, ItemKind};

fn parse_one_item(src: &str) -> Item {
    let mut parser = Parser::new(src);
    parser.next_item().expect("expected at least one item")
}

fn parse_expr(src: &str) -> Expr {
    let mut parser = Parser::new(src);
    parser.next_expr()
}

#[test]
fn parses_simple_func_decl() {
    let item = parse_one_item("fun f() -> int 1");
    match item.kind {
        ItemKind::Func { name, params, ret, is_action, body, .. } => {
            assert_eq!(name, "f");
            assert!(params.is_empty());
            assert_eq!(ret.unwrap().name, "int");
            assert!(!is_action);
            assert!(matches!(body.kind, ExprKind::LitInt(1)));
        }
        other => panic!("expected func decl, got {other:?}"),
    }
}

#[test]
fn parses_action_decl_with_params() {
    let item = parse_one_item("act doIt(int a, bool b) a");
    match item.kind {
        ItemKind::Func { is_action, params, .. } => {
            assert!(is_action);
            assert_eq!(params.len(), 2);
            assert_eq!(params[0].ty.name, "int");
            assert_eq!(params[1].name, "b");
        }
        other => panic!("expected func decl, got {other:?}"),
    }
}

#[test]
fn parses_operator_overload_name() {
    let item = parse_one_item("fun +(float x, float y) -> float x");
    match item.kind {
        ItemKind::Func { name, .. } => assert_eq!(name, "__op_plus"),
        other => panic!("expected func decl, got {other:?}"),
    }
}

#[test]
fn parses_implicit_conversion_decl() {
    let item = parse_one_item("fun implicit float(int i) i");
    match item.kind {
        ItemKind::Func { name, is_implicit_conv, .. } => {
            assert_eq!(name, "float");
            assert!(is_implicit_conv);
        }
        other => panic!("expected func decl, got {other:?}"),
    }
}

#[test]
fn parses_optional_argument_default() {
    let item = parse_one_item("fun f(int a = 0) a");
    match item.kind {
        ItemKind::Func { params, .. } => {
            assert!(params[0].default.is_some());
        }
        other => panic!("expected func decl, got {other:?}"),
    }
}

#[test]
fn parses_func_template() {
    let item = parse_one_item("fun ft{T}(T a) -> T a");
    match item.kind {
        ItemKind::Func { type_params, .. } => assert_eq!(type_params, vec!["T".to_string()]),
        other => panic!("expected func decl, got {other:?}"),
    }
}

#[test]
fn parses_struct_with_fields() {
    let item = parse_one_item("struct User = string name, int age");
    match item.kind {
        ItemKind::Struct { name, fields, .. } => {
            assert_eq!(name, "User");
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].0, "name");
            assert_eq!(fields[0].1.name, "string");
        }
        other => panic!("expected struct decl, got {other:?}"),
    }
}

#[test]
fn parses_empty_struct() {
    let item = parse_one_item("struct Empty");
    match item.kind {
        ItemKind::Struct { name, fields, .. } => {
            assert_eq!(name, "Empty");
            assert!(fields.is_empty());
        }
        other => panic!("expected struct decl, got {other:?}"),
    }
}

#[test]
fn parses_templated_struct() {
    let item = parse_one_item("struct tuple{T1, T2} = T1 a, T2 b");
    match item.kind {
        ItemKind::Struct { type_params, fields, .. } => {
            assert_eq!(type_params, vec!["T1".to_string(), "T2".to_string()]);
            assert_eq!(fields.len(), 2);
        }
        other => panic!("expected struct decl, got {other:?}"),
    }
}

#[test]
fn parses_union_decl() {
    let item = parse_one_item("union Val = int, bool");
    match item.kind {
        ItemKind::Union { name, members, .. } => {
            assert_eq!(name, "Val");
            assert_eq!(members.len(), 2);
        }
        other => panic!("expected union decl, got {other:?}"),
    }
}

#[test]
fn parses_enum_with_explicit_and_implicit_values() {
    let item = parse_one_item("enum E = a : 42, b");
    match item.kind {
        ItemKind::Enum { name, entries } => {
            assert_eq!(name, "E");
            assert_eq!(entries[0], ("a".to_string(), Some(42)));
            assert_eq!(entries[1], ("b".to_string(), None));
        }
        other => panic!("expected enum decl, got {other:?}"),
    }
}

#[test]
fn parses_import_statement() {
    let item = parse_one_item("import \"other.ns\"");
    match item.kind {
        ItemKind::Import { path } => assert_eq!(path, "other.ns"),
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn parses_bare_expression_as_exec_stmt() {
    let item = parse_one_item("print(1)");
    match item.kind {
        ItemKind::Exec(expr) => assert!(matches!(expr.kind, ExprKind::Call { .. })),
        other => panic!("expected exec stmt, got {other:?}"),
    }
}

#[test]
fn binary_precedence_groups_multiplication_before_addition() {
    let expr = parse_expr("1 + 2 * 3");
    match expr.kind {
        ExprKind::Binary { op, rhs, .. } => {
            assert_eq!(op, novus_lexer::Operator::Plus);
            assert!(matches!(rhs.kind, ExprKind::Binary { op: novus_lexer::Operator::Star, .. }));
        }
        other => panic!("expected binary expr, got {other:?}"),
    }
}

#[test]
fn parses_ternary_conditional() {
    let expr = parse_expr("a != 0 ? 1 : 2");
    match expr.kind {
        ExprKind::Conditional { cond, .. } => {
            assert!(matches!(cond.kind, ExprKind::Binary { op: novus_lexer::Operator::BangEq, .. }));
        }
        other => panic!("expected conditional, got {other:?}"),
    }
}

#[test]
fn parses_if_else_switch_chain() {
    let expr = parse_expr("if true -> 1 if false -> 2 else -> 3");
    match expr.kind {
        ExprKind::Switch { conditions, branches } => {
            assert_eq!(conditions.len(), 2);
            assert_eq!(branches.len(), 3);
        }
        other => panic!("expected switch, got {other:?}"),
    }
}

#[test]
fn parses_const_decl_inside_switch_condition_group() {
    let expr = parse_expr("if (x = 1; true) -> x else -> 2");
    match expr.kind {
        ExprKind::Switch { conditions, .. } => match &conditions[0].kind {
            ExprKind::Group(elements) => {
                assert!(matches!(elements[0].kind, ExprKind::ConstDecl { .. }));
            }
            other => panic!("expected group, got {other:?}"),
        },
        other => panic!("expected switch, got {other:?}"),
    }
}

#[test]
fn parses_is_and_as_expressions() {
    let is_expr = parse_expr("v is int");
    assert!(matches!(is_expr.kind, ExprKind::Is { .. }));

    let as_expr = parse_expr("v as int i");
    match as_expr.kind {
        ExprKind::As { bind, .. } => assert_eq!(bind, Some("i".to_string())),
        other => panic!("expected as-expr, got {other:?}"),
    }
}

#[test]
fn parses_lambda_literal() {
    let expr = parse_expr("lambda (int i) i");
    match expr.kind {
        ExprKind::Lambda { params, .. } => assert_eq!(params.len(), 1),
        other => panic!("expected lambda, got {other:?}"),
    }
}

#[test]
fn parses_templated_call() {
    let expr = parse_expr("ft{int}(1)");
    match expr.kind {
        ExprKind::Call { callee, type_args, args } => {
            assert_eq!(callee, "ft");
            assert_eq!(type_args.len(), 1);
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn parses_field_and_index_postfix() {
    let expr = parse_expr("a.b[0]");
    match expr.kind {
        ExprKind::Index { target, .. } => {
            assert!(matches!(target.kind, ExprKind::Field { .. }));
        }
        other => panic!("expected index, got {other:?}"),
    }
}

#[test]
fn parses_intrinsic_call() {
    let expr = parse_expr("intrinsic{int_add_int}(a, b)");
    match expr.kind {
        ExprKind::Call { callee, args, .. } => {
            assert_eq!(callee, "intrinsic{int_add_int}");
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn syntax_error_becomes_error_item_and_resyncs() {
    let mut parser = Parser::new("struct = \n fun f() -> int 1");
    let first = parser.next_item().unwrap();
    assert!(first.is_error());
    let second = parser.next_item().unwrap();
    assert!(matches!(second.kind, ItemKind::Func { .. }));
}

#[test]
fn line_comments_are_skipped_as_trivia() {
    let item = parse_one_item("// a comment\nfun f() -> int 1");
    assert!(matches!(item.kind, ItemKind::Func { .. }));
}
