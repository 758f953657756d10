//! Built-in type and operator registration.
//!
//! Ported from `examples/original_source/src/prog/intrinsics.cpp`'s
//! `registerIntrinsics()`, which registers the `int`/`bool` primitive types
//! and their always-available operators directly into the func table under
//! the operator's fixed `__op_*` name (so a user-defined overload of the
//! same operator for a user type competes in the same overload-resolution
//! pass, spec §4.7). Extended here to the other primitive types
//! (`long`, `float`, `char`, `string`) the backend's opcode set (spec
//! §4.6) requires, following the same per-type registration shape.

use novus_lexer::Operator;

use crate::func::{FuncDecl, FuncKind, IntrinsicOp};
use crate::ids::TypeId;
use crate::program::Program;
use crate::tables::TypeSet;
use crate::types::TypeKind;

/// The primitive `TypeId`s every program starts with.
pub struct Primitives {
    pub int: TypeId,
    pub long: TypeId,
    pub float: TypeId,
    pub bool_: TypeId,
    pub char: TypeId,
    pub string: TypeId,
}

fn register_unary(program: &mut Program, op: Operator, input: TypeId, output: TypeId, intrinsic: IntrinsicOp) {
    program.declare_func(|id| FuncDecl {
        id,
        name: op.func_name().to_string(),
        kind: FuncKind::Intrinsic(intrinsic),
        input: TypeSet::new(vec![input]),
        output,
        opt_input_count: 0,
        is_implicit_conv: false,
        is_action: false,
    });
}

fn register_binary(
    program: &mut Program,
    op: Operator,
    lhs: TypeId,
    rhs: TypeId,
    output: TypeId,
    intrinsic: IntrinsicOp,
) {
    program.declare_func(|id| FuncDecl {
        id,
        name: op.func_name().to_string(),
        kind: FuncKind::Intrinsic(intrinsic),
        input: TypeSet::new(vec![lhs, rhs]),
        output,
        opt_input_count: 0,
        is_implicit_conv: false,
        is_action: false,
    });
}

/// `print`'s declared return type is `int`, matching the original `print`
/// action's signature — the source language never threads a dedicated
/// `void`/unit type through action return types.
fn register_action(program: &mut Program, name: &str, input: Vec<TypeId>, output: TypeId) {
    program.declare_func(|id| FuncDecl {
        id,
        name: name.to_string(),
        kind: FuncKind::Intrinsic(IntrinsicOp::PlatformCall(0)),
        input: TypeSet::new(input),
        output,
        opt_input_count: 0,
        is_implicit_conv: false,
        is_action: true,
    });
}

/// Registers the primitive types and their built-in operators/actions.
/// Mirrors `registerIntrinsics()` for `int`/`bool`; extends the same
/// pattern to `long`/`float`/`char`/`string`.
pub fn register_intrinsics(program: &mut Program) -> Primitives {
    use IntrinsicOp::*;

    let int = program.declare_type("int".to_string(), TypeKind::Int);
    let long = program.declare_type("long".to_string(), TypeKind::Long);
    let float = program.declare_type("float".to_string(), TypeKind::Float);
    let bool_ = program.declare_type("bool".to_string(), TypeKind::Bool);
    let char_ = program.declare_type("char".to_string(), TypeKind::Char);
    let string = program.declare_type("string".to_string(), TypeKind::String);

    register_unary(program, Operator::Minus, int, int, NegateInt);
    register_binary(program, Operator::Minus, int, int, int, SubInt);
    register_binary(program, Operator::Plus, int, int, int, AddInt);
    register_binary(program, Operator::Star, int, int, int, MulInt);
    register_binary(program, Operator::Slash, int, int, int, DivInt);
    register_binary(program, Operator::Rem, int, int, int, RemInt);
    register_binary(program, Operator::Amp, int, int, int, AndInt);
    register_binary(program, Operator::Pipe, int, int, int, OrInt);
    register_binary(program, Operator::ShiftL, int, int, int, ShiftLeftInt);
    register_binary(program, Operator::ShiftR, int, int, int, ShiftRightInt);
    register_binary(program, Operator::Hat, int, int, int, XorInt);
    register_unary(program, Operator::Tilde, int, int, InvInt);
    register_unary(program, Operator::PlusPlus, int, int, IncrementInt);
    register_unary(program, Operator::MinusMinus, int, int, DecrementInt);
    register_binary(program, Operator::EqEq, int, int, bool_, CheckEqInt);
    register_binary(program, Operator::BangEq, int, int, bool_, CheckNEqInt);
    register_binary(program, Operator::Le, int, int, bool_, CheckLeInt);
    register_binary(program, Operator::LeEq, int, int, bool_, CheckLeEqInt);
    register_binary(program, Operator::Gt, int, int, bool_, CheckGtInt);
    register_binary(program, Operator::GtEq, int, int, bool_, CheckGtEqInt);

    register_unary(program, Operator::Minus, long, long, NegateLong);
    register_binary(program, Operator::Minus, long, long, long, SubLong);
    register_binary(program, Operator::Plus, long, long, long, AddLong);
    register_binary(program, Operator::Star, long, long, long, MulLong);
    register_binary(program, Operator::Slash, long, long, long, DivLong);
    register_binary(program, Operator::Rem, long, long, long, RemLong);
    register_binary(program, Operator::EqEq, long, long, bool_, CheckEqLong);
    register_binary(program, Operator::BangEq, long, long, bool_, CheckNEqLong);
    register_binary(program, Operator::Le, long, long, bool_, CheckLeLong);
    register_binary(program, Operator::LeEq, long, long, bool_, CheckLeEqLong);
    register_binary(program, Operator::Gt, long, long, bool_, CheckGtLong);
    register_binary(program, Operator::GtEq, long, long, bool_, CheckGtEqLong);

    register_unary(program, Operator::Minus, float, float, NegateFloat);
    register_binary(program, Operator::Minus, float, float, float, SubFloat);
    register_binary(program, Operator::Plus, float, float, float, AddFloat);
    register_binary(program, Operator::Star, float, float, float, MulFloat);
    register_binary(program, Operator::Slash, float, float, float, DivFloat);
    register_binary(program, Operator::EqEq, float, float, bool_, CheckEqFloat);
    register_binary(program, Operator::BangEq, float, float, bool_, CheckNEqFloat);
    register_binary(program, Operator::Le, float, float, bool_, CheckLeFloat);
    register_binary(program, Operator::LeEq, float, float, bool_, CheckLeEqFloat);
    register_binary(program, Operator::Gt, float, float, bool_, CheckGtFloat);
    register_binary(program, Operator::GtEq, float, float, bool_, CheckGtEqFloat);

    register_unary(program, Operator::Bang, bool_, bool_, InvBool);
    register_binary(program, Operator::EqEq, bool_, bool_, bool_, CheckEqBool);
    register_binary(program, Operator::BangEq, bool_, bool_, bool_, CheckNEqBool);
    register_binary(program, Operator::Amp, bool_, bool_, bool_, AndBool);
    register_binary(program, Operator::Pipe, bool_, bool_, bool_, OrBool);

    register_binary(program, Operator::EqEq, char_, char_, bool_, CheckEqChar);
    register_binary(program, Operator::BangEq, char_, char_, bool_, CheckNEqChar);

    register_binary(program, Operator::Plus, string, string, string, AddString);
    register_binary(program, Operator::EqEq, string, string, bool_, CheckEqString);
    register_binary(program, Operator::BangEq, string, string, bool_, CheckNEqString);
    register_binary(program, Operator::SquareSquare, string, int, char_, IndexString);

    register_action(program, "print", vec![int], int);
    register_action(program, "print", vec![bool_], int);
    register_action(program, "print", vec![string], int);

    Primitives {
        int,
        long,
        float,
        bool_,
        char: char_,
        string,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_plus_is_registered_under_fixed_operator_name() {
        let mut program = Program::new();
        register_intrinsics(&mut program);
        let candidates = program.funcs_named("__op_plus");
        assert!(!candidates.is_empty());
    }

    #[test]
    fn print_action_has_three_overloads() {
        let mut program = Program::new();
        register_intrinsics(&mut program);
        assert_eq!(program.funcs_named("print").len(), 3);
    }
}
