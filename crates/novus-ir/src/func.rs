//! Function declarations and definitions (spec §3), and the closed set of
//! built-in operations a `FuncKind::Intrinsic` can name.

use crate::expr::Expr;
use crate::ids::{FuncId, TypeId};
use crate::tables::{ConstDeclTable, TypeSet};

/// Built-in operations, one per function the frontend registers without a
/// user-written body (spec: "`FuncKind` includes `User`, many `Intrinsic*`
/// variants ... arithmetic/bitwise/compare per numeric type, string ops,
/// conversions, reflect_*, fail, source_loc_*, lazy_get, atomic_*,
/// platform_*, etc."). Grounded on the int/bool registrations in
/// `examples/original_source/src/prog/intrinsics.cpp`, extended to the
/// other primitive types the backend's opcode set (spec §4.6) requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicOp {
    AddInt,
    SubInt,
    MulInt,
    DivInt,
    RemInt,
    NegateInt,
    IncrementInt,
    DecrementInt,
    ShiftLeftInt,
    ShiftRightInt,
    AndInt,
    OrInt,
    XorInt,
    InvInt,
    CheckEqInt,
    CheckNEqInt,
    CheckLeInt,
    CheckLeEqInt,
    CheckGtInt,
    CheckGtEqInt,

    AddLong,
    SubLong,
    MulLong,
    DivLong,
    RemLong,
    NegateLong,
    CheckEqLong,
    CheckNEqLong,
    CheckLeLong,
    CheckLeEqLong,
    CheckGtLong,
    CheckGtEqLong,

    AddFloat,
    SubFloat,
    MulFloat,
    DivFloat,
    NegateFloat,
    PowFloat,
    SqrtFloat,
    SinFloat,
    CosFloat,
    TanFloat,
    ASinFloat,
    ACosFloat,
    ATanFloat,
    ATan2Float,
    CheckEqFloat,
    CheckNEqFloat,
    CheckLeFloat,
    CheckLeEqFloat,
    CheckGtFloat,
    CheckGtEqFloat,

    AndBool,
    OrBool,
    InvBool,
    CheckEqBool,
    CheckNEqBool,

    CheckEqChar,
    CheckNEqChar,

    AddString,
    LengthString,
    IndexString,
    SliceString,
    CheckEqString,
    CheckNEqString,

    ConvIntLong,
    ConvLongInt,
    ConvIntFloat,
    ConvFloatInt,
    ConvIntChar,
    ConvCharInt,
    ConvCharLong,
    ConvIntString,
    ConvLongString,
    ConvFloatString,
    ConvBoolString,
    ConvCharString,

    ReflectTypeName,
    ReflectStructFieldCount,
    ReflectStructFieldName,
    ReflectStructFieldType,
    ReflectEnumKeys,
    ReflectEnumValues,
    ReflectIsStruct,
    ReflectIsUnion,
    ReflectIsEnum,
    ReflectIsDelegate,

    Fail,
    SourceLocFile,
    SourceLocLine,
    SourceLocColumn,
    StaticIntToInt,

    FutureWaitNano,
    FutureBlock,
    AtomicCompareSwap,
    AtomicBlock,
    AtomicLoad,

    PlatformCall(u8),
}

/// Whether evaluating this intrinsic can be precomputed at compile time
/// given literal arguments (spec §4.5 literal-precomputation pass). Traps
/// (division/remainder by zero) are excluded deliberately: those must
/// reach the runtime `Fail` opcode, not be folded away.
impl IntrinsicOp {
    pub fn is_precomputable(self) -> bool {
        use IntrinsicOp::*;
        matches!(
            self,
            AddInt
                | SubInt
                | MulInt
                | NegateInt
                | IncrementInt
                | DecrementInt
                | ShiftLeftInt
                | ShiftRightInt
                | AndInt
                | OrInt
                | XorInt
                | InvInt
                | CheckEqInt
                | CheckNEqInt
                | CheckLeInt
                | CheckLeEqInt
                | CheckGtInt
                | CheckGtEqInt
                | ConvIntLong
                | ConvCharLong
                | ConvIntFloat
                | ConvIntString
                | ConvIntChar
                | AddFloat
                | SubFloat
                | MulFloat
                | NegateFloat
                | PowFloat
                | SqrtFloat
                | SinFloat
                | CosFloat
                | TanFloat
                | ASinFloat
                | ACosFloat
                | ATanFloat
                | ATan2Float
                | CheckEqFloat
                | CheckNEqFloat
                | CheckLeFloat
                | CheckLeEqFloat
                | CheckGtFloat
                | CheckGtEqFloat
                | AndBool
                | OrBool
                | InvBool
                | CheckEqBool
                | CheckNEqBool
                | CheckEqChar
                | CheckNEqChar
        )
    }

    /// True for `DivInt`/`RemInt` and their float analogues, which the
    /// optimizer must leave alone when the divisor is a literal zero so the
    /// runtime trap still fires (spec §4.5).
    pub fn is_divide_like(self) -> bool {
        matches!(self, IntrinsicOp::DivInt | IntrinsicOp::RemInt | IntrinsicOp::DivFloat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncKind {
    User,
    Intrinsic(IntrinsicOp),
    MakeStruct,
    LazyGet,
    /// A reinterpret-style conversion where the source and destination
    /// representations coincide (spec §4.5: "`NoOp` conversions where
    /// source and destination types match collapse to the argument").
    NoOp,
}

/// `{FuncId, name, FuncKind, TypeSet input, TypeId output, optInputCount,
/// isImplicitConv, isAction}` (spec).
#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub id: FuncId,
    pub name: String,
    pub kind: FuncKind,
    pub input: TypeSet,
    pub output: TypeId,
    pub opt_input_count: u32,
    pub is_implicit_conv: bool,
    pub is_action: bool,
}

impl FuncDecl {
    pub fn required_input_count(&self) -> usize {
        self.input.arity() - self.opt_input_count as usize
    }
}

/// `{FuncId, ConstDeclTable consts, Expr body, [Expr] optArgInitializers}`
/// (spec). Only `User` functions have a definition; intrinsics and
/// synthetic kinds (`MakeStruct`, `LazyGet`, `NoOp`) are declared but never
/// defined — the backend knows how to emit them directly.
#[derive(Clone, Debug)]
pub struct FuncDef {
    pub id: FuncId,
    pub consts: ConstDeclTable,
    pub body: Expr,
    pub opt_arg_initializers: Vec<Expr>,
}
