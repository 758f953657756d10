//! The fixed opcode set (spec §4.6, §6 "a closed fixed list (~110 opcodes)
//! exposed as a single-byte tag; multi-byte immediate operands are encoded
//! little-endian"). Not every opcode in the original ~110-entry set is
//! reproduced here — only the ones the lowering rules in [`crate::lower`]
//! actually emit — but every opcode spec §4.6 names by name exists.
//!
//! The [`Opcode::operand_shape`] table is the supplemented
//! disassembler-shaped operand-arity table: the same information
//! `novasm/disassembler.cpp`'s giant switch encodes procedurally, kept here
//! as data so the assembler can size instructions and
//! [`crate::serialize::validate`] can sanity-check a decoded instruction
//! stream without a full disassembler.

/// Shape of the immediate operand(s) following an opcode's one-byte tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    /// No immediate operand.
    None,
    /// One `u8` immediate.
    U8,
    /// One `u32` immediate, little-endian (a stack slot index, jump offset,
    /// string-pool index, field index, or instruction offset).
    U32,
    /// Two `u8` immediates back to back (`AtomicCompareSwap`'s expected/new
    /// pair).
    U8U8,
    /// An `i64` immediate, little-endian.
    I64,
    /// An `f64` immediate, little-endian.
    F64,
}

impl OperandShape {
    pub const fn encoded_len(self) -> usize {
        match self {
            OperandShape::None => 0,
            OperandShape::U8 => 1,
            OperandShape::U32 => 4,
            OperandShape::U8U8 => 2,
            OperandShape::I64 | OperandShape::F64 => 8,
        }
    }
}

macro_rules! opcodes {
    ($($name:ident = $tag:expr => $shape:expr,)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $tag,)*
        }

        impl Opcode {
            pub fn from_tag(tag: u8) -> Option<Opcode> {
                match tag {
                    $($tag => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            pub const fn operand_shape(self) -> OperandShape {
                match self {
                    $(Opcode::$name => $shape,)*
                }
            }
        }
    };
}

opcodes! {
    // Literals
    LoadLitInt0 = 0 => OperandShape::None,
    LoadLitInt1 = 1 => OperandShape::None,
    LoadLitInt8 = 2 => OperandShape::U8,
    LoadLitInt32 = 3 => OperandShape::U32,
    LoadLitLong = 4 => OperandShape::I64,
    LoadLitFloat = 5 => OperandShape::F64,
    LoadLitString = 6 => OperandShape::U32,
    LoadLitBool = 7 => OperandShape::U8,
    LoadLitChar = 8 => OperandShape::U32,
    /// Loads the entry instruction offset of a function as a value (bound
    /// delegate / `LitFunc`).
    LoadLitIp = 9 => OperandShape::U32,

    // Stack / locals
    StackAlloc = 10 => OperandShape::U32,
    StackLoad = 11 => OperandShape::U32,
    StackStore = 12 => OperandShape::U32,
    Dup = 13 => OperandShape::None,
    Pop = 14 => OperandShape::None,

    // Structs
    MakeStruct = 15 => OperandShape::U32,
    MakeNullStruct = 16 => OperandShape::None,
    StructLoadField = 17 => OperandShape::U32,
    CheckStructNull = 18 => OperandShape::None,

    // Control flow
    Jump = 19 => OperandShape::U32,
    JumpIf = 20 => OperandShape::U32,
    Call = 21 => OperandShape::U32,
    CallTail = 22 => OperandShape::U32,
    CallForked = 23 => OperandShape::U32,
    CallDyn = 24 => OperandShape::None,
    CallDynTail = 25 => OperandShape::None,
    CallDynForked = 26 => OperandShape::None,
    Ret = 27 => OperandShape::None,
    Fail = 28 => OperandShape::None,
    PCall = 29 => OperandShape::U8,

    // int
    AddInt = 30 => OperandShape::None,
    SubInt = 31 => OperandShape::None,
    MulInt = 32 => OperandShape::None,
    DivInt = 33 => OperandShape::None,
    RemInt = 34 => OperandShape::None,
    NegateInt = 35 => OperandShape::None,
    IncrementInt = 36 => OperandShape::None,
    DecrementInt = 37 => OperandShape::None,
    ShiftLeftInt = 38 => OperandShape::None,
    ShiftRightInt = 39 => OperandShape::None,
    AndInt = 40 => OperandShape::None,
    OrInt = 41 => OperandShape::None,
    XorInt = 42 => OperandShape::None,
    InvInt = 43 => OperandShape::None,
    CheckEqInt = 44 => OperandShape::None,
    CheckNEqInt = 45 => OperandShape::None,
    CheckLeInt = 46 => OperandShape::None,
    CheckLeEqInt = 47 => OperandShape::None,
    CheckGtInt = 48 => OperandShape::None,
    CheckGtEqInt = 49 => OperandShape::None,

    // long
    AddLong = 50 => OperandShape::None,
    SubLong = 51 => OperandShape::None,
    MulLong = 52 => OperandShape::None,
    DivLong = 53 => OperandShape::None,
    RemLong = 54 => OperandShape::None,
    NegateLong = 55 => OperandShape::None,
    CheckEqLong = 56 => OperandShape::None,
    CheckNEqLong = 57 => OperandShape::None,
    CheckLeLong = 58 => OperandShape::None,
    CheckLeEqLong = 59 => OperandShape::None,
    CheckGtLong = 60 => OperandShape::None,
    CheckGtEqLong = 61 => OperandShape::None,

    // float
    AddFloat = 62 => OperandShape::None,
    SubFloat = 63 => OperandShape::None,
    MulFloat = 64 => OperandShape::None,
    DivFloat = 65 => OperandShape::None,
    NegateFloat = 66 => OperandShape::None,
    PowFloat = 67 => OperandShape::None,
    SqrtFloat = 68 => OperandShape::None,
    SinFloat = 69 => OperandShape::None,
    CosFloat = 70 => OperandShape::None,
    TanFloat = 71 => OperandShape::None,
    ASinFloat = 72 => OperandShape::None,
    ACosFloat = 73 => OperandShape::None,
    ATanFloat = 74 => OperandShape::None,
    ATan2Float = 75 => OperandShape::None,
    CheckEqFloat = 76 => OperandShape::None,
    CheckNEqFloat = 77 => OperandShape::None,
    CheckLeFloat = 78 => OperandShape::None,
    CheckLeEqFloat = 79 => OperandShape::None,
    CheckGtFloat = 80 => OperandShape::None,
    CheckGtEqFloat = 81 => OperandShape::None,

    // bool / char
    AndBool = 82 => OperandShape::None,
    OrBool = 83 => OperandShape::None,
    InvBool = 84 => OperandShape::None,
    CheckEqBool = 85 => OperandShape::None,
    CheckNEqBool = 86 => OperandShape::None,
    CheckEqChar = 87 => OperandShape::None,
    CheckNEqChar = 88 => OperandShape::None,

    // string
    AddString = 89 => OperandShape::None,
    LengthString = 90 => OperandShape::None,
    IndexString = 91 => OperandShape::None,
    SliceString = 92 => OperandShape::None,
    CheckEqString = 93 => OperandShape::None,
    CheckNEqString = 94 => OperandShape::None,

    // conversions
    ConvIntLong = 95 => OperandShape::None,
    ConvLongInt = 96 => OperandShape::None,
    ConvIntFloat = 97 => OperandShape::None,
    ConvFloatInt = 98 => OperandShape::None,
    ConvIntChar = 99 => OperandShape::None,
    ConvCharInt = 100 => OperandShape::None,
    ConvCharLong = 101 => OperandShape::None,
    ConvIntString = 102 => OperandShape::None,
    ConvLongString = 103 => OperandShape::None,
    ConvFloatString = 104 => OperandShape::None,
    ConvBoolString = 105 => OperandShape::None,
    ConvCharString = 106 => OperandShape::None,

    // reflection / misc intrinsics
    ReflectTypeName = 107 => OperandShape::None,
    ReflectStructFieldCount = 108 => OperandShape::None,
    ReflectStructFieldName = 109 => OperandShape::None,
    ReflectStructFieldType = 110 => OperandShape::None,
    ReflectEnumKeys = 111 => OperandShape::None,
    ReflectEnumValues = 112 => OperandShape::None,
    ReflectIsStruct = 113 => OperandShape::None,
    ReflectIsUnion = 114 => OperandShape::None,
    ReflectIsEnum = 115 => OperandShape::None,
    ReflectIsDelegate = 116 => OperandShape::None,
    SourceLocFile = 117 => OperandShape::None,
    SourceLocLine = 118 => OperandShape::None,
    SourceLocColumn = 119 => OperandShape::None,
    StaticIntToInt = 120 => OperandShape::None,

    // concurrency
    FutureWaitNano = 121 => OperandShape::None,
    FutureBlock = 122 => OperandShape::None,
    AtomicCompareSwap = 123 => OperandShape::U8U8,
    AtomicBlock = 124 => OperandShape::U8,
    AtomicLoad = 125 => OperandShape::None,
}
