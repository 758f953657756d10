//! Lowering rules from [`novus_ir::Expr`] to instruction bytes (spec §4.6).
//!
//! Label-name scheme: a `FuncId`'s numeric identity is opaque outside
//! `novus-ir` ([`novus_ir::FuncId`] exposes no accessor for it), so every
//! callable function is given a stable label derived instead from its
//! declaration position in [`Program::funcs`] — `"fn$<name>$<position>"`.
//! That position is also what "deterministic mode" (spec §4.6: "orders
//! synthesized anonymous functions lexicographically") sorts by as a
//! tie-breaker once names compare equal (two overloads can share a name).

use rustc_hash::FxHashMap;

use novus_ir::{CallMode, ConstId, Expr, ExprKind, FuncId, FuncKind, IntrinsicOp, Program, TypeKind};

use crate::assembler::Assembler;
use crate::executable::Executable;
use crate::opcode::Opcode;

type Labels = FxHashMap<FuncId, String>;

fn label_for(fid: FuncId, labels: &Labels) -> &str {
    labels.get(&fid).expect("every User function was assigned a label before lowering began")
}

/// Declaration order, optionally re-sorted lexicographically by name for
/// deterministic golden-bytecode tests.
fn func_order(program: &Program, deterministic: bool) -> Vec<FuncId> {
    let mut ordered: Vec<(usize, FuncId)> = program
        .funcs()
        .iter()
        .enumerate()
        .filter(|(_, decl)| program.func_def(decl.id).is_some())
        .map(|(pos, decl)| (pos, decl.id))
        .collect();
    if deterministic {
        ordered.sort_by(|a, b| program.func_decl(a.1).name.cmp(&program.func_decl(b.1).name).then(a.0.cmp(&b.0)));
    }
    ordered
}

fn assign_labels(order: &[FuncId], program: &Program) -> Labels {
    order
        .iter()
        .enumerate()
        .map(|(pos, &fid)| (fid, format!("fn${}${pos}", program.func_decl(fid).name)))
        .collect()
}

/// Lowers `Program` to an [`Executable`], assigning function labels in
/// declaration order.
pub fn lower_program(program: &Program, deterministic: bool) -> Executable {
    let order = func_order(program, deterministic);
    let labels = assign_labels(&order, program);

    let mut asm = Assembler::new();
    let entrypoint_offset = asm.here();
    lower_entry(&mut asm, program, &labels);

    for fid in &order {
        lower_function(&mut asm, program, *fid, &labels);
    }

    let (code, strings) = asm.finish();
    tracing::debug!(functions = order.len(), code_len = code.len(), strings = strings.len(), "program assembled");
    Executable::new(env!("CARGO_PKG_VERSION").to_string(), entrypoint_offset, strings, code)
}

/// The program's execute statements, run in source order. Pass 7 of the
/// analyzer gives each exec statement its own throwaway [`ConstDeclTable`]
/// that `Program` never retains, so unlike a function body the stack-slot
/// count for one isn't on hand — it's recovered here by scanning the
/// lowered expression for the highest `ConstId` it assigns or reads.
fn lower_entry(asm: &mut Assembler, program: &Program, labels: &Labels) {
    for stmt in program.exec_stmts() {
        let slots = max_const_index(stmt).map_or(0, |max| max + 1);
        asm.emit_op(Opcode::StackAlloc);
        asm.emit_u32(slots as u32);
        lower_expr(asm, program, stmt, false, "", labels);
        asm.emit_op(Opcode::Pop);
    }
    asm.emit_op(Opcode::Ret);
}

fn max_const_index(expr: &Expr) -> Option<usize> {
    fn visit(expr: &Expr, acc: &mut Option<usize>) {
        let mut see = |id: ConstId| {
            *acc = Some(acc.map_or(id.index(), |m| m.max(id.index())));
        };
        match &expr.kind {
            ExprKind::Const(id) => see(*id),
            ExprKind::Assign(id, rhs) => {
                see(*id);
                visit(rhs, acc);
            }
            ExprKind::UnionGet(target, _, id) => {
                see(*id);
                visit(target, acc);
            }
            ExprKind::Group(items) => items.iter().for_each(|e| visit(e, acc)),
            ExprKind::Call { args, .. } => args.iter().for_each(|e| visit(e, acc)),
            ExprKind::CallDyn { lhs, args, .. } => {
                visit(lhs, acc);
                args.iter().for_each(|e| visit(e, acc));
            }
            ExprKind::CallSelf { args } => args.iter().for_each(|e| visit(e, acc)),
            ExprKind::Field(target, _) => visit(target, acc),
            ExprKind::UnionCheck(target, _) => visit(target, acc),
            ExprKind::Switch { conditions, branches } => {
                conditions.iter().chain(branches.iter()).for_each(|e| visit(e, acc));
            }
            ExprKind::Closure { bound_args, .. } => bound_args.iter().for_each(|e| visit(e, acc)),
            _ => {}
        }
    }
    let mut acc = None;
    visit(expr, &mut acc);
    acc
}

fn lower_function(asm: &mut Assembler, program: &Program, fid: FuncId, labels: &Labels) {
    let def = program.func_def(fid).expect("caller filtered to defined functions");
    asm.define_label(label_for(fid, labels).to_string());
    asm.emit_op(Opcode::StackAlloc);
    asm.emit_u32(def.consts.len() as u32);
    lower_expr(asm, program, &def.body, true, label_for(fid, labels), labels);
    asm.emit_op(Opcode::Ret);
}

fn emit_int_literal(asm: &mut Assembler, value: i64) {
    if value == 0 {
        asm.emit_op(Opcode::LoadLitInt0);
    } else if value == 1 {
        asm.emit_op(Opcode::LoadLitInt1);
    } else if let Ok(v8) = i8::try_from(value) {
        asm.emit_op(Opcode::LoadLitInt8);
        asm.emit_u8(v8 as u8);
    } else {
        asm.emit_op(Opcode::LoadLitInt32);
        asm.emit_u32(value as i32 as u32);
    }
}

/// Lowers one expression. `is_tail` is true only when `expr` occupies the
/// structurally-last position of the enclosing function body (spec §4.6:
/// "`Call` uses `CallTail` when it is the last expression of a function
/// body, by structural position"); `current_label` names the enclosing
/// function, for `CallSelf`.
fn lower_expr(asm: &mut Assembler, program: &Program, expr: &Expr, is_tail: bool, current_label: &str, labels: &Labels) {
    match &expr.kind {
        ExprKind::LitBool(b) => {
            asm.emit_op(Opcode::LoadLitBool);
            asm.emit_u8(*b as u8);
        }
        ExprKind::LitChar(c) => {
            asm.emit_op(Opcode::LoadLitChar);
            asm.emit_u32(*c as u32);
        }
        ExprKind::LitInt(v) => emit_int_literal(asm, *v),
        // Enum values are stored as their underlying int (spec §4.5's
        // int<->enum reinterpret conversion implies bit-for-bit equal
        // representations).
        ExprKind::LitEnum(_, v) => emit_int_literal(asm, *v as i64),
        ExprKind::LitLong(v) => {
            asm.emit_op(Opcode::LoadLitLong);
            asm.emit_i64(*v);
        }
        ExprKind::LitFloat(v) => {
            asm.emit_op(Opcode::LoadLitFloat);
            asm.emit_f64(*v);
        }
        ExprKind::LitString(atom) => {
            let s = program.interner().resolve(*atom);
            let idx = asm.intern_string(s);
            asm.emit_op(Opcode::LoadLitString);
            asm.emit_u32(idx);
        }
        ExprKind::LitFunc(fid) => {
            asm.emit_label_ref(Opcode::LoadLitIp, label_for(*fid, labels).to_string());
        }
        ExprKind::Closure { func, bound_args } => lower_delegate_value(asm, program, *func, bound_args, current_label, labels),

        ExprKind::Const(id) => {
            asm.emit_op(Opcode::StackLoad);
            asm.emit_u32(id.index() as u32);
        }
        ExprKind::Assign(id, rhs) => {
            lower_expr(asm, program, rhs, false, current_label, labels);
            asm.emit_op(Opcode::Dup);
            asm.emit_op(Opcode::StackStore);
            asm.emit_u32(id.index() as u32);
        }
        ExprKind::Group(items) => {
            for (i, item) in items.iter().enumerate() {
                let last = i == items.len() - 1;
                lower_expr(asm, program, item, is_tail && last, current_label, labels);
                if !last {
                    asm.emit_op(Opcode::Pop);
                }
            }
        }

        ExprKind::Call { func, args, mode } => lower_call(asm, program, *func, args, *mode, is_tail, current_label, labels),
        ExprKind::CallDyn { lhs, args, fork } => {
            args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
            lower_expr(asm, program, lhs, false, current_label, labels);
            let op = if *fork {
                Opcode::CallDynForked
            } else if is_tail {
                Opcode::CallDynTail
            } else {
                Opcode::CallDyn
            };
            asm.emit_op(op);
        }
        ExprKind::CallSelf { args } => {
            args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
            asm.emit_label_ref(Opcode::CallTail, current_label.to_string());
        }

        ExprKind::Field(target, fid) => {
            let struct_ty = target.ty;
            lower_expr(asm, program, target, false, current_label, labels);
            if let TypeKind::Struct(def) = &program.type_info(struct_ty).kind {
                match def.fields.len() {
                    0 => {}
                    1 => {}
                    _ => {
                        let pos = def.fields.position_of(*fid).expect("field belongs to this struct");
                        asm.emit_op(Opcode::StructLoadField);
                        asm.emit_u32(pos as u32);
                    }
                }
            }
        }

        ExprKind::UnionCheck(target, ty) => {
            lower_expr(asm, program, target, false, current_label, labels);
            emit_union_check(asm, program, target.ty, *ty);
        }
        ExprKind::UnionGet(target, ty, cid) => {
            lower_expr(asm, program, target, false, current_label, labels);
            asm.emit_op(Opcode::Dup);
            emit_payload_store(asm, program, target.ty, *ty, *cid);
            emit_union_check(asm, program, target.ty, *ty);
        }

        ExprKind::Switch { conditions, branches } => lower_switch(asm, program, conditions, branches, is_tail, current_label, labels),
    }
}

fn lower_call(
    asm: &mut Assembler,
    program: &Program,
    func: FuncId,
    args: &[Expr],
    mode: CallMode,
    is_tail: bool,
    current_label: &str,
    labels: &Labels,
) {
    let decl = program.func_decl(func);
    match decl.kind {
        FuncKind::Intrinsic(IntrinsicOp::PlatformCall(code)) => {
            args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
            asm.emit_op(Opcode::PCall);
            asm.emit_u8(code);
        }
        FuncKind::Intrinsic(op) => {
            args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
            asm.emit_op(intrinsic_opcode(op));
        }
        FuncKind::MakeStruct => {
            args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
            match args.len() {
                0 => asm.emit_op(Opcode::MakeNullStruct),
                1 => {}
                n => {
                    asm.emit_op(Opcode::MakeStruct);
                    asm.emit_u32(n as u32);
                }
            }
        }
        FuncKind::LazyGet => {
            lower_lazy_get(asm, program, &args[0], current_label, labels);
        }
        FuncKind::NoOp => {
            lower_expr(asm, program, &args[0], false, current_label, labels);
        }
        FuncKind::User => match mode {
            CallMode::Fork => {
                args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
                asm.emit_label_ref(Opcode::CallForked, label_for(func, labels).to_string());
            }
            CallMode::Lazy => lower_lazy_construct(asm, program, func, args, current_label, labels),
            CallMode::Normal | CallMode::Tail => {
                args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
                let op = if is_tail || mode == CallMode::Tail { Opcode::CallTail } else { Opcode::Call };
                asm.emit_label_ref(op, label_for(func, labels).to_string());
            }
        },
    }
}

/// Builds a delegate value (function pointer plus bound args, packed field
/// 0 = pointer, fields 1.. = bound args) for `Closure` and for `lazy f(...)`
/// (spec §4.6: "materializing a `{atomic, closure}` struct"; `closure` here
/// is this delegate value).
fn lower_delegate_value(asm: &mut Assembler, program: &Program, func: FuncId, bound_args: &[Expr], current_label: &str, labels: &Labels) {
    asm.emit_label_ref(Opcode::LoadLitIp, label_for(func, labels).to_string());
    bound_args.iter().for_each(|a| lower_expr(asm, program, a, false, current_label, labels));
    let field_count = bound_args.len() + 1;
    if field_count >= 2 {
        asm.emit_op(Opcode::MakeStruct);
        asm.emit_u32(field_count as u32);
    }
}

/// `lazy f(args...)` lowers to a 2-field `{atomic: int, closure: delegate}`
/// struct (spec §4.6), the atomic counter initialized to 0 (not yet run).
fn lower_lazy_construct(asm: &mut Assembler, program: &Program, func: FuncId, args: &[Expr], current_label: &str, labels: &Labels) {
    emit_int_literal(asm, 0);
    lower_delegate_value(asm, program, func, args, current_label, labels);
    asm.emit_op(Opcode::MakeStruct);
    asm.emit_u32(2);
}

/// `lazy_get(lazy)` (spec §4.6): "load the lazy, `AtomicCompareSwap(0->1)`;
/// if the prior value was non-zero, `AtomicBlock(2)` and load the cached
/// field; else call the closure, store the field, `AtomicCompareSwap(1->2)`,
/// load the field." `AtomicCompareSwap`/`AtomicBlock`/`AtomicLoad` act on
/// the lazy object's field 0 (the atomic counter) without consuming it, so
/// the struct reference stays on the stack for the subsequent field-1
/// (`closure`) load — a VM-side convention the backend assumes since
/// executing it is out of scope here.
fn lower_lazy_get(asm: &mut Assembler, program: &Program, lazy_expr: &Expr, current_label: &str, labels: &Labels) {
    lower_expr(asm, program, lazy_expr, false, current_label, labels);

    let already_done = asm.fresh_label("lazy_done");
    let end = asm.fresh_label("lazy_end");

    asm.emit_op(Opcode::AtomicCompareSwap);
    asm.emit_u8(0);
    asm.emit_u8(1);
    emit_int_literal(asm, 0);
    asm.emit_op(Opcode::CheckNEqInt);
    asm.emit_label_ref(Opcode::JumpIf, already_done.clone());

    // First caller: invoke the closure, cache the result, mark done.
    asm.emit_op(Opcode::Dup);
    asm.emit_op(Opcode::StructLoadField);
    asm.emit_u32(1);
    asm.emit_op(Opcode::CallDyn);
    asm.emit_op(Opcode::AtomicCompareSwap);
    asm.emit_u8(1);
    asm.emit_u8(2);
    asm.emit_op(Opcode::StructLoadField);
    asm.emit_u32(1);
    asm.emit_label_ref(Opcode::Jump, end.clone());

    asm.define_label(already_done);
    asm.emit_op(Opcode::AtomicBlock);
    asm.emit_u8(2);
    asm.emit_op(Opcode::StructLoadField);
    asm.emit_u32(1);

    asm.define_label(end);
}

fn lower_switch(asm: &mut Assembler, program: &Program, conditions: &[Expr], branches: &[Expr], is_tail: bool, current_label: &str, labels: &Labels) {
    let branch_labels: Vec<String> = (0..conditions.len()).map(|i| asm.fresh_label(&format!("switch_b{i}_"))).collect();
    let end_label = asm.fresh_label("switch_end_");

    for (cond, label) in conditions.iter().zip(&branch_labels) {
        lower_expr(asm, program, cond, false, current_label, labels);
        asm.emit_label_ref(Opcode::JumpIf, label.clone());
    }
    // No condition matched: the trailing branch is the else.
    lower_expr(asm, program, branches.last().expect("conditions.len() + 1 branches"), is_tail, current_label, labels);
    asm.emit_label_ref(Opcode::Jump, end_label.clone());

    for (branch, label) in branches.iter().zip(&branch_labels) {
        asm.define_label(label.clone());
        lower_expr(asm, program, branch, is_tail, current_label, labels);
        asm.emit_label_ref(Opcode::Jump, end_label.clone());
    }
    asm.define_label(end_label);
}

/// Whether union `union_ty` is laid out as a nullable struct (spec §4.6:
/// "a union of one struct-of->=2-fields plus one empty struct ... using
/// `MakeNullStruct` and `CheckStructNull`"), and if so which member is the
/// empty/null one.
fn nullable_union_empty_member(program: &Program, union_ty: novus_ir::TypeId) -> Option<novus_ir::TypeId> {
    let TypeKind::Union(udef) = &program.type_info(union_ty).kind else {
        return None;
    };
    if udef.members.len() != 2 {
        return None;
    }
    let mut empties = udef.members.iter().filter(|&&m| matches!(&program.type_info(m).kind, TypeKind::Struct(s) if s.fields.is_empty()));
    let empty = *empties.next()?;
    if empties.next().is_some() {
        return None;
    }
    let other_is_struct = udef
        .members
        .iter()
        .any(|&m| m != empty && matches!(&program.type_info(m).kind, TypeKind::Struct(s) if s.fields.len() >= 2));
    other_is_struct.then_some(empty)
}

fn emit_union_check(asm: &mut Assembler, program: &Program, union_ty: novus_ir::TypeId, check_ty: novus_ir::TypeId) {
    if let Some(empty_member) = nullable_union_empty_member(program, union_ty) {
        asm.emit_op(Opcode::CheckStructNull);
        if check_ty != empty_member {
            asm.emit_op(Opcode::InvBool);
        }
        return;
    }
    let TypeKind::Union(udef) = &program.type_info(union_ty).kind else {
        panic!("UnionCheck/UnionGet target must be a union type");
    };
    let idx = udef.members.iter().position(|&m| m == check_ty).expect("checked type is a union member");
    asm.emit_op(Opcode::StructLoadField);
    asm.emit_u32(0);
    emit_int_literal(asm, idx as i64);
    asm.emit_op(Opcode::CheckEqInt);
}

fn emit_payload_store(asm: &mut Assembler, program: &Program, union_ty: novus_ir::TypeId, _bind_ty: novus_ir::TypeId, cid: ConstId) {
    if nullable_union_empty_member(program, union_ty).is_none() {
        asm.emit_op(Opcode::StructLoadField);
        asm.emit_u32(1);
    }
    asm.emit_op(Opcode::StackStore);
    asm.emit_u32(cid.index() as u32);
}

fn intrinsic_opcode(op: IntrinsicOp) -> Opcode {
    use IntrinsicOp::*;
    match op {
        AddInt => Opcode::AddInt,
        SubInt => Opcode::SubInt,
        MulInt => Opcode::MulInt,
        DivInt => Opcode::DivInt,
        RemInt => Opcode::RemInt,
        NegateInt => Opcode::NegateInt,
        IncrementInt => Opcode::IncrementInt,
        DecrementInt => Opcode::DecrementInt,
        ShiftLeftInt => Opcode::ShiftLeftInt,
        ShiftRightInt => Opcode::ShiftRightInt,
        AndInt => Opcode::AndInt,
        OrInt => Opcode::OrInt,
        XorInt => Opcode::XorInt,
        InvInt => Opcode::InvInt,
        CheckEqInt => Opcode::CheckEqInt,
        CheckNEqInt => Opcode::CheckNEqInt,
        CheckLeInt => Opcode::CheckLeInt,
        CheckLeEqInt => Opcode::CheckLeEqInt,
        CheckGtInt => Opcode::CheckGtInt,
        CheckGtEqInt => Opcode::CheckGtEqInt,

        AddLong => Opcode::AddLong,
        SubLong => Opcode::SubLong,
        MulLong => Opcode::MulLong,
        DivLong => Opcode::DivLong,
        RemLong => Opcode::RemLong,
        NegateLong => Opcode::NegateLong,
        CheckEqLong => Opcode::CheckEqLong,
        CheckNEqLong => Opcode::CheckNEqLong,
        CheckLeLong => Opcode::CheckLeLong,
        CheckLeEqLong => Opcode::CheckLeEqLong,
        CheckGtLong => Opcode::CheckGtLong,
        CheckGtEqLong => Opcode::CheckGtEqLong,

        AddFloat => Opcode::AddFloat,
        SubFloat => Opcode::SubFloat,
        MulFloat => Opcode::MulFloat,
        DivFloat => Opcode::DivFloat,
        NegateFloat => Opcode::NegateFloat,
        PowFloat => Opcode::PowFloat,
        SqrtFloat => Opcode::SqrtFloat,
        SinFloat => Opcode::SinFloat,
        CosFloat => Opcode::CosFloat,
        TanFloat => Opcode::TanFloat,
        ASinFloat => Opcode::ASinFloat,
        ACosFloat => Opcode::ACosFloat,
        ATanFloat => Opcode::ATanFloat,
        ATan2Float => Opcode::ATan2Float,
        CheckEqFloat => Opcode::CheckEqFloat,
        CheckNEqFloat => Opcode::CheckNEqFloat,
        CheckLeFloat => Opcode::CheckLeFloat,
        CheckLeEqFloat => Opcode::CheckLeEqFloat,
        CheckGtFloat => Opcode::CheckGtFloat,
        CheckGtEqFloat => Opcode::CheckGtEqFloat,

        AndBool => Opcode::AndBool,
        OrBool => Opcode::OrBool,
        InvBool => Opcode::InvBool,
        CheckEqBool => Opcode::CheckEqBool,
        CheckNEqBool => Opcode::CheckNEqBool,
        CheckEqChar => Opcode::CheckEqChar,
        CheckNEqChar => Opcode::CheckNEqChar,

        AddString => Opcode::AddString,
        LengthString => Opcode::LengthString,
        IndexString => Opcode::IndexString,
        SliceString => Opcode::SliceString,
        CheckEqString => Opcode::CheckEqString,
        CheckNEqString => Opcode::CheckNEqString,

        ConvIntLong => Opcode::ConvIntLong,
        ConvLongInt => Opcode::ConvLongInt,
        ConvIntFloat => Opcode::ConvIntFloat,
        ConvFloatInt => Opcode::ConvFloatInt,
        ConvIntChar => Opcode::ConvIntChar,
        ConvCharInt => Opcode::ConvCharInt,
        ConvCharLong => Opcode::ConvCharLong,
        ConvIntString => Opcode::ConvIntString,
        ConvLongString => Opcode::ConvLongString,
        ConvFloatString => Opcode::ConvFloatString,
        ConvBoolString => Opcode::ConvBoolString,
        ConvCharString => Opcode::ConvCharString,

        ReflectTypeName => Opcode::ReflectTypeName,
        ReflectStructFieldCount => Opcode::ReflectStructFieldCount,
        ReflectStructFieldName => Opcode::ReflectStructFieldName,
        ReflectStructFieldType => Opcode::ReflectStructFieldType,
        ReflectEnumKeys => Opcode::ReflectEnumKeys,
        ReflectEnumValues => Opcode::ReflectEnumValues,
        ReflectIsStruct => Opcode::ReflectIsStruct,
        ReflectIsUnion => Opcode::ReflectIsUnion,
        ReflectIsEnum => Opcode::ReflectIsEnum,
        ReflectIsDelegate => Opcode::ReflectIsDelegate,

        Fail => Opcode::Fail,
        SourceLocFile => Opcode::SourceLocFile,
        SourceLocLine => Opcode::SourceLocLine,
        SourceLocColumn => Opcode::SourceLocColumn,
        StaticIntToInt => Opcode::StaticIntToInt,

        FutureWaitNano => Opcode::FutureWaitNano,
        FutureBlock => Opcode::FutureBlock,
        AtomicCompareSwap => Opcode::AtomicCompareSwap,
        AtomicBlock => Opcode::AtomicBlock,
        AtomicLoad => Opcode::AtomicLoad,

        PlatformCall(_) => unreachable!("dispatched before this table in lower_call"),
    }
}
