//! Pass 3: define every user type declared by pass 2 — resolve struct
//! field types, union member types, and enum entry values against the now
//! fully-declared (if still empty-bodied) set of user types (spec §4.4
//! pass 3).
//!
//! Struct and union bodies are resolved by the exact same
//! [`crate::type_resolve::define_struct_fields`] /
//! [`crate::type_resolve::define_union_members`] helpers that instantiate a
//! type template's body — the non-templated case here just runs them with
//! no substitution table in scope.

use rustc_hash::FxHashSet;

use novus_common::{DiagnosticKind, FileId, SourceTable, Span};
use novus_ir::{EnumDef, EnumEntry, StructDef, TypeId, TypeKind, UnionDef};
use novus_parser::ItemKind;

use crate::context::{AnalysisContext, PendingType};
use crate::type_resolve::{declare_struct_constructor, define_struct_fields, define_union_members};

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable) {
    let mut pending: Vec<(TypeId, PendingType)> = ctx.pending_types.drain().collect();
    pending.sort_by_key(|(id, _)| *id);
    for (id, pending_type) in pending {
        define_one(ctx, sources, id, pending_type);
    }
}

fn define_one(ctx: &mut AnalysisContext, sources: &mut SourceTable, id: TypeId, pending: PendingType) {
    let file = pending.file;
    let span = pending.item.span;
    match pending.item.kind {
        ItemKind::Struct { ref fields, .. } => {
            let table = define_struct_fields(ctx, sources, None, file, fields);
            ctx.program.type_info_mut(id).kind = TypeKind::Struct(StructDef { fields: table.clone() });
            declare_struct_constructor(ctx, id, &table);
        }
        ItemKind::Union { ref members, .. } => {
            let ids = define_union_members(ctx, sources, None, file, members);
            ctx.program.type_info_mut(id).kind = TypeKind::Union(UnionDef { members: ids });
        }
        ItemKind::Enum { ref entries, .. } => {
            let defined = define_enum_entries(ctx, sources, file, span, entries);
            ctx.program.type_info_mut(id).kind = TypeKind::Enum(defined);
        }
        _ => unreachable!("only struct/union/enum items are ever registered as pending types"),
    }
}

/// Assigns each entry's value (explicit, or previous + 1 starting from 0)
/// and rejects a duplicate name or value (spec §4.4 pass 3: enums "assign
/// values ... and check name/value uniqueness"). Enum entries carry no
/// per-entry span in the parse tree, so diagnostics anchor at the
/// declaration's own span.
fn define_enum_entries(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    file: FileId,
    span: Span,
    entries: &[(String, Option<i32>)],
) -> EnumDef {
    let mut seen_names: FxHashSet<&str> = FxHashSet::default();
    let mut seen_values: FxHashSet<i32> = FxHashSet::default();
    let mut out = Vec::with_capacity(entries.len());
    let mut next_value: i32 = 0;
    for (name, explicit) in entries {
        let value = explicit.unwrap_or(next_value);
        next_value = value + 1;
        if !seen_names.insert(name.as_str()) {
            let source = sources.intern_loc(file, span);
            ctx.error(DiagnosticKind::DuplicateEntryNameInEnum { entry_name: name.clone() }, Some(source));
            continue;
        }
        if !seen_values.insert(value) {
            let source = sources.intern_loc(file, span);
            ctx.error(DiagnosticKind::DuplicateEntryValueInEnum { entry_value: value }, Some(source));
            continue;
        }
        out.push(EnumEntry { name: name.clone(), value });
    }
    EnumDef { entries: out }
}
