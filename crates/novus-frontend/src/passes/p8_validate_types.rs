//! Pass 8: reject a struct that contains itself with no indirection (spec
//! §4.4 pass 8).
//!
//! Only struct fields are followed — a union member or a `delegate`
//! (function-typed field, lowered to a synthetic `Delegate`/`Future`/
//! `Lazy` type) breaks the chain, since either one is stored as a pointer
//! at runtime rather than laid out inline; only a straight chain of struct
//! fields can make a type infinitely sized.

use rustc_hash::FxHashSet;

use novus_common::{DiagnosticKind, SourceTable};
use novus_ir::{Program, TypeId, TypeKind};

use crate::context::AnalysisContext;

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable) {
    let struct_ids: Vec<TypeId> = ctx
        .program
        .types()
        .iter()
        .filter(|t| matches!(t.kind, TypeKind::Struct(_)))
        .map(|t| t.id)
        .collect();

    for id in struct_ids {
        let mut path = FxHashSet::default();
        if let Some((field_name, struct_name)) = find_cycle(&ctx.program, id, &mut path) {
            let source = ctx.type_decl_locs.get(&id).map(|&(file, span)| sources.intern_loc(file, span));
            ctx.error(DiagnosticKind::CyclicStruct { field_name, struct_name }, source);
        }
    }
}

/// DFS from `id` through struct fields only; returns the field name and
/// owning struct's name at the point a type already on the current path
/// is reached again.
fn find_cycle(program: &Program, id: TypeId, path: &mut FxHashSet<TypeId>) -> Option<(String, String)> {
    let TypeKind::Struct(def) = &program.type_info(id).kind else {
        return None;
    };
    path.insert(id);
    for (field_name, _, field_ty) in def.fields.iter() {
        if path.contains(&field_ty) {
            if let TypeKind::Struct(_) = &program.type_info(field_ty).kind {
                return Some((field_name.to_string(), program.type_info(id).name.clone()));
            }
            continue;
        }
        if let TypeKind::Struct(_) = &program.type_info(field_ty).kind {
            if let Some(found) = find_cycle(program, field_ty, path) {
                return Some(found);
            }
        }
    }
    path.remove(&id);
    None
}
