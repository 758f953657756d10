//! Pass 2: declare every user type.
//!
//! Validates each struct/union/enum declaration's name, then registers a
//! placeholder `TypeId` so later passes (and forward references within the
//! same file) have something to resolve to before the body is defined.
//! Templated declarations go into `TypeTemplateTable` / `type_template_items`
//! instead — a template has no `TypeId` of its own until it is instantiated
//! (spec §4.4 pass 2).

use rustc_hash::FxHashSet;

use novus_common::{DiagnosticKind, FileId, SourceTable, Span};
use novus_ir::{EnumDef, FieldDeclTable, StructDef, TypeKind, TypeTemplate, UnionDef};
use novus_parser::{Item, ItemKind};

use crate::context::{is_reserved_type_name, AnalysisContext, PendingType};

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable) {
    let files = ctx.files.clone();
    for file in files {
        let items = ctx.trees.get(&file).cloned().unwrap_or_default();
        for item in &items {
            declare_one(ctx, sources, file, item);
        }
    }
}

fn declare_one(ctx: &mut AnalysisContext, sources: &mut SourceTable, file: FileId, item: &Item) {
    match &item.kind {
        ItemKind::Struct { name, type_params, .. } => {
            declare_struct_or_union(ctx, sources, file, item, name, type_params, true);
        }
        ItemKind::Union { name, type_params, .. } => {
            declare_struct_or_union(ctx, sources, file, item, name, type_params, false);
        }
        ItemKind::Enum { name, .. } => {
            if !check_name_available(ctx, sources, file, name, item.span) {
                return;
            }
            let id = ctx.program.declare_type(name.clone(), TypeKind::Enum(EnumDef::default()));
            ctx.type_decl_locs.insert(id, (file, item.span));
            ctx.pending_types.insert(id, PendingType { file, item: item.clone() });
        }
        ItemKind::Func { .. } | ItemKind::Import { .. } | ItemKind::Exec(_) | ItemKind::Error(_) => {}
    }
}

fn declare_struct_or_union(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    file: FileId,
    item: &Item,
    name: &str,
    type_params: &[String],
    is_struct: bool,
) {
    if type_params.is_empty() {
        if !check_name_available(ctx, sources, file, name, item.span) {
            return;
        }
        let placeholder = if is_struct {
            TypeKind::Struct(StructDef { fields: FieldDeclTable::new() })
        } else {
            TypeKind::Union(UnionDef::default())
        };
        let id = ctx.program.declare_type(name.to_string(), placeholder);
        ctx.type_decl_locs.insert(id, (file, item.span));
        ctx.pending_types.insert(id, PendingType { file, item: item.clone() });
        return;
    }

    if !check_name_available(ctx, sources, file, name, item.span) {
        return;
    }
    validate_type_params(ctx, sources, file, item.span, type_params);
    ctx.type_template_items.insert(name.to_string(), (file, item.clone()));
    ctx.program
        .type_templates_mut()
        .declare(name.to_string(), TypeTemplate::new(type_params.to_vec()));
}

/// Not reserved, not already a declared type or type template.
fn check_name_available(ctx: &mut AnalysisContext, sources: &mut SourceTable, file: FileId, name: &str, span: Span) -> bool {
    if is_reserved_type_name(name) {
        let source = sources.intern_loc(file, span);
        ctx.error(DiagnosticKind::TypeNameIsReserved { name: name.to_string() }, Some(source));
        return false;
    }
    if ctx.program.find_type_by_name(name).is_some() {
        let source = sources.intern_loc(file, span);
        ctx.error(DiagnosticKind::TypeAlreadyDeclared { name: name.to_string() }, Some(source));
        return false;
    }
    if ctx.type_template_items.contains_key(name) {
        let source = sources.intern_loc(file, span);
        ctx.error(DiagnosticKind::TypeTemplateAlreadyDeclared { name: name.to_string() }, Some(source));
        return false;
    }
    true
}

/// A templated declaration's own type-parameter list can't shadow a
/// declared type or repeat a name (spec §4.4:
/// `TypeParamNameConflictsWithType` / `DuplicateTypeParamName`). Shared with
/// pass 4's function-template declarations.
pub(crate) fn validate_type_params(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    file: FileId,
    span: Span,
    type_params: &[String],
) {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for p in type_params {
        if !seen.insert(p.as_str()) {
            let source = sources.intern_loc(file, span);
            ctx.error(DiagnosticKind::DuplicateTypeParamName { name: p.clone() }, Some(source));
        }
        if ctx.program.find_type_by_name(p).is_some() {
            let source = sources.intern_loc(file, span);
            ctx.error(DiagnosticKind::TypeParamNameConflictsWithType { name: p.clone() }, Some(source));
        }
    }
}
