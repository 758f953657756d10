//! Turning a parser [`TypeExpr`] into a [`TypeId`], instantiating type
//! templates on demand and memoizing by type-parameter tuple (spec glossary:
//! "each distinct type-parameter tuple instantiates a distinct `TypeId`").

use rustc_hash::FxHashSet;

use novus_common::{DiagnosticKind, FileId, SourceTable, Span};
use novus_ir::{FieldDeclTable, FuncDecl, FuncKind, StructDef, TypeId, TypeKind, TypeSet, UnionDef};
use novus_parser::{ItemKind, TypeExpr};

use crate::context::AnalysisContext;

/// `base__param1_param2_…` (spec: "for instantiated templates the name is
/// mangled").
pub fn mangle_name(ctx: &AnalysisContext, base: &str, params: &[TypeId]) -> String {
    let mut name = base.to_string();
    for p in params {
        name.push_str("__");
        name.push_str(&ctx.program.type_info(*p).name);
    }
    name
}

/// Resolve a parsed type expression against the program's declared types,
/// instantiating a template if `name{T1, T2}` names one. `subst` is the
/// in-scope type-parameter substitution when resolving inside a template
/// body; `None` at the top level.
pub fn resolve_type(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    subst: Option<&novus_ir::TypeSubstitutionTable>,
    texpr: &TypeExpr,
    file: FileId,
) -> Option<TypeId> {
    if let Some(table) = subst {
        if let Some(bound) = table.get(&texpr.name) {
            if !texpr.type_params.is_empty() {
                let source = sources.intern_loc(file, texpr.span);
                ctx.error(
                    DiagnosticKind::TypeParamOnSubstitutionType { name: texpr.name.clone() },
                    Some(source),
                );
                return None;
            }
            return Some(bound);
        }
    }

    if texpr.type_params.is_empty() {
        if let Some(id) = ctx.program.find_type_by_name(&texpr.name) {
            return Some(id);
        }
        let source = sources.intern_loc(file, texpr.span);
        ctx.error(
            DiagnosticKind::UndeclaredType {
                name: texpr.name.clone(),
                type_params: 0,
            },
            Some(source),
        );
        return None;
    }

    let mut params = Vec::with_capacity(texpr.type_params.len());
    for p in &texpr.type_params {
        params.push(resolve_type(ctx, sources, subst, p, file)?);
    }

    if let Some(template) = ctx.program.type_templates().get(&texpr.name) {
        if let Some(id) = template.instance(&params) {
            return Some(id);
        }
    } else {
        let source = sources.intern_loc(file, texpr.span);
        ctx.error(
            DiagnosticKind::NoTypeOrConversionFoundToInstantiate {
                name: texpr.name.clone(),
                template_param_count: params.len() as u32,
            },
            Some(source),
        );
        return None;
    }

    instantiate_type_template(ctx, sources, &texpr.name, params, file, texpr.span)
}

/// Build a fresh instance of type template `name` for `params`, caching it
/// before defining its body so a self-referential template body resolves
/// to the same in-progress id (mirrors the declare-then-define split of
/// spec §4.4 passes 2/3, applied to templates).
fn instantiate_type_template(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    name: &str,
    params: Vec<TypeId>,
    use_file: FileId,
    use_span: Span,
) -> Option<TypeId> {
    let Some((decl_file, item)) = ctx.type_template_items.get(name).cloned() else {
        return None;
    };

    let (type_params, is_struct) = match &item.kind {
        ItemKind::Struct { type_params, .. } => (type_params.clone(), true),
        ItemKind::Union { type_params, .. } => (type_params.clone(), false),
        _ => return None,
    };

    if type_params.len() != params.len() {
        ctx.error(DiagnosticKind::InvalidTypeInstantiation, Some(sources.intern_loc(use_file, use_span)));
        return None;
    }

    let mangled = mangle_name(ctx, item_name(&item), &params);
    let placeholder = if is_struct {
        TypeKind::Struct(StructDef { fields: FieldDeclTable::new() })
    } else {
        TypeKind::Union(UnionDef::default())
    };
    let id = ctx.program.declare_type(mangled, placeholder);
    ctx.program
        .type_templates_mut()
        .get_mut(name)
        .expect("template declared before instantiation")
        .cache_instance(params.clone(), id);

    let mut subst = novus_ir::TypeSubstitutionTable::new();
    for (param_name, ty) in type_params.iter().zip(params.iter()) {
        subst.bind(param_name.clone(), *ty);
    }

    match &item.kind {
        ItemKind::Struct { fields, .. } => {
            let table = define_struct_fields(ctx, sources, Some(&subst), decl_file, fields);
            ctx.program.type_info_mut(id).kind = TypeKind::Struct(StructDef { fields: table.clone() });
            declare_struct_constructor(ctx, id, &table);
        }
        ItemKind::Union { members, .. } => {
            let ids = define_union_members(ctx, sources, Some(&subst), decl_file, members);
            ctx.program.type_info_mut(id).kind = TypeKind::Union(UnionDef { members: ids });
        }
        _ => unreachable!(),
    }

    Some(id)
}

/// Registers the `MakeStruct` function a struct's own `Name(args)` literal
/// resolves through — one input per field, in declaration order, output the
/// struct's own type. [`crate::get_expr::GetExpr::lower_constructor`]
/// assumes this already exists by the time any struct construction is
/// lowered, so both the non-templated declare pass
/// (`passes/p3_define_types.rs`) and this template-instantiation path call
/// it right after a struct's fields are defined.
pub fn declare_struct_constructor(ctx: &mut AnalysisContext, id: TypeId, fields: &FieldDeclTable) {
    let name = ctx.program.type_info(id).name.clone();
    let input: Vec<TypeId> = fields.iter().map(|(_, _, ty)| ty).collect();
    ctx.program.declare_func(|fid| FuncDecl {
        id: fid,
        name,
        kind: FuncKind::MakeStruct,
        input: TypeSet::new(input),
        output: id,
        opt_input_count: 0,
        is_implicit_conv: false,
        is_action: false,
    });
}

fn item_name(item: &novus_parser::Item) -> &str {
    match &item.kind {
        ItemKind::Struct { name, .. } | ItemKind::Union { name, .. } => name,
        _ => "",
    }
}

/// Resolve every field's declared type, rejecting duplicate field names and
/// fields that shadow an existing type name (spec §4.4 pass 3).
pub fn define_struct_fields(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    subst: Option<&novus_ir::TypeSubstitutionTable>,
    file: FileId,
    fields: &[(String, TypeExpr)],
) -> FieldDeclTable {
    let mut table = FieldDeclTable::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for (field_name, field_type) in fields {
        if !seen.insert(field_name.clone()) {
            let source = sources.intern_loc(file, field_type.span);
            ctx.error(
                DiagnosticKind::DuplicateFieldNameInStruct { field_name: field_name.clone() },
                Some(source),
            );
            continue;
        }
        if ctx.program.find_type_by_name(field_name).is_some() {
            let source = sources.intern_loc(file, field_type.span);
            ctx.error(
                DiagnosticKind::FieldNameConflictsWithType { name: field_name.clone() },
                Some(source),
            );
            continue;
        }
        if let Some(ty) = resolve_type(ctx, sources, subst, field_type, file) {
            table.declare(field_name.clone(), ty);
        }
    }
    table
}

/// Resolve every union member's type, rejecting duplicates (spec §4.4 pass
/// 3: "Unions check member uniqueness after substitution").
pub fn define_union_members(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    subst: Option<&novus_ir::TypeSubstitutionTable>,
    file: FileId,
    members: &[TypeExpr],
) -> Vec<TypeId> {
    let mut ids = Vec::new();
    for member in members {
        if let Some(ty) = resolve_type(ctx, sources, subst, member, file) {
            if ids.contains(&ty) {
                let source = sources.intern_loc(file, member.span);
                ctx.error(
                    DiagnosticKind::DuplicateTypeInUnion {
                        type_name: ctx.program.type_info(ty).name.clone(),
                    },
                    Some(source),
                );
                continue;
            }
            ids.push(ty);
        }
    }
    ids
}
