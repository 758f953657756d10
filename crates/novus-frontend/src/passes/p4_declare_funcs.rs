//! Pass 4: declare every user function — validate its name against every
//! declared type, resolve its argument types (instantiating templates as
//! needed), and register a placeholder `FuncDecl` so pass 5's self-call
//! references and pass 6's call-site lookups both have a stable `FuncId`
//! before the body is lowered (spec §4.4 pass 4).
//!
//! A templated function (`type_params` non-empty) gets no `FuncDecl` here —
//! it goes into `FuncTemplateTable` / `func_template_items` instead, pushed
//! to both in the same iteration so [`crate::get_expr::GetExpr`]'s
//! instantiation helper can correlate the two lists by index.

use novus_ir::{FuncDecl, FuncKind, FuncTemplate, Primitives, TypeId, TypeSet};
use novus_common::{DiagnosticKind, FileId, SourceTable};
use novus_parser::{Item, ItemKind, Param, TypeExpr};

use crate::context::{AnalysisContext, PendingFunc};
use crate::passes::p2_declare_types::validate_type_params;
use crate::type_resolve::resolve_type;

pub fn run(ctx: &mut AnalysisContext, sources: &mut SourceTable, primitives: &Primitives) {
    let files = ctx.files.clone();
    for file in files {
        let items = ctx.trees.get(&file).cloned().unwrap_or_default();
        for item in &items {
            if let ItemKind::Func {
                name,
                type_params,
                params,
                ret,
                is_action,
                is_implicit_conv,
                body,
            } = &item.kind
            {
                declare_one(ctx, sources, primitives, file, item, name, type_params, params, ret, *is_action, *is_implicit_conv, body);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn declare_one(
    ctx: &mut AnalysisContext,
    sources: &mut SourceTable,
    primitives: &Primitives,
    file: FileId,
    item: &Item,
    name: &str,
    type_params: &[String],
    params: &[Param],
    ret: &Option<TypeExpr>,
    is_action: bool,
    is_implicit_conv: bool,
    body: &novus_parser::Expr,
) {
    if !type_params.is_empty() {
        if is_implicit_conv {
            ctx.error(DiagnosticKind::TemplatedImplicitConversion, Some(sources.intern_loc(file, item.span)));
            return;
        }
        validate_type_params(ctx, sources, file, item.span, type_params);
        ctx.func_template_items.entry(name.to_string()).or_default().push((file, item.clone()));
        ctx.program
            .func_templates_mut()
            .declare(name.to_string(), FuncTemplate::new(type_params.to_vec()));
        return;
    }

    if is_implicit_conv && params.len() != 1 {
        ctx.error(DiagnosticKind::TooManyInputsInImplicitConv, Some(sources.intern_loc(file, item.span)));
    }
    if !is_implicit_conv && ctx.program.find_type_by_name(name).is_some() {
        ctx.error(
            DiagnosticKind::TypeNameConflictsWithFunc { name: name.to_string() },
            Some(sources.intern_loc(file, item.span)),
        );
        return;
    }

    let mut input_tys = Vec::with_capacity(params.len());
    let mut opt_initializers = Vec::with_capacity(params.len());
    let mut seen_optional = false;
    for p in params {
        if seen_optional && p.default.is_none() {
            let source = sources.intern_loc(file, p.span);
            ctx.error(DiagnosticKind::NonOptArgFollowingOpt, Some(source));
        }
        if p.default.is_some() {
            seen_optional = true;
        }
        let ty = resolve_type(ctx, sources, None, &p.ty, file).unwrap_or(primitives.int);
        input_tys.push(ty);
        opt_initializers.push(p.default.clone());
    }
    let opt_count = params.iter().filter(|p| p.default.is_some()).count() as u32;

    let declared_ret = match ret {
        Some(texpr) => resolve_type(ctx, sources, None, texpr, file),
        None => None,
    };

    if is_implicit_conv {
        if let (Some(target_ty), Some(d)) = (ctx.program.find_type_by_name(name), declared_ret) {
            if d != target_ty {
                let returned_type = ctx.program.type_info(d).name.clone();
                let source = sources.intern_loc(file, item.span);
                ctx.error(
                    DiagnosticKind::IncorrectReturnTypeInConvFunc { name: name.to_string(), returned_type },
                    Some(source),
                );
            }
        }
    }

    if signature_already_declared(ctx, name, &input_tys) {
        let source = sources.intern_loc(file, item.span);
        ctx.error(DiagnosticKind::DuplicateFuncDeclaration { name: name.to_string() }, Some(source));
        return;
    }

    let placeholder_output = declared_ret.unwrap_or(primitives.int);
    let param_names: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
    let fid = ctx.program.declare_func(|id| FuncDecl {
        id,
        name: name.to_string(),
        kind: FuncKind::User,
        input: TypeSet::new(input_tys.clone()),
        output: placeholder_output,
        opt_input_count: opt_count,
        is_implicit_conv,
        is_action,
    });
    ctx.pending_funcs.insert(
        fid,
        PendingFunc {
            file,
            span: item.span,
            param_names,
            param_types: input_tys,
            opt_initializers,
            declared_ret,
            body: body.clone(),
            is_action,
        },
    );
}

fn signature_already_declared(ctx: &AnalysisContext, name: &str, input_tys: &[TypeId]) -> bool {
    ctx.program
        .funcs_named(name)
        .iter()
        .any(|&fid| ctx.program.func_decl(fid).input.0.as_slice() == input_tys)
}
