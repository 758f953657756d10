//! Entry point: drives the nine passes in [`crate::passes`] over a set of
//! already-loaded files (spec §4.4).
//!
//! Lexing and parsing happen here, not in a separate step, so that a
//! single-file embedder (the root facade's `compile`) can hand this
//! function raw source text without going through [`crate::import::resolve`]
//! first — that walk is only needed once more than one file is in play.

use novus_common::{Diagnostic, FileId, SourceTable};
use novus_ir::{register_intrinsics, Program};
use novus_parser::{ItemKind, Parser};

use crate::context::AnalysisContext;
use crate::passes::{
    p1_parse_diagnostics, p2_declare_types, p3_define_types, p4_declare_funcs, p5_infer_return_types,
    p6_define_funcs, p7_define_execs, p8_validate_types, p9_patch_calls,
};

/// Analyze `files` (in the given, already-import-resolved order; `files[0]`
/// is the main source) against `sources`, returning the built
/// [`novus_ir::Program`] or every diagnostic collected along the way.
///
/// Passes run in spec order. Two points gate on `ctx.has_errors()` rather
/// than running straight through: after pass 1, since a body full of
/// `Error` nodes has nothing sound left to lower; and after pass 4, since
/// passes 5 onward lower function bodies against whatever types and
/// signatures were declared, and a type or function that failed to
/// declare would otherwise cascade into unrelated-looking diagnostics in
/// every pass that follows. Passes 2–3 are allowed to run even if 1 found
/// errors — a syntax error in one function's body doesn't taint an
/// unrelated struct declaration elsewhere in the file.
pub fn analyze(sources: &mut SourceTable, files: &[FileId]) -> Result<Program, Vec<Diagnostic>> {
    let mut ctx = AnalysisContext::new();
    let primitives = register_intrinsics(&mut ctx.program);
    ctx.files = files.to_vec();

    for &file in files {
        let text = sources.file(file).text.clone();
        let mut parser = Parser::new(&text);
        let items = parser.parse_all();
        for item in &items {
            if let ItemKind::Exec(expr) = &item.kind {
                ctx.exec_items.push((file, expr.clone()));
            }
        }
        ctx.trees.insert(file, items);
    }

    p1_parse_diagnostics::run(&mut ctx, sources);
    if ctx.has_errors() {
        return Err(ctx.diagnostics);
    }

    p2_declare_types::run(&mut ctx, sources);
    p3_define_types::run(&mut ctx, sources);
    p4_declare_funcs::run(&mut ctx, sources, &primitives);
    if ctx.has_errors() {
        return Err(ctx.diagnostics);
    }

    p5_infer_return_types::run(&mut ctx, sources, &primitives);
    p6_define_funcs::run(&mut ctx, sources, &primitives);
    p7_define_execs::run(&mut ctx, sources, &primitives);
    p8_validate_types::run(&mut ctx, sources);
    p9_patch_calls::run(&mut ctx, sources, &primitives);

    if ctx.has_errors() {
        Err(ctx.diagnostics)
    } else {
        Ok(ctx.program)
    }
}
