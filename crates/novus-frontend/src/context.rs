//! Shared analysis state threaded through every pass (spec §4.4).
//!
//! Grounded on `examples/original_source/src/frontend/internal/context.hpp`'s
//! `Context` (the original holds `const Source&` plus the accumulating
//! diagnostics and the in-progress `Program`) and on `tsz-checker`'s
//! `CheckerContext` for the Rust idiom: one struct threaded by `&mut`
//! through every pass function rather than passed as a bundle of loose
//! arguments.

use rustc_hash::FxHashMap;

use novus_common::{Diagnostic, DiagnosticKind, FileId, SourceId, SourceTable, Span};
use novus_ir::{FuncId, Program, TypeId};
use novus_parser::{Expr as PExpr, Item};

/// A declared-but-not-yet-defined function's parse-tree leftovers, kept
/// around between pass 4 (declare) and passes 5/6 (infer / define).
pub struct PendingFunc {
    pub file: FileId,
    pub span: Span,
    pub param_names: Vec<String>,
    pub param_types: Vec<TypeId>,
    pub opt_initializers: Vec<Option<PExpr>>,
    pub declared_ret: Option<TypeId>,
    pub body: PExpr,
    pub is_action: bool,
}

/// A declared-but-not-yet-defined type's parse-tree leftovers (struct
/// field types / union members / enum entries), kept between pass 2
/// (declare) and pass 3 (define).
pub struct PendingType {
    pub file: FileId,
    pub item: Item,
}

#[derive(Default)]
pub struct AnalysisContext {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,

    /// Every loaded file's top-level items, in parse order.
    pub trees: FxHashMap<FileId, Vec<Item>>,
    /// Files to analyze, in load order (spec §4.3: "main source" first,
    /// then each import in first-encountered order).
    pub files: Vec<FileId>,

    pub pending_types: FxHashMap<TypeId, PendingType>,
    pub pending_funcs: FxHashMap<FuncId, PendingFunc>,

    /// Every declared (non-template) type's declaration site, kept past
    /// pass 3 so pass 8's cyclic-struct check can still anchor a
    /// diagnostic at the struct itself once `pending_types` has been
    /// drained.
    pub type_decl_locs: FxHashMap<TypeId, (FileId, Span)>,

    /// Non-instantiated struct/union/enum template declarations, by name.
    pub type_template_items: FxHashMap<String, (FileId, Item)>,
    /// Non-instantiated function templates; overloadable, so a name maps to
    /// more than one declaration.
    pub func_template_items: FxHashMap<String, Vec<(FileId, Item)>>,

    /// `(file, body)` pairs collected from every top-level bare-expression
    /// statement, in file-then-declaration order (spec §4.4 pass 7).
    pub exec_items: Vec<(FileId, PExpr)>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        AnalysisContext::default()
    }

    pub fn error(&mut self, kind: DiagnosticKind, source: Option<SourceId>) {
        self.diagnostics.push(Diagnostic::new(kind, source));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn intern(&mut self, sources: &mut SourceTable, file: FileId, span: Span) -> SourceId {
        sources.intern_loc(file, span)
    }
}

/// Names no user declaration may use (spec §4.4 pass 2: "not reserved:
/// `int`, `function`, `action`, …").
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    "int", "long", "float", "bool", "char", "string", "function", "action", "future", "lazy",
];

pub fn is_reserved_type_name(name: &str) -> bool {
    RESERVED_TYPE_NAMES.contains(&name)
}
