//! Semantic analyzer: turns parsed `novus` source into a [`novus_ir::Program`]
//! (spec §4.4, C5). Consumes [`novus_parser::Item`] trees already produced
//! from [`novus_lexer`] tokens, against an already-resolved file list;
//! [`import::resolve`] is this crate's own import-graph walk, called by an
//! embedder before [`analyze::analyze`], not from inside it.

pub mod analyze;
pub mod context;
pub mod get_expr;
pub mod import;
pub mod overload;
pub mod passes;
pub mod search_paths;
pub mod type_resolve;

pub use analyze::analyze;
pub use context::AnalysisContext;
pub use import::{resolve as resolve_imports, SourceLoader};
pub use search_paths::SearchPaths;
