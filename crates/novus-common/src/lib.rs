//! Common types shared by every stage of the novus compiler pipeline.
//!
//! This crate provides the foundation every other `novus-*` crate builds
//! on:
//! - Source spans and line/column positions (`span`, `position`)
//! - Opaque source identifiers and the source table they resolve through
//!   (`source`)
//! - String interning for identifiers (`interner`)
//! - Diagnostics as plain data, never panics (`diagnostics`)
//! - Centralized compiler limits (`limits`)

pub mod diagnostics;
pub mod interner;
pub mod limits;
pub mod position;
pub mod source;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use interner::{Atom, Interner};
pub use position::TextPos;
pub use source::{FileId, Source, SourceId, SourceTable};
pub use span::Span;
