//! The novus compiler toolchain: source bytes to executable bytecode bytes.
//!
//! This crate is a thin facade over the pipeline crates. Each stage is an
//! independent crate so that embedders (e.g. a CLI or a language server,
//! neither of which lives in this repository) can depend on only the
//! stages they need.
//!
//! ```text
//! bytes -> novus_lexer -> novus_parser -> novus_frontend -> novus_optimizer -> novus_backend -> bytes
//! ```

pub use novus_backend as backend;
pub use novus_common as common;
pub use novus_frontend as frontend;
pub use novus_ir as ir;
pub use novus_lexer as lexer;
pub use novus_optimizer as optimizer;
pub use novus_parser as parser;

use novus_common::diagnostics::Diagnostic;
use novus_common::source::SourceTable;

/// Compile a single in-memory source into a serialized executable, running
/// the full pipeline: lex, parse, analyze, optimize, assemble, serialize.
///
/// Imports are not followed (no filesystem access from this facade); use
/// [`novus_frontend::analyze`] directly with a [`SourceTable`] built by an
/// embedder's own import resolver to compile a multi-file program.
pub fn compile(source_id: &str, text: &str) -> Result<Vec<u8>, Vec<Diagnostic>> {
    let mut sources = SourceTable::new();
    let main = sources.add(source_id.to_string(), None, text.to_string());

    let program = novus_frontend::analyze(&mut sources, &[main])?;
    let program = novus_optimizer::optimize(program);
    let executable = novus_backend::assemble(&program);
    let bytes = novus_backend::serialize(&executable);
    tracing::debug!(source_id, bytes = bytes.len(), "compiled");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_trivial_program() {
        let bytes = compile("main", "fun f() -> int 1 + 2").expect("compiles");
        assert!(!bytes.is_empty());
    }
}
