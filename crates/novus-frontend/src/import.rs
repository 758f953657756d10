//! Import resolution (spec §4.3, C4).
//!
//! "Each `import` statement names a relative path. Resolver walks
//! recursively, loading each dependency once (deduplicated by filename),
//! searching: (1) directory of the source that contains the `import`, then
//! (2) every configured search path in order." Actually reading bytes off
//! disk is out of scope (spec §1 non-goals: "file loading ... (interface
//! only)") — that's why resolution is parameterized over a [`SourceLoader`]
//! the embedder supplies, rather than calling `std::fs` directly.
//!
//! Cycles are "naturally broken by the 'already-loaded' check keyed on
//! filename" — here, keyed on the candidate path rather than a bare
//! filename, since novus-common's `SourceTable::find_by_path` already
//! dedups on the full resolved path.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use novus_common::{Diagnostic, DiagnosticKind, FileId, SourceTable};
use novus_parser::{ItemKind, Parser};

use crate::search_paths::SearchPaths;

/// Reads file contents given a resolved candidate path. An embedder (CLI,
/// language server — neither lives in this repository) implements this
/// over real filesystem access; tests here use an in-memory fake.
pub trait SourceLoader {
    fn load(&mut self, path: &Path) -> Option<String>;
}

/// Walk `main` and its transitive imports, returning the load-ordered file
/// list (`main` first), every loaded file's parsed items, and any
/// unresolved-import diagnostics encountered along the way.
pub fn resolve(
    sources: &mut SourceTable,
    main: FileId,
    search_paths: &SearchPaths,
    loader: &mut dyn SourceLoader,
) -> (Vec<FileId>, FxHashMap<FileId, Vec<novus_parser::Item>>, Vec<Diagnostic>) {
    let mut order = Vec::new();
    let mut trees = FxHashMap::default();
    let mut diagnostics = Vec::new();
    let mut seen: FxHashSet<FileId> = FxHashSet::default();
    let mut queue = VecDeque::new();
    queue.push_back(main);

    while let Some(file) = queue.pop_front() {
        if !seen.insert(file) {
            continue;
        }
        order.push(file);

        let text = sources.file(file).text.clone();
        let mut parser = Parser::new(&text);
        let items = parser.parse_all();

        let importer_dir: Option<PathBuf> = sources
            .file(file)
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        for item in &items {
            let ItemKind::Import { path } = &item.kind else {
                continue;
            };
            let candidates: Vec<PathBuf> = search_paths.candidates(importer_dir.as_deref(), path).collect();

            let mut resolved = None;
            for candidate in &candidates {
                if let Some(existing) = sources.find_by_path(candidate) {
                    resolved = Some(existing);
                    break;
                }
            }
            if resolved.is_none() {
                for candidate in &candidates {
                    if let Some(text) = loader.load(candidate) {
                        let id = sources.add(candidate.display().to_string(), Some(candidate.clone()), text);
                        resolved = Some(id);
                        break;
                    }
                }
            }

            match resolved {
                Some(imported) => queue.push_back(imported),
                None => {
                    let source_id = sources.intern_loc(file, item.span);
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnresolvedImport { path: path.clone() },
                        Some(source_id),
                    ));
                }
            }
        }

        trees.insert(file, items);
    }

    (order, trees, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLoader(FxHashMap<PathBuf, String>);

    impl SourceLoader for FakeLoader {
        fn load(&mut self, path: &Path) -> Option<String> {
            self.0.get(path).cloned()
        }
    }

    #[test]
    fn follows_a_single_import_once() {
        let mut sources = SourceTable::new();
        let main = sources.add(
            "main".into(),
            Some(PathBuf::from("/src/main.nov")),
            "import \"util.nov\"\nfun f() -> int 1".into(),
        );
        let mut loader = FakeLoader(FxHashMap::from_iter([(
            PathBuf::from("/src/util.nov"),
            "fun g() -> int 2".to_string(),
        )]));
        let (order, trees, diags) = resolve(&mut sources, main, &SearchPaths::default(), &mut loader);
        assert!(diags.is_empty());
        assert_eq!(order.len(), 2);
        assert_eq!(trees.len(), 2);
    }

    #[test]
    fn unresolved_import_is_diagnosed_not_fatal() {
        let mut sources = SourceTable::new();
        let main = sources.add("main".into(), None, "import \"missing.nov\"".into());
        let mut loader = FakeLoader(FxHashMap::default());
        let (order, _trees, diags) = resolve(&mut sources, main, &SearchPaths::default(), &mut loader);
        assert_eq!(order, vec![main]);
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0].kind, DiagnosticKind::UnresolvedImport { .. }));
    }

    #[test]
    fn cyclic_imports_are_broken_by_dedup() {
        let mut sources = SourceTable::new();
        let main = sources.add(
            "a".into(),
            Some(PathBuf::from("/src/a.nov")),
            "import \"b.nov\"".into(),
        );
        let mut loader = FakeLoader(FxHashMap::from_iter([(
            PathBuf::from("/src/b.nov"),
            "import \"a.nov\"".to_string(),
        )]));
        let (order, _trees, diags) = resolve(&mut sources, main, &SearchPaths::default(), &mut loader);
        assert!(diags.is_empty());
        assert_eq!(order.len(), 2);
    }
}
