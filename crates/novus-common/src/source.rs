//! Loaded source files, and the opaque [`SourceId`] that anchors a
//! diagnostic or an IR expression to a location inside one of them.
//!
//! These are two different granularities (spec §6, §C1 glossary):
//! - A [`FileId`] identifies one loaded file (the main source, or one of its
//!   transitive imports). The import resolver works at this granularity:
//!   "load each dependency once, deduplicated by filename."
//! - A [`SourceId`] identifies one registered *byte range inside* a file —
//!   it is what an IR `Expr` node or a `Diagnostic` actually carries, kept
//!   deliberately opaque so only a handful of integers need to be cloned
//!   around instead of a `(FileId, Span)` pair everywhere. `0` is reserved
//!   to mean "no location"; everywhere else it is nonzero. Resolve one back
//!   to `{file reference, span}` via [`SourceTable::resolve`].

use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::position::{LineIndex, TextPos};
use crate::span::Span;

/// Opaque, nonzero identifier for one loaded file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(NonZeroU32);

impl FileId {
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("file table index fits in u32");
        FileId(NonZeroU32::new(raw).expect("index + 1 is never zero"))
    }

    fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Opaque, nonzero identifier for one registered source location
/// (`file`, `span`) pair. Never constructed directly outside this module —
/// obtained from [`SourceTable::intern_loc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(NonZeroU32);

impl SourceId {
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("location table index fits in u32");
        SourceId(NonZeroU32::new(raw).expect("index + 1 is never zero"))
    }

    fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// One loaded source file: its id string (used in diagnostics), an optional
/// filesystem path (used only by the import resolver), and the full text.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: String,
    pub path: Option<PathBuf>,
    pub text: String,
    line_index: LineIndex,
}

impl Source {
    pub fn new(id: String, path: Option<PathBuf>, text: String) -> Self {
        let line_index = LineIndex::new(&text);
        Source {
            id,
            path,
            text,
            line_index,
        }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn slice(&self, span: Span) -> &str {
        let start = span.start as usize;
        let end = (span.end as usize + 1).min(self.text.len());
        self.text.get(start..end).unwrap_or("")
    }
}

/// Owns every loaded file plus the table of registered `(file, span)`
/// locations that hand out [`SourceId`]s. One `SourceTable` is shared by an
/// entire compilation (spec §5: it is the only cross-source state).
#[derive(Debug, Default)]
pub struct SourceTable {
    files: Vec<Source>,
    locations: Vec<(FileId, Span)>,
}

impl SourceTable {
    pub fn new() -> Self {
        SourceTable {
            files: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// Register a new file and return its id.
    pub fn add(&mut self, id: String, path: Option<PathBuf>, text: String) -> FileId {
        self.files.push(Source::new(id, path, text));
        FileId::from_index(self.files.len() - 1)
    }

    pub fn file(&self, id: FileId) -> &Source {
        &self.files[id.to_index()]
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.files.len()).map(FileId::from_index)
    }

    /// Find an already-loaded file by its path, used by the import resolver
    /// to deduplicate imports of the same file.
    pub fn find_by_path(&self, path: &std::path::Path) -> Option<FileId> {
        self.files
            .iter()
            .position(|s| s.path.as_deref() == Some(path))
            .map(FileId::from_index)
    }

    /// Register a `(file, span)` location, returning its [`SourceId`].
    /// Locations are not deduplicated: two calls with the same arguments
    /// yield two distinct ids, matching the "set-once" id attached to each
    /// IR expression (spec IR data model).
    pub fn intern_loc(&mut self, file: FileId, span: Span) -> SourceId {
        self.locations.push((file, span));
        SourceId::from_index(self.locations.len() - 1)
    }

    pub fn resolve(&self, id: SourceId) -> (FileId, Span) {
        self.locations[id.to_index()]
    }

    pub fn text_at(&self, id: SourceId) -> &str {
        let (file, span) = self.resolve(id);
        self.file(file).slice(span)
    }

    pub fn pos_at(&self, id: SourceId) -> TextPos {
        let (file, span) = self.resolve(id);
        self.file(file).line_index().pos(span.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ids_are_stable_and_distinct() {
        let mut table = SourceTable::new();
        let a = table.add("a".into(), None, "hello".into());
        let b = table.add("b".into(), None, "world".into());
        assert_ne!(a, b);
        assert_eq!(table.file(a).text, "hello");
        assert_eq!(table.file(b).text, "world");
    }

    #[test]
    fn find_by_path_dedups() {
        let mut table = SourceTable::new();
        let p = PathBuf::from("/tmp/a.nov");
        let a = table.add("a".into(), Some(p.clone()), "x".into());
        assert_eq!(table.find_by_path(&p), Some(a));
        assert_eq!(table.find_by_path(std::path::Path::new("/tmp/b.nov")), None);
    }

    #[test]
    fn interned_locations_resolve_back_to_file_and_span() {
        let mut table = SourceTable::new();
        let file = table.add("a".into(), None, "hello world".into());
        let loc = table.intern_loc(file, Span::new(6, 10));
        assert_eq!(table.text_at(loc), "world");
        assert_eq!(table.resolve(loc), (file, Span::new(6, 10)));
    }

    #[test]
    fn distinct_calls_yield_distinct_source_ids() {
        let mut table = SourceTable::new();
        let file = table.add("a".into(), None, "hello".into());
        let a = table.intern_loc(file, Span::new(0, 1));
        let b = table.intern_loc(file, Span::new(0, 1));
        assert_ne!(a, b);
    }
}
