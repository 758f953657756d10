//! A list of directories tried, in order, after the importing source's own
//! directory (spec §6: "Search paths. A list of directory paths, tried in
//! order after the importing source's own directory").

use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct SearchPaths(Vec<PathBuf>);

impl SearchPaths {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        SearchPaths(paths)
    }

    /// Candidate absolute paths for `import_path` named from a source
    /// located at `importer_dir`, in resolution order: the importer's own
    /// directory first, then each configured search path.
    pub fn candidates<'a>(&'a self, importer_dir: Option<&'a Path>, import_path: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        importer_dir
            .into_iter()
            .chain(self.0.iter().map(PathBuf::as_path))
            .map(move |dir| dir.join(import_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importer_directory_is_tried_first() {
        let paths = SearchPaths::new(vec![PathBuf::from("/lib")]);
        let candidates: Vec<_> = paths.candidates(Some(Path::new("/src")), "util.nov").collect();
        assert_eq!(candidates, vec![PathBuf::from("/src/util.nov"), PathBuf::from("/lib/util.nov")]);
    }

    #[test]
    fn no_importer_directory_falls_back_to_search_paths_only() {
        let paths = SearchPaths::new(vec![PathBuf::from("/lib")]);
        let candidates: Vec<_> = paths.candidates(None, "util.nov").collect();
        assert_eq!(candidates, vec![PathBuf::from("/lib/util.nov")]);
    }
}
