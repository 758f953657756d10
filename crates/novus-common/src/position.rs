//! Line/column positions, computed from byte offsets via a per-source line
//! index built once and binary-searched per lookup.

/// One-based line and column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPos {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for TextPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Sorted byte offsets of every line start in a source, built once so that
/// `Span -> TextPos` lookups are `O(log lines)` instead of a linear scan.
/// Recognizes both LF and CRLF line endings; a CRLF pair counts as a single
/// line break anchored at the byte after the `\n`.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        let bytes = text.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() {
            if bytes[i] == b'\n' {
                line_starts.push((i + 1) as u32);
            }
            i += 1;
        }
        LineIndex { line_starts }
    }

    /// Resolve a byte offset to a 1-based (line, column) pair.
    pub fn pos(&self, offset: u32) -> TextPos {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        TextPos {
            line: (line_idx + 1) as u32,
            column: offset - line_start + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let idx = LineIndex::new("abc\ndef");
        assert_eq!(idx.pos(0), TextPos { line: 1, column: 1 });
    }

    #[test]
    fn second_line_after_lf() {
        let idx = LineIndex::new("abc\ndef");
        assert_eq!(idx.pos(4), TextPos { line: 2, column: 1 });
    }

    #[test]
    fn crlf_line_break() {
        let idx = LineIndex::new("ab\r\ncd");
        // offset 5 is 'c', the first byte after the \r\n pair
        assert_eq!(idx.pos(5), TextPos { line: 2, column: 1 });
    }

    #[test]
    fn midline_column_counts_bytes() {
        let idx = LineIndex::new("hello\nworld");
        assert_eq!(idx.pos(8), TextPos { line: 2, column: 3 });
    }
}
