//! Source location tracking for guest functions and frames

use serde::{Deserialize, Serialize};

/// Byte range of a function body inside its chunk, plus the origin the
/// parser recorded for that chunk.
///
/// `url` is absent for chunks loaded from in-memory source text.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Hash)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub url: Option<String>,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan {
            start,
            end,
            url: None,
        }
    }

    pub fn with_url(start: usize, end: usize, url: impl Into<String>) -> Self {
        SourceSpan {
            start,
            end,
            url: Some(url.into()),
        }
    }
}

/// Line index for efficient offset-to-line/column conversion
#[derive(Debug)]
pub struct LineIndex {
    /// Starting byte offset of each line
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert byte offset to (line, column) (both 1-indexed)
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let line_start = self.line_starts[line];
        let col = offset.saturating_sub(line_start);

        (line + 1, col + 1)
    }
}
