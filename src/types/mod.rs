use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Zero-based line/column pair. Columns are byte offsets into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

/// Half-open range: `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// A range inside a specific file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub range: SourceRange,
}

/// Monotonically increasing version of a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentVersion(u64);

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl SourceRange {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Range covering `len` bytes of a single line starting at `column`.
    pub fn on_line(line: u32, column: usize, len: usize) -> Self {
        Self {
            start: SourcePosition::new(line, column as u32),
            end: SourcePosition::new(line, (column + len) as u32),
        }
    }

    pub fn contains(&self, position: SourcePosition) -> bool {
        position >= self.start && position < self.end
    }

    pub fn line(&self) -> u32 {
        self.start.line
    }
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, range: SourceRange) -> Self {
        Self {
            path: path.into(),
            range,
        }
    }

    pub fn line(&self) -> u32 {
        self.range.start.line
    }

    pub fn is_in(&self, path: &Path) -> bool {
        self.path == path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path.display(),
            self.range.start.line + 1,
            self.range.start.column + 1
        )
    }
}

impl DocumentVersion {
    pub const INITIAL: DocumentVersion = DocumentVersion(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
