//! Capabilities the analysis core consumes from a symbol index.
//!
//! The core only talks to these traits. [`WorkspaceSearch`] answers them from
//! the filesystem; an editor integration would back them with its language server.

mod workspace;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{SearchError, SearchResult};
use crate::types::{Location, SourcePosition};

pub use workspace::{WorkspaceSearch, expand_braces, identifier_at, word_occurrences};

/// Reference and implementation lookups.
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    /// Textual references to the symbol at `position`.
    async fn find_references(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>>;

    /// Implementations of the type at `position`.
    async fn find_implementations(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>>;
}

/// Glob-based file discovery.
#[async_trait]
pub trait FileSearch: Send + Sync {
    async fn find_files(
        &self,
        pattern: &str,
        exclude: Option<&str>,
        limit: usize,
    ) -> SearchResult<Vec<PathBuf>>;
}

/// Read access to document text.
#[async_trait]
pub trait DocumentAccess: Send + Sync {
    async fn open_document(&self, file: &Path) -> SearchResult<String>;

    async fn line_at(&self, file: &Path, line: u32) -> SearchResult<String> {
        let text = self.open_document(file).await?;
        text.lines()
            .nth(line as usize)
            .map(str::to_string)
            .ok_or_else(|| SearchError::LineOutOfRange {
                path: file.to_path_buf(),
                line,
            })
    }
}

/// Everything the resolvers need from their environment.
pub trait Capabilities: SymbolSearch + FileSearch + DocumentAccess {}

impl<T: SymbolSearch + FileSearch + DocumentAccess> Capabilities for T {}
