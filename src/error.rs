//! Error types for collaborator capabilities.
//!
//! None of these cross the analysis boundary: resolvers and filters catch them
//! at the call site and degrade to an unresolved or empty outcome.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SourcePosition;

/// Failures reported by symbol search, file search and document access.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("Line {line} is out of range for {path}")]
    LineOutOfRange { path: PathBuf, line: u32 },

    #[error("No identifier at {path}:{}:{}", .position.line + 1, .position.column + 1)]
    NoIdentifier {
        path: PathBuf,
        position: SourcePosition,
    },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Search task failed: {0}")]
    Task(String),
}

pub type SearchResult<T> = Result<T, SearchError>;

impl From<tokio::task::JoinError> for SearchError {
    fn from(e: tokio::task::JoinError) -> Self {
        SearchError::Task(e.to_string())
    }
}
