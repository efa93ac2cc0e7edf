//! Edit coalescing for re-scans.
//!
//! Every edit bumps the document version and restarts that document's quiet
//! period. A request only becomes ready once its document has been stable for
//! the debounce duration, and only the newest version may publish.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::types::DocumentVersion;

/// A scan that survived debouncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub path: PathBuf,
    pub version: DocumentVersion,
    pub text: String,
}

#[derive(Debug)]
struct PendingScan {
    version: DocumentVersion,
    text: String,
    last_edit: Instant,
}

#[derive(Debug)]
pub struct ScanScheduler {
    /// Newest unscanned text per document; older edits are overwritten.
    pending: HashMap<PathBuf, PendingScan>,
    /// Highest version handed out per document.
    latest: HashMap<PathBuf, DocumentVersion>,
    duration: Duration,
}

impl ScanScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            latest: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.duration
    }

    /// Record an edit and return the version it was assigned.
    ///
    /// Supersedes any pending scan of the same document.
    pub fn submit(&mut self, path: PathBuf, text: String) -> DocumentVersion {
        let version = self
            .latest
            .get(&path)
            .map_or(DocumentVersion::INITIAL.next(), |v| v.next());
        self.latest.insert(path.clone(), version);

        if let Some(superseded) = self.pending.insert(
            path.clone(),
            PendingScan {
                version,
                text,
                last_edit: Instant::now(),
            },
        ) {
            crate::debug_event!(
                "scheduler",
                "superseded",
                "{} v{} by v{}",
                path.display(),
                superseded.version.value(),
                version.value()
            );
        }
        version
    }

    /// Take every request whose document has been quiet long enough.
    pub fn take_ready(&mut self) -> Vec<ScanRequest> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, scan| {
            if now.duration_since(scan.last_edit) >= self.duration {
                ready.push(ScanRequest {
                    path: path.clone(),
                    version: scan.version,
                    text: std::mem::take(&mut scan.text),
                });
                false
            } else {
                true
            }
        });

        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }

    /// Whether `version` is still the newest edit of `path`.
    pub fn is_latest(&self, path: &Path, version: DocumentVersion) -> bool {
        self.latest.get(path) == Some(&version)
    }

    pub fn latest_version(&self, path: &Path) -> Option<DocumentVersion> {
        self.latest.get(path).copied()
    }

    /// Forget a document, e.g. when it is closed.
    pub fn remove(&mut self, path: &Path) {
        self.pending.remove(path);
        self.latest.remove(path);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
