//! Per-document cache of external resolutions.
//!
//! Keyed by class name and tagged with the document version it was filled
//! for. Observing a newer version drops every entry at once; writes for an
//! older version are discarded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::events::{AnalysisEvent, EventBroadcaster};
use super::model::ResolutionResult;
use crate::types::DocumentVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// A resolution is in flight.
    Pending,
    Resolved(ResolutionResult),
}

impl CacheEntry {
    pub fn result(&self) -> Option<&ResolutionResult> {
        match self {
            CacheEntry::Pending => None,
            CacheEntry::Resolved(result) => Some(result),
        }
    }
}

#[derive(Debug)]
struct CacheState {
    version: DocumentVersion,
    entries: HashMap<String, CacheEntry>,
}

pub struct AnalysisCache {
    path: PathBuf,
    state: RwLock<CacheState>,
    events: EventBroadcaster,
}

impl AnalysisCache {
    pub fn new(path: impl Into<PathBuf>, events: EventBroadcaster) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(CacheState {
                version: DocumentVersion::INITIAL,
                entries: HashMap::new(),
            }),
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> DocumentVersion {
        self.state.read().version
    }

    /// Move to `version`, clearing everything if it is newer. Returns whether
    /// the cache was cleared.
    pub fn observe(&self, version: DocumentVersion) -> bool {
        let mut state = self.state.write();
        if version <= state.version {
            return false;
        }
        let dropped = state.entries.len();
        state.version = version;
        state.entries.clear();
        crate::debug_event!(
            "cache",
            "cleared",
            "{} v{} ({dropped} entries)",
            self.path.display(),
            version.value()
        );
        true
    }

    pub fn get(&self, class_name: &str) -> Option<CacheEntry> {
        self.state.read().entries.get(class_name).cloned()
    }

    /// Claim `class_name` for resolution at `version`.
    ///
    /// Returns `true` when the caller should resolve it: the key was absent
    /// and is now `Pending`. Stale versions never claim.
    pub fn begin(&self, version: DocumentVersion, class_name: &str) -> bool {
        let mut state = self.state.write();
        if version != state.version || state.entries.contains_key(class_name) {
            return false;
        }
        state
            .entries
            .insert(class_name.to_string(), CacheEntry::Pending);
        true
    }

    /// Store a finished resolution and notify subscribers.
    ///
    /// Ignored when the cache has moved past `version` in the meantime.
    pub fn complete(
        &self,
        version: DocumentVersion,
        class_name: &str,
        result: ResolutionResult,
    ) -> bool {
        let resolved = result.is_resolved();
        {
            let mut state = self.state.write();
            if version != state.version {
                crate::debug_event!(
                    "cache",
                    "stale result",
                    "{class_name} v{} (now v{})",
                    version.value(),
                    state.version.value()
                );
                return false;
            }
            state
                .entries
                .insert(class_name.to_string(), CacheEntry::Resolved(result));
        }

        self.events.send(AnalysisEvent::ResolutionCompleted {
            path: self.path.clone(),
            version,
            class_name: class_name.to_string(),
            resolved,
        });
        true
    }

    /// Finished resolutions for the current version.
    pub fn resolved(&self) -> Vec<(String, ResolutionResult)> {
        let state = self.state.read();
        let mut resolved: Vec<(String, ResolutionResult)> = state
            .entries
            .iter()
            .filter_map(|(name, entry)| entry.result().map(|r| (name.clone(), r.clone())))
            .collect();
        resolved.sort_by(|a, b| a.0.cmp(&b.0));
        resolved
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, SourceRange};

    fn found() -> ResolutionResult {
        ResolutionResult::Resolved(Location::new(
            "AppConfig.java",
            SourceRange::on_line(4, 11, 3),
        ))
    }

    #[test]
    fn test_begin_claims_once() {
        let cache = AnalysisCache::new("Foo.java", EventBroadcaster::default());
        let v = DocumentVersion::INITIAL;
        assert!(cache.begin(v, "Foo"));
        assert!(!cache.begin(v, "Foo"));
        assert_eq!(cache.get("Foo"), Some(CacheEntry::Pending));
    }

    #[test]
    fn test_newer_version_clears_wholesale() {
        let cache = AnalysisCache::new("Foo.java", EventBroadcaster::default());
        let v1 = DocumentVersion::INITIAL;
        assert!(cache.begin(v1, "Foo"));
        assert!(cache.complete(v1, "Foo", found()));
        assert!(cache.begin(v1, "Bar"));
        assert_eq!(cache.len(), 2);

        assert!(cache.observe(v1.next()));
        assert!(cache.is_empty());
        assert!(!cache.observe(v1));
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let cache = AnalysisCache::new("Foo.java", EventBroadcaster::default());
        let v1 = DocumentVersion::INITIAL;
        assert!(cache.begin(v1, "Foo"));
        cache.observe(v1.next());

        assert!(!cache.complete(v1, "Foo", found()));
        assert_eq!(cache.get("Foo"), None);
        assert!(!cache.begin(v1, "Foo"));
    }

    #[tokio::test]
    async fn test_completion_notifies() {
        let events = EventBroadcaster::new(4);
        let mut rx = events.subscribe();
        let cache = AnalysisCache::new("Foo.java", events);
        let v = DocumentVersion::INITIAL;
        cache.begin(v, "Foo");
        cache.complete(v, "Foo", ResolutionResult::Unresolved);

        match rx.recv().await.unwrap() {
            AnalysisEvent::ResolutionCompleted {
                class_name,
                resolved,
                ..
            } => {
                assert_eq!(class_name, "Foo");
                assert!(!resolved);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(cache.resolved(), vec![("Foo".to_string(), ResolutionResult::Unresolved)]);
    }
}
