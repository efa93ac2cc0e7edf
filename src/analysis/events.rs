//! Notifications for presentation layers.
//!
//! Resolution results arrive after a scan has already been published; the
//! consumer subscribes here and re-reads the analysis when told to.

use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::types::DocumentVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    /// An external resolution for `class_name` finished and was cached.
    ResolutionCompleted {
        path: PathBuf,
        version: DocumentVersion,
        class_name: String,
        resolved: bool,
    },
    /// A scan result for the latest version of the document is available.
    AnalysisPublished {
        path: PathBuf,
        version: DocumentVersion,
    },
}

/// Fans analysis events out to any number of subscribers.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<AnalysisEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: AnalysisEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "{event:?} to {count} subscribers");
            }
            Err(_) => {
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
