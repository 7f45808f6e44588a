//! Notifications emitted by the workspace for presentation code.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::workspace::{SaveScope, SaveStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkspaceEvent {
    StatusChanged { scope: SaveScope, status: SaveStatus },
    Toast { level: ToastLevel, message: String },
}

/// Fan-out of workspace events. Sending never fails from the caller's point
/// of view: with nobody subscribed the event is simply dropped.
#[derive(Clone)]
pub struct EventSink {
    tx: broadcast::Sender<WorkspaceEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.tx.subscribe()
    }

    pub fn status_changed(&self, scope: SaveScope, status: SaveStatus) {
        let _ = self.tx.send(WorkspaceEvent::StatusChanged { scope, status });
    }

    pub fn error_toast(&self, message: impl Into<String>) {
        let _ = self.tx.send(WorkspaceEvent::Toast {
            level: ToastLevel::Error,
            message: message.into(),
        });
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(64)
    }
}
