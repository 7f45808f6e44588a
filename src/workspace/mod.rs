//! Session workspace: local-first editing state for one open session and the
//! debounced commits that carry it to the remote store.

pub mod anchors;
pub mod boxes;
pub mod controller;
pub mod debounce;
pub mod draft;
pub mod entity;
pub mod rhymes;
pub mod snapshot;
pub mod status;

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

pub use anchors::{AnchorCommit, AnchorSlot, AnchorSlots};
pub use boxes::{BoxEditor, BoxState};
pub use controller::SessionWorkspace;
pub use debounce::Debouncer;
pub use draft::DraftState;
pub use entity::{EntityRef, LocalId};
pub use rhymes::RhymePalette;
pub use snapshot::WorkspaceSnapshot;
pub use status::{SaveScope, SaveStatus, StatusBoard};

/// Quiet periods before an edit is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub box_debounce: Duration,
    pub anchor_debounce: Duration,
    pub draft_debounce: Duration,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            box_debounce: Duration::from_millis(1000),
            anchor_debounce: Duration::from_millis(500),
            draft_debounce: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("anchor position {0} is outside the slot range")]
    InvalidPosition(u8),

    #[error("no box for perspective {0}")]
    UnknownPerspective(u32),

    #[error("box '{0}' is not part of this session")]
    UnknownBox(String),

    #[error("anchor word '{0}' is not saved in this session")]
    UnknownAnchor(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
