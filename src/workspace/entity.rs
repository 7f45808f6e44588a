use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier handed out to placeholder entities before the store has
/// assigned a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LocalId(u64);

impl LocalId {
    pub fn next() -> Self {
        Self(NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a workspace entity: a local placeholder awaiting its first
/// successful write, or a row the store has confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "camelCase")]
pub enum EntityRef {
    Pending(LocalId),
    Confirmed(String),
}

impl EntityRef {
    pub fn pending() -> Self {
        EntityRef::Pending(LocalId::next())
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            EntityRef::Confirmed(id) => Some(id),
            EntityRef::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, EntityRef::Pending(_))
    }
}
