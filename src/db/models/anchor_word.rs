use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of anchor word slots per session.
pub const ANCHOR_SLOTS: usize = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnchorWord {
    pub id: String,
    pub session_id: String,
    pub word: String,
    /// Perspective index the word was lifted from, when known.
    pub source_box: Option<u32>,
    pub position: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnchorWord {
    pub session_id: String,
    pub word: String,
    pub source_box: Option<u32>,
    pub position: u8,
}
