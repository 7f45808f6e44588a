//! Freewriting box models. One box exists per perspective of a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WritingBox {
    pub id: String,
    pub session_id: String,
    pub perspective_index: u32,
    pub content: String,
    pub duration_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBox {
    pub session_id: String,
    pub perspective_index: u32,
    pub content: String,
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxPatch {
    pub content: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl BoxPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            duration_seconds: None,
        }
    }
}
