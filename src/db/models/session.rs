//! Session-related data models.
//!
//! A session is the aggregate root for boxes, anchor words and drafts. Its
//! spark and perspectives are fixed at creation; only the title and the
//! lifecycle status change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Archived,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Archived => "archived",
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// One angle the songwriter freewrites from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Perspective {
    pub label: String,
    pub description: String,
}

impl Perspective {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub spark: String,
    pub perspectives: Vec<Perspective>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub spark: String,
    pub perspectives: Vec<Perspective>,
    pub status: SessionStatus,
}

/// Partial update of the mutable session fields.
///
/// `title: Some(None)` clears the title; `title: None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    pub title: Option<Option<String>>,
    pub status: Option<SessionStatus>,
}

impl SessionPatch {
    pub fn title(title: Option<String>) -> Self {
        Self {
            title: Some(title),
            status: None,
        }
    }

    pub fn status(status: SessionStatus) -> Self {
        Self {
            title: None,
            status: Some(status),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none()
    }

    pub fn apply_to(&self, session: &mut Session) {
        if let Some(title) = &self.title {
            session.title = title.clone();
        }
        if let Some(status) = self.status {
            session.status = status;
        }
    }

    /// Later fields win.
    pub fn merge(&mut self, newer: SessionPatch) {
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.status.is_some() {
            self.status = newer.status;
        }
    }

    /// True once every field carried by the patch already holds in `session`.
    pub fn is_reflected_in(&self, session: &Session) -> bool {
        let title_matches = self
            .title
            .as_ref()
            .map_or(true, |title| *title == session.title);
        let status_matches = self.status.map_or(true, |status| status == session.status);
        title_matches && status_matches
    }
}
