//! Remote store contract.
//!
//! The workspace and the session flows only ever talk to persistence through
//! [`RemoteStore`]. Each method is a single-row (or single-filter) operation;
//! nothing here spans entities or runs inside a transaction.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{
    AnchorWord, BoxPatch, Draft, NewAnchorWord, NewBox, NewDraft, NewRhyme, NewSession, Rhyme,
    Session, SessionPatch, WritingBox,
};

pub use memory::{InMemoryStore, StoreCall};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} row '{id}' not found")]
    NotFound { table: &'static str, id: String },

    #[error("conflicting write on {table}: {detail}")]
    Conflict { table: &'static str, detail: String },

    #[error("not authorized to access {table}")]
    Unauthorized { table: &'static str },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(table: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            table,
            id: id.into(),
        }
    }

    pub fn conflict(table: &'static str, detail: impl Into<String>) -> Self {
        Self::Conflict {
            table,
            detail: detail.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row-level CRUD over the `sessions`, `boxes`, `anchor_words`, `rhymes` and
/// `drafts` tables.
///
/// List operations return rows in the order the workspace expects:
/// sessions by `updated_at` descending, boxes by `perspective_index`, anchor
/// words and rhymes by `position`, drafts by `version` descending.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_session(&self, user_id: &str, session_id: &str) -> StoreResult<Option<Session>>;
    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>>;
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session>;
    async fn update_session(&self, session_id: &str, patch: SessionPatch) -> StoreResult<()>;
    async fn delete_session(&self, session_id: &str) -> StoreResult<()>;

    async fn list_boxes(&self, session_id: &str) -> StoreResult<Vec<WritingBox>>;
    async fn insert_boxes(&self, boxes: Vec<NewBox>) -> StoreResult<Vec<WritingBox>>;
    async fn update_box(&self, box_id: &str, patch: BoxPatch) -> StoreResult<()>;

    async fn list_anchor_words(&self, session_id: &str) -> StoreResult<Vec<AnchorWord>>;
    async fn insert_anchor_word(&self, anchor: NewAnchorWord) -> StoreResult<AnchorWord>;
    async fn update_anchor_word(&self, anchor_id: &str, word: &str) -> StoreResult<()>;
    async fn delete_anchor_word(&self, anchor_id: &str) -> StoreResult<()>;

    async fn list_rhymes(&self, anchor_word_ids: &[String]) -> StoreResult<Vec<Rhyme>>;
    async fn insert_rhyme(&self, rhyme: NewRhyme) -> StoreResult<Rhyme>;
    async fn delete_rhyme(&self, rhyme_id: &str) -> StoreResult<()>;

    async fn list_drafts(&self, session_id: &str) -> StoreResult<Vec<Draft>>;
    async fn insert_draft(&self, draft: NewDraft) -> StoreResult<Draft>;
    async fn update_draft(&self, draft_id: &str, content: &str) -> StoreResult<()>;
}
