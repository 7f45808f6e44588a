use async_trait::async_trait;
use rusqlite::ErrorCode;

use super::{
    models::{
        AnchorWord, BoxPatch, Draft, NewAnchorWord, NewBox, NewDraft, NewRhyme, NewSession, Rhyme,
        Session, SessionPatch, WritingBox,
    },
    Database,
};
use crate::store::{RemoteStore, StoreError, StoreResult};

/// Typed errors raised by the repositories pass through unchanged. Unique
/// and check constraint violations surface as `Conflict`; everything else is
/// a backend failure.
fn store_error(table: &'static str, err: anyhow::Error) -> StoreError {
    let err = match err.downcast::<StoreError>() {
        Ok(store_err) => return store_err,
        Err(err) => err,
    };

    let violated = err
        .downcast_ref::<rusqlite::Error>()
        .and_then(|sqlite_err| sqlite_err.sqlite_error_code())
        .map_or(false, |code| code == ErrorCode::ConstraintViolation);

    if violated {
        StoreError::conflict(table, err.to_string())
    } else {
        StoreError::Backend(err)
    }
}

#[async_trait]
impl RemoteStore for Database {
    async fn fetch_session(&self, user_id: &str, session_id: &str) -> StoreResult<Option<Session>> {
        self.get_session_for_user(user_id, session_id)
            .await
            .map_err(|err| store_error("sessions", err))
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        self.list_sessions_for_user(user_id)
            .await
            .map_err(|err| store_error("sessions", err))
    }

    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        self.insert_session_row(session)
            .await
            .map_err(|err| store_error("sessions", err))
    }

    async fn update_session(&self, session_id: &str, patch: SessionPatch) -> StoreResult<()> {
        self.patch_session(session_id, patch)
            .await
            .map_err(|err| store_error("sessions", err))
    }

    async fn delete_session(&self, session_id: &str) -> StoreResult<()> {
        self.delete_session_row(session_id)
            .await
            .map_err(|err| store_error("sessions", err))
    }

    async fn list_boxes(&self, session_id: &str) -> StoreResult<Vec<WritingBox>> {
        self.get_boxes_for_session(session_id)
            .await
            .map_err(|err| store_error("boxes", err))
    }

    async fn insert_boxes(&self, boxes: Vec<NewBox>) -> StoreResult<Vec<WritingBox>> {
        self.insert_box_rows(boxes)
            .await
            .map_err(|err| store_error("boxes", err))
    }

    async fn update_box(&self, box_id: &str, patch: BoxPatch) -> StoreResult<()> {
        self.patch_box(box_id, patch)
            .await
            .map_err(|err| store_error("boxes", err))
    }

    async fn list_anchor_words(&self, session_id: &str) -> StoreResult<Vec<AnchorWord>> {
        self.get_anchor_words_for_session(session_id)
            .await
            .map_err(|err| store_error("anchor_words", err))
    }

    async fn insert_anchor_word(&self, anchor: NewAnchorWord) -> StoreResult<AnchorWord> {
        self.insert_anchor_word_row(anchor)
            .await
            .map_err(|err| store_error("anchor_words", err))
    }

    async fn update_anchor_word(&self, anchor_id: &str, word: &str) -> StoreResult<()> {
        self.rename_anchor_word(anchor_id, word)
            .await
            .map_err(|err| store_error("anchor_words", err))
    }

    async fn delete_anchor_word(&self, anchor_id: &str) -> StoreResult<()> {
        self.delete_anchor_word_row(anchor_id)
            .await
            .map_err(|err| store_error("anchor_words", err))
    }

    async fn list_rhymes(&self, anchor_word_ids: &[String]) -> StoreResult<Vec<Rhyme>> {
        self.get_rhymes_for_anchors(anchor_word_ids)
            .await
            .map_err(|err| store_error("rhymes", err))
    }

    async fn insert_rhyme(&self, rhyme: NewRhyme) -> StoreResult<Rhyme> {
        self.insert_rhyme_row(rhyme)
            .await
            .map_err(|err| store_error("rhymes", err))
    }

    async fn delete_rhyme(&self, rhyme_id: &str) -> StoreResult<()> {
        self.delete_rhyme_row(rhyme_id)
            .await
            .map_err(|err| store_error("rhymes", err))
    }

    async fn list_drafts(&self, session_id: &str) -> StoreResult<Vec<Draft>> {
        self.get_drafts_for_session(session_id)
            .await
            .map_err(|err| store_error("drafts", err))
    }

    async fn insert_draft(&self, draft: NewDraft) -> StoreResult<Draft> {
        self.insert_draft_row(draft)
            .await
            .map_err(|err| store_error("drafts", err))
    }

    async fn update_draft(&self, draft_id: &str, content: &str) -> StoreResult<()> {
        self.update_draft_content(draft_id, content)
            .await
            .map_err(|err| store_error("drafts", err))
    }
}
