use std::sync::Arc;

use super::WorkspaceError;
use crate::{
    db::models::{AnchorWord, Draft, Rhyme, Session, WritingBox},
    log_debug,
    store::RemoteStore,
};

const ENABLE_LOGS: bool = true;

/// Everything the workspace needs for one session, as fetched on open.
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
    pub session: Session,
    pub boxes: Vec<WritingBox>,
    pub anchor_words: Vec<AnchorWord>,
    pub rhymes: Vec<Rhyme>,
    pub drafts: Vec<Draft>,
}

impl WorkspaceSnapshot {
    /// Fetches the session row, boxes, anchor words and drafts concurrently,
    /// then the rhymes of the fetched anchor words. The rhyme query is
    /// skipped when there are no anchor words.
    pub async fn load(
        store: &Arc<dyn RemoteStore>,
        user_id: &str,
        session_id: &str,
    ) -> Result<Self, WorkspaceError> {
        let (session, boxes, anchor_words, drafts) = tokio::try_join!(
            store.fetch_session(user_id, session_id),
            store.list_boxes(session_id),
            store.list_anchor_words(session_id),
            store.list_drafts(session_id),
        )?;

        let session =
            session.ok_or_else(|| WorkspaceError::SessionNotFound(session_id.to_string()))?;

        let rhymes = if anchor_words.is_empty() {
            Vec::new()
        } else {
            let anchor_ids: Vec<String> = anchor_words.iter().map(|a| a.id.clone()).collect();
            store.list_rhymes(&anchor_ids).await?
        };

        log_debug!(
            "Loaded session {}: {} boxes, {} anchor words, {} rhymes, {} drafts",
            session.id,
            boxes.len(),
            anchor_words.len(),
            rhymes.len(),
            drafts.len()
        );

        Ok(Self {
            session,
            boxes,
            anchor_words,
            rhymes,
            drafts,
        })
    }
}
