//! In-memory [`RemoteStore`] that mirrors the SQLite schema constraints and
//! records every write it receives. Failures and latency can be injected so
//! the autosave paths can be driven through their error branches.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{RemoteStore, StoreError, StoreResult};
use crate::db::models::{
    AnchorWord, BoxPatch, Draft, NewAnchorWord, NewBox, NewDraft, NewRhyme, NewSession, Rhyme,
    Session, SessionPatch, WritingBox, ANCHOR_SLOTS,
};

/// A write observed by the store, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    InsertSession { user_id: String },
    UpdateSession { id: String, patch: SessionPatch },
    DeleteSession { id: String },
    InsertBoxes { session_id: String, count: usize },
    UpdateBox { id: String, patch: BoxPatch },
    InsertAnchorWord { position: u8, word: String },
    UpdateAnchorWord { id: String, word: String },
    DeleteAnchorWord { id: String },
    InsertRhyme { anchor_word_id: String, word: String, position: u32 },
    DeleteRhyme { id: String },
    InsertDraft { session_id: String, content: String },
    UpdateDraft { id: String, content: String },
}

#[derive(Default)]
struct Tables {
    sessions: Vec<Session>,
    boxes: Vec<WritingBox>,
    anchor_words: Vec<AnchorWord>,
    rhymes: Vec<Rhyme>,
    drafts: Vec<Draft>,
}

#[derive(Default)]
struct Faults {
    fail_all_writes: bool,
    fail_next: usize,
    latency: Duration,
    scripted_latency: VecDeque<Duration>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    calls: Mutex<Vec<StoreCall>>,
    faults: Mutex<Faults>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write recorded so far.
    pub fn writes(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_writes(&self) {
        lock(&self.calls).clear();
    }

    /// Make every subsequent write fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.faults).fail_all_writes = fail;
    }

    /// Fail only the next `count` writes.
    pub fn fail_next_writes(&self, count: usize) {
        lock(&self.faults).fail_next = count;
    }

    /// Delay applied to every write before it lands.
    pub fn set_latency(&self, latency: Duration) {
        lock(&self.faults).latency = latency;
    }

    /// One-shot delays consumed by the next writes, in order, ahead of the
    /// fixed latency.
    pub fn script_latency(&self, delays: impl IntoIterator<Item = Duration>) {
        lock(&self.faults).scripted_latency.extend(delays);
    }

    pub fn sessions(&self) -> Vec<Session> {
        lock(&self.tables).sessions.clone()
    }

    pub fn boxes(&self) -> Vec<WritingBox> {
        lock(&self.tables).boxes.clone()
    }

    pub fn anchor_words(&self) -> Vec<AnchorWord> {
        lock(&self.tables).anchor_words.clone()
    }

    pub fn rhymes(&self) -> Vec<Rhyme> {
        lock(&self.tables).rhymes.clone()
    }

    pub fn drafts(&self) -> Vec<Draft> {
        lock(&self.tables).drafts.clone()
    }

    /// Records the call, waits out any injected latency and reports an
    /// injected failure if one is armed.
    async fn begin_write(&self, call: StoreCall) -> StoreResult<()> {
        lock(&self.calls).push(call);

        let (delay, fail) = {
            let mut faults = lock(&self.faults);
            let delay = faults
                .scripted_latency
                .pop_front()
                .unwrap_or(faults.latency);
            let fail = if faults.fail_next > 0 {
                faults.fail_next -= 1;
                true
            } else {
                faults.fail_all_writes
            };
            (delay, fail)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if fail {
            return Err(StoreError::Backend(anyhow!("injected write failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn fetch_session(&self, user_id: &str, session_id: &str) -> StoreResult<Option<Session>> {
        let tables = lock(&self.tables);
        Ok(tables
            .sessions
            .iter()
            .find(|session| session.id == session_id && session.user_id == user_id)
            .cloned())
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        let tables = lock(&self.tables);
        let mut sessions: Vec<Session> = tables
            .sessions
            .iter()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        self.begin_write(StoreCall::InsertSession {
            user_id: session.user_id.clone(),
        })
        .await?;

        let now = Utc::now();
        let row = Session {
            id: new_id(),
            user_id: session.user_id,
            title: None,
            spark: session.spark,
            perspectives: session.perspectives,
            status: session.status,
            created_at: now,
            updated_at: now,
        };
        lock(&self.tables).sessions.push(row.clone());
        Ok(row)
    }

    async fn update_session(&self, session_id: &str, patch: SessionPatch) -> StoreResult<()> {
        self.begin_write(StoreCall::UpdateSession {
            id: session_id.to_string(),
            patch: patch.clone(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let session = tables
            .sessions
            .iter_mut()
            .find(|session| session.id == session_id)
            .ok_or_else(|| StoreError::not_found("sessions", session_id))?;
        patch.apply_to(session);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> StoreResult<()> {
        self.begin_write(StoreCall::DeleteSession {
            id: session_id.to_string(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let anchor_ids: Vec<String> = tables
            .anchor_words
            .iter()
            .filter(|anchor| anchor.session_id == session_id)
            .map(|anchor| anchor.id.clone())
            .collect();
        tables.sessions.retain(|session| session.id != session_id);
        tables.boxes.retain(|row| row.session_id != session_id);
        tables.anchor_words.retain(|anchor| anchor.session_id != session_id);
        tables
            .rhymes
            .retain(|rhyme| !anchor_ids.contains(&rhyme.anchor_word_id));
        tables.drafts.retain(|draft| draft.session_id != session_id);
        Ok(())
    }

    async fn list_boxes(&self, session_id: &str) -> StoreResult<Vec<WritingBox>> {
        let tables = lock(&self.tables);
        let mut boxes: Vec<WritingBox> = tables
            .boxes
            .iter()
            .filter(|row| row.session_id == session_id)
            .cloned()
            .collect();
        boxes.sort_by_key(|row| row.perspective_index);
        Ok(boxes)
    }

    async fn insert_boxes(&self, boxes: Vec<NewBox>) -> StoreResult<Vec<WritingBox>> {
        let session_id = boxes
            .first()
            .map(|row| row.session_id.clone())
            .unwrap_or_default();
        self.begin_write(StoreCall::InsertBoxes {
            session_id,
            count: boxes.len(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        for new_box in &boxes {
            let taken = tables.boxes.iter().any(|row| {
                row.session_id == new_box.session_id
                    && row.perspective_index == new_box.perspective_index
            });
            if taken {
                return Err(StoreError::conflict(
                    "boxes",
                    format!("perspective {} already has a box", new_box.perspective_index),
                ));
            }
        }

        let now = Utc::now();
        let rows: Vec<WritingBox> = boxes
            .into_iter()
            .map(|new_box| WritingBox {
                id: new_id(),
                session_id: new_box.session_id,
                perspective_index: new_box.perspective_index,
                content: new_box.content,
                duration_seconds: new_box.duration_seconds,
                created_at: now,
                updated_at: now,
            })
            .collect();
        tables.boxes.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update_box(&self, box_id: &str, patch: BoxPatch) -> StoreResult<()> {
        self.begin_write(StoreCall::UpdateBox {
            id: box_id.to_string(),
            patch: patch.clone(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let row = tables
            .boxes
            .iter_mut()
            .find(|row| row.id == box_id)
            .ok_or_else(|| StoreError::not_found("boxes", box_id))?;
        if let Some(content) = patch.content {
            row.content = content;
        }
        if let Some(duration) = patch.duration_seconds {
            row.duration_seconds = Some(duration);
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn list_anchor_words(&self, session_id: &str) -> StoreResult<Vec<AnchorWord>> {
        let tables = lock(&self.tables);
        let mut anchors: Vec<AnchorWord> = tables
            .anchor_words
            .iter()
            .filter(|anchor| anchor.session_id == session_id)
            .cloned()
            .collect();
        anchors.sort_by_key(|anchor| anchor.position);
        Ok(anchors)
    }

    async fn insert_anchor_word(&self, anchor: NewAnchorWord) -> StoreResult<AnchorWord> {
        self.begin_write(StoreCall::InsertAnchorWord {
            position: anchor.position,
            word: anchor.word.clone(),
        })
        .await?;

        if usize::from(anchor.position) >= ANCHOR_SLOTS {
            return Err(StoreError::conflict(
                "anchor_words",
                format!("position {} out of range", anchor.position),
            ));
        }

        let mut tables = lock(&self.tables);
        let taken = tables
            .anchor_words
            .iter()
            .any(|row| row.session_id == anchor.session_id && row.position == anchor.position);
        if taken {
            return Err(StoreError::conflict(
                "anchor_words",
                format!("position {} already occupied", anchor.position),
            ));
        }

        let row = AnchorWord {
            id: new_id(),
            session_id: anchor.session_id,
            word: anchor.word,
            source_box: anchor.source_box,
            position: anchor.position,
            created_at: Utc::now(),
        };
        tables.anchor_words.push(row.clone());
        Ok(row)
    }

    async fn update_anchor_word(&self, anchor_id: &str, word: &str) -> StoreResult<()> {
        self.begin_write(StoreCall::UpdateAnchorWord {
            id: anchor_id.to_string(),
            word: word.to_string(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let row = tables
            .anchor_words
            .iter_mut()
            .find(|row| row.id == anchor_id)
            .ok_or_else(|| StoreError::not_found("anchor_words", anchor_id))?;
        row.word = word.to_string();
        Ok(())
    }

    async fn delete_anchor_word(&self, anchor_id: &str) -> StoreResult<()> {
        self.begin_write(StoreCall::DeleteAnchorWord {
            id: anchor_id.to_string(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        tables.anchor_words.retain(|row| row.id != anchor_id);
        tables.rhymes.retain(|rhyme| rhyme.anchor_word_id != anchor_id);
        Ok(())
    }

    async fn list_rhymes(&self, anchor_word_ids: &[String]) -> StoreResult<Vec<Rhyme>> {
        let tables = lock(&self.tables);
        let mut rhymes: Vec<Rhyme> = tables
            .rhymes
            .iter()
            .filter(|rhyme| anchor_word_ids.contains(&rhyme.anchor_word_id))
            .cloned()
            .collect();
        rhymes.sort_by_key(|rhyme| rhyme.position);
        Ok(rhymes)
    }

    async fn insert_rhyme(&self, rhyme: NewRhyme) -> StoreResult<Rhyme> {
        self.begin_write(StoreCall::InsertRhyme {
            anchor_word_id: rhyme.anchor_word_id.clone(),
            word: rhyme.word.clone(),
            position: rhyme.position,
        })
        .await?;

        let mut tables = lock(&self.tables);
        if !tables
            .anchor_words
            .iter()
            .any(|anchor| anchor.id == rhyme.anchor_word_id)
        {
            return Err(StoreError::not_found("anchor_words", rhyme.anchor_word_id));
        }

        let row = Rhyme {
            id: new_id(),
            anchor_word_id: rhyme.anchor_word_id,
            word: rhyme.word,
            rhyme_type: rhyme.rhyme_type,
            source: rhyme.source,
            position: rhyme.position,
            created_at: Utc::now(),
        };
        tables.rhymes.push(row.clone());
        Ok(row)
    }

    async fn delete_rhyme(&self, rhyme_id: &str) -> StoreResult<()> {
        self.begin_write(StoreCall::DeleteRhyme {
            id: rhyme_id.to_string(),
        })
        .await?;

        lock(&self.tables).rhymes.retain(|rhyme| rhyme.id != rhyme_id);
        Ok(())
    }

    async fn list_drafts(&self, session_id: &str) -> StoreResult<Vec<Draft>> {
        let tables = lock(&self.tables);
        let mut drafts: Vec<Draft> = tables
            .drafts
            .iter()
            .filter(|draft| draft.session_id == session_id)
            .cloned()
            .collect();
        drafts.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(drafts)
    }

    async fn insert_draft(&self, draft: NewDraft) -> StoreResult<Draft> {
        self.begin_write(StoreCall::InsertDraft {
            session_id: draft.session_id.clone(),
            content: draft.content.clone(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let taken = tables
            .drafts
            .iter()
            .any(|row| row.session_id == draft.session_id && row.version == draft.version);
        if taken {
            return Err(StoreError::conflict(
                "drafts",
                format!("version {} already exists", draft.version),
            ));
        }

        let now = Utc::now();
        let row = Draft {
            id: new_id(),
            session_id: draft.session_id,
            content: draft.content,
            version: draft.version,
            created_at: now,
            updated_at: now,
        };
        tables.drafts.push(row.clone());
        Ok(row)
    }

    async fn update_draft(&self, draft_id: &str, content: &str) -> StoreResult<()> {
        self.begin_write(StoreCall::UpdateDraft {
            id: draft_id.to_string(),
            content: content.to_string(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let row = tables
            .drafts
            .iter_mut()
            .find(|row| row.id == draft_id)
            .ok_or_else(|| StoreError::not_found("drafts", draft_id))?;
        row.content = content.to_string();
        row.updated_at = Utc::now();
        Ok(())
    }
}
