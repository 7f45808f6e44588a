use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use super::{
    anchors::{AnchorCommit, AnchorSlot, AnchorSlots},
    boxes::{BoxEditor, BoxState},
    debounce::Debouncer,
    draft::DraftState,
    rhymes::RhymePalette,
    snapshot::WorkspaceSnapshot,
    status::{SaveScope, SaveStatus, StatusBoard},
    WorkspaceConfig, WorkspaceError,
};
use crate::{
    db::models::{
        BoxPatch, NewAnchorWord, NewDraft, NewRhyme, Rhyme, RhymeSource, RhymeType, Session,
        ANCHOR_SLOTS,
    },
    events::{EventSink, WorkspaceEvent},
    log_debug, log_error, log_info, log_warn,
    store::{RemoteStore, StoreError},
};

const ENABLE_LOGS: bool = true;

const BOX_SAVE_FAILED: &str = "Failed to save box";
const ANCHOR_SAVE_FAILED: &str = "Failed to save anchor word";
const RHYME_ADD_FAILED: &str = "Failed to add rhyme";
const RHYME_REMOVE_FAILED: &str = "Failed to remove rhyme";
const DRAFT_SAVE_FAILED: &str = "Failed to save draft";

struct WorkspaceState {
    session: Session,
    active_perspective: u32,
    boxes: BoxEditor,
    anchors: AnchorSlots,
    rhymes: RhymePalette,
    draft: DraftState,
    statuses: StatusBoard,
}

impl WorkspaceState {
    /// Records an edit on `scope`. Returns the commit ticket and whether the
    /// scope just turned unsaved.
    fn note_edit(&mut self, scope: &SaveScope) -> (u64, bool) {
        let was_unsaved = self.statuses.status(scope) == SaveStatus::Unsaved;
        (self.statuses.mark_edited(scope), !was_unsaved)
    }
}

struct Shared {
    state: Mutex<WorkspaceState>,
    store: Arc<dyn RemoteStore>,
    events: EventSink,
}

impl Shared {
    fn with_state<R>(&self, apply: impl FnOnce(&mut WorkspaceState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard)
    }

    fn announce_edit(&self, scope: &SaveScope, turned_unsaved: bool) {
        if turned_unsaved {
            self.events
                .status_changed(scope.clone(), SaveStatus::Unsaved);
        }
    }

    fn begin(&self, scope: &SaveScope, ticket: u64) {
        if let Some(status) = self.with_state(|state| state.statuses.mark_saving(scope, ticket)) {
            self.events.status_changed(scope.clone(), status);
        }
    }

    fn succeed(&self, scope: &SaveScope, ticket: u64) {
        if let Some(status) = self.with_state(|state| state.statuses.mark_saved(scope, ticket)) {
            self.events.status_changed(scope.clone(), status);
        }
    }

    /// Failed writes leave local text untouched: the scope goes back to
    /// unsaved and the user gets a toast. Nothing is retried.
    fn fail(&self, scope: &SaveScope, message: &str, err: &StoreError) {
        log_error!("{message} ({scope:?}): {err}");
        if let Some(status) = self.with_state(|state| state.statuses.mark_failed(scope)) {
            self.events.status_changed(scope.clone(), status);
        }
        self.events.error_toast(message);
    }
}

/// Editing state of one open session.
///
/// Every `on_*` edit updates local state before returning and arms a
/// debounced commit for its scope: one scope per box, one per anchor slot,
/// one for the draft. Rhyme additions and removals are discrete actions and
/// go to the store straight away.
///
/// Cloning yields another handle to the same workspace.
#[derive(Clone)]
pub struct SessionWorkspace {
    shared: Arc<Shared>,
    debouncer: Arc<Debouncer<SaveScope>>,
    config: WorkspaceConfig,
}

impl SessionWorkspace {
    pub async fn open(
        store: Arc<dyn RemoteStore>,
        user_id: &str,
        session_id: &str,
        config: WorkspaceConfig,
    ) -> Result<Self, WorkspaceError> {
        let snapshot = WorkspaceSnapshot::load(&store, user_id, session_id).await?;
        Ok(Self::from_snapshot(store, snapshot, config))
    }

    pub fn from_snapshot(
        store: Arc<dyn RemoteStore>,
        snapshot: WorkspaceSnapshot,
        config: WorkspaceConfig,
    ) -> Self {
        let (anchors, unplaced) = AnchorSlots::from_rows(snapshot.anchor_words);
        for row in unplaced {
            log_warn!(
                "Skipping anchor word {} with unusable position {}",
                row.id,
                row.position
            );
        }

        let state = WorkspaceState {
            session: snapshot.session,
            active_perspective: 0,
            boxes: BoxEditor::from_rows(snapshot.boxes),
            anchors,
            rhymes: RhymePalette::from_rows(snapshot.rhymes),
            draft: DraftState::from_rows(snapshot.drafts),
            statuses: StatusBoard::default(),
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                store,
                events: EventSink::default(),
            }),
            debouncer: Arc::new(Debouncer::new()),
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.shared.events.subscribe()
    }

    // Boxes

    pub fn on_box_content_change(&self, box_id: &str, text: &str) -> Result<(), WorkspaceError> {
        let scope = SaveScope::Box(box_id.to_string());
        let (ticket, turned_unsaved) = self.shared.with_state(|state| {
            if !state.boxes.set_content(box_id, text) {
                return Err(WorkspaceError::UnknownBox(box_id.to_string()));
            }
            Ok(state.note_edit(&scope))
        })?;
        self.shared.announce_edit(&scope, turned_unsaved);

        let commit = commit_box(
            Arc::clone(&self.shared),
            scope.clone(),
            ticket,
            box_id.to_string(),
            BoxPatch::content(text),
        );
        self.debouncer
            .schedule(scope, self.config.box_debounce, commit);
        Ok(())
    }

    /// Chooses the box that receives timer ticks.
    pub fn set_active_perspective(&self, perspective_index: u32) -> Result<(), WorkspaceError> {
        self.shared.with_state(|state| {
            if state.boxes.for_perspective(perspective_index).is_none() {
                return Err(WorkspaceError::UnknownPerspective(perspective_index));
            }
            state.active_perspective = perspective_index;
            Ok(())
        })
    }

    pub fn active_perspective(&self) -> u32 {
        self.shared.with_state(|state| state.active_perspective)
    }

    /// Local only. Elapsed time is persisted by
    /// [`SessionWorkspace::on_timer_complete`].
    pub fn on_timer_tick(&self, elapsed_seconds: u32) {
        self.shared.with_state(|state| {
            let index = state.active_perspective;
            state.boxes.record_elapsed(index, elapsed_seconds);
        });
    }

    /// Writes the active box's content and duration right away, replacing
    /// any debounced content save still armed for it.
    pub fn on_timer_complete(&self) {
        let prepared = self.shared.with_state(|state| {
            let (box_id, patch) = state.boxes.completion_patch(state.active_perspective)?;
            let scope = SaveScope::Box(box_id.clone());
            let (ticket, turned_unsaved) = state.note_edit(&scope);
            Some((scope, ticket, turned_unsaved, box_id, patch))
        });

        let Some((scope, ticket, turned_unsaved, box_id, patch)) = prepared else {
            log_warn!("Timer completed without a box for the active perspective");
            return;
        };
        self.shared.announce_edit(&scope, turned_unsaved);

        let commit = commit_box(Arc::clone(&self.shared), scope.clone(), ticket, box_id, patch);
        self.debouncer.fire_now(scope, commit);
    }

    // Anchor words

    pub fn on_anchor_change(&self, position: u8, text: &str) -> Result<(), WorkspaceError> {
        if usize::from(position) >= ANCHOR_SLOTS {
            return Err(WorkspaceError::InvalidPosition(position));
        }

        let scope = SaveScope::AnchorSlot(position);
        let (ticket, turned_unsaved) = self.shared.with_state(|state| {
            state.anchors.edit(position, text);
            state.note_edit(&scope)
        });
        self.shared.announce_edit(&scope, turned_unsaved);

        let commit = commit_anchor(
            Arc::clone(&self.shared),
            scope.clone(),
            ticket,
            position,
            text.to_string(),
        );
        self.debouncer
            .schedule(scope, self.config.anchor_debounce, commit);
        Ok(())
    }

    // Rhymes

    /// Adds a manual rhyme at the end of the anchor's list. Blank words are
    /// ignored. Store failures are reported through the rhyme status and a
    /// toast, and yield `Ok(None)`.
    pub async fn add_rhyme(
        &self,
        anchor_id: &str,
        word: &str,
        rhyme_type: RhymeType,
    ) -> Result<Option<Rhyme>, WorkspaceError> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(None);
        }

        let scope = SaveScope::Rhymes;
        let (ticket, turned_unsaved, position) = self.shared.with_state(|state| {
            if !state.anchors.is_confirmed(anchor_id) {
                return Err(WorkspaceError::UnknownAnchor(anchor_id.to_string()));
            }
            let position = state.rhymes.reserve_position(anchor_id);
            let (ticket, turned_unsaved) = state.note_edit(&scope);
            Ok((ticket, turned_unsaved, position))
        })?;
        self.shared.announce_edit(&scope, turned_unsaved);
        self.shared.begin(&scope, ticket);

        let inserted = self
            .shared
            .store
            .insert_rhyme(NewRhyme {
                anchor_word_id: anchor_id.to_string(),
                word: word.to_string(),
                rhyme_type,
                source: RhymeSource::Manual,
                position,
            })
            .await;

        match inserted {
            Ok(row) => {
                self.shared
                    .with_state(|state| state.rhymes.append(row.clone()));
                self.shared.succeed(&scope, ticket);
                Ok(Some(row))
            }
            Err(err) => {
                self.shared
                    .with_state(|state| state.rhymes.release(anchor_id));
                self.shared.fail(&scope, RHYME_ADD_FAILED, &err);
                Ok(None)
            }
        }
    }

    /// Deletes a rhyme and drops it from its anchor's list. Returns whether
    /// the store accepted the delete.
    pub async fn remove_rhyme(&self, rhyme_id: &str, anchor_id: &str) -> bool {
        let scope = SaveScope::Rhymes;
        let (ticket, turned_unsaved) = self.shared.with_state(|state| state.note_edit(&scope));
        self.shared.announce_edit(&scope, turned_unsaved);
        self.shared.begin(&scope, ticket);

        match self.shared.store.delete_rhyme(rhyme_id).await {
            Ok(()) => {
                self.shared
                    .with_state(|state| state.rhymes.remove(anchor_id, rhyme_id));
                self.shared.succeed(&scope, ticket);
                true
            }
            Err(err) => {
                self.shared.fail(&scope, RHYME_REMOVE_FAILED, &err);
                false
            }
        }
    }

    // Draft

    pub fn on_draft_change(&self, text: &str) {
        let scope = SaveScope::Draft;
        let (ticket, turned_unsaved) = self.shared.with_state(|state| {
            state.draft.set_content(text);
            state.note_edit(&scope)
        });
        self.shared.announce_edit(&scope, turned_unsaved);

        let commit = commit_draft(Arc::clone(&self.shared), ticket, text.to_string());
        self.debouncer
            .schedule(scope, self.config.draft_debounce, commit);
    }

    // Views

    pub fn session(&self) -> Session {
        self.shared.with_state(|state| state.session.clone())
    }

    pub fn boxes(&self) -> Vec<BoxState> {
        self.shared.with_state(|state| state.boxes.boxes().to_vec())
    }

    pub fn box_state(&self, box_id: &str) -> Option<BoxState> {
        self.shared
            .with_state(|state| state.boxes.get(box_id).cloned())
    }

    pub fn anchor_slots(&self) -> Vec<Option<AnchorSlot>> {
        self.shared.with_state(|state| state.anchors.slots())
    }

    pub fn rhymes_for(&self, anchor_id: &str) -> Vec<Rhyme> {
        self.shared
            .with_state(|state| state.rhymes.rhymes_for(anchor_id).to_vec())
    }

    pub fn draft(&self) -> DraftState {
        self.shared.with_state(|state| state.draft.clone())
    }

    pub fn status(&self, scope: &SaveScope) -> SaveStatus {
        self.shared.with_state(|state| state.statuses.status(scope))
    }

    pub fn box_status(&self, box_id: &str) -> SaveStatus {
        self.status(&SaveScope::Box(box_id.to_string()))
    }

    /// Combined status of all nine anchor slots.
    pub fn anchors_status(&self) -> SaveStatus {
        self.shared.with_state(|state| {
            state
                .statuses
                .combined(|scope| matches!(scope, SaveScope::AnchorSlot(_)))
        })
    }

    pub fn rhymes_status(&self) -> SaveStatus {
        self.status(&SaveScope::Rhymes)
    }

    pub fn draft_status(&self) -> SaveStatus {
        self.status(&SaveScope::Draft)
    }

    /// No debounced commit is armed, running or queued.
    pub fn is_idle(&self) -> bool {
        self.debouncer.is_idle()
    }

    /// Tears the workspace down. Armed and queued commits are dropped, not
    /// flushed; writes already on the wire finish. Returns how many commits
    /// were dropped.
    pub fn close(&self) -> usize {
        let dropped = self.debouncer.cancel_all();
        let session_id = self.shared.with_state(|state| state.session.id.clone());
        if dropped > 0 {
            log_info!("Closed workspace {session_id}, dropped {dropped} pending saves");
        } else {
            log_debug!("Closed workspace {session_id}");
        }
        dropped
    }
}

async fn commit_box(
    shared: Arc<Shared>,
    scope: SaveScope,
    ticket: u64,
    box_id: String,
    patch: BoxPatch,
) {
    shared.begin(&scope, ticket);
    match shared.store.update_box(&box_id, patch).await {
        Ok(()) => shared.succeed(&scope, ticket),
        Err(err) => shared.fail(&scope, BOX_SAVE_FAILED, &err),
    }
}

/// Decides insert, update or delete when the commit runs, from the last
/// confirmed row of the slot.
async fn commit_anchor(
    shared: Arc<Shared>,
    scope: SaveScope,
    ticket: u64,
    position: u8,
    text: String,
) {
    shared.begin(&scope, ticket);
    let (session_id, plan) = shared.with_state(|state| {
        (
            state.session.id.clone(),
            state.anchors.plan(position, &text),
        )
    });

    let outcome = match plan {
        AnchorCommit::Noop => Ok(()),
        AnchorCommit::Insert { word } => shared
            .store
            .insert_anchor_word(NewAnchorWord {
                session_id,
                word,
                source_box: None,
                position,
            })
            .await
            .map(|row| {
                shared.with_state(|state| state.anchors.confirm_insert(row));
            }),
        AnchorCommit::Update { id, word } => shared
            .store
            .update_anchor_word(&id, &word)
            .await
            .map(|()| {
                shared.with_state(|state| state.anchors.confirm_update(position, &word));
            }),
        AnchorCommit::Delete { id } => {
            shared.store.delete_anchor_word(&id).await.map(|()| {
                shared.with_state(|state| {
                    state.anchors.confirm_delete(position);
                    // The store cascades the anchor's rhymes away with it.
                    state.rhymes.drop_anchor(&id);
                });
            })
        }
    };

    match outcome {
        Ok(()) => shared.succeed(&scope, ticket),
        Err(err) => shared.fail(&scope, ANCHOR_SAVE_FAILED, &err),
    }
}

/// Inserts version 1 when the session has no draft row yet, otherwise
/// updates the known row.
async fn commit_draft(shared: Arc<Shared>, ticket: u64, text: String) {
    let scope = SaveScope::Draft;
    shared.begin(&scope, ticket);
    let (session_id, draft_id) =
        shared.with_state(|state| (state.session.id.clone(), state.draft.id.clone()));

    let outcome = match draft_id {
        Some(id) => shared.store.update_draft(&id, &text).await,
        None => shared
            .store
            .insert_draft(NewDraft {
                session_id,
                content: text,
                version: 1,
            })
            .await
            .map(|row| {
                shared.with_state(|state| state.draft.confirm_insert(&row));
            }),
    };

    match outcome {
        Ok(()) => shared.succeed(&scope, ticket),
        Err(err) => shared.fail(&scope, DRAFT_SAVE_FAILED, &err),
    }
}
