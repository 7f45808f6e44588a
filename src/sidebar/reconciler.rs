//! Merge layer between the server's session list and optimistic local
//! changes. Nothing here talks to the store.

use std::collections::{HashMap, HashSet};

use crate::{
    db::models::{Session, SessionPatch},
    log_debug,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Default)]
pub struct SessionListReconciler {
    server: Vec<Session>,
    added: Vec<Session>,
    deleted: HashSet<String>,
    overrides: HashMap<String, SessionPatch>,
}

impl SessionListReconciler {
    pub fn new(server: Vec<Session>) -> Self {
        let mut reconciler = Self::default();
        reconciler.set_server_sessions(server);
        reconciler
    }

    /// Replaces the server list and prunes bookkeeping the server has caught
    /// up with: adds that now appear server-side, deletes whose rows are gone,
    /// and overrides the server row already reflects.
    pub fn set_server_sessions(&mut self, server: Vec<Session>) {
        self.server = server;
        let server_ids: HashSet<&str> = self.server.iter().map(|s| s.id.as_str()).collect();

        let adds_before = self.added.len();
        self.added
            .retain(|session| !server_ids.contains(session.id.as_str()));

        let deletes_before = self.deleted.len();
        self.deleted.retain(|id| server_ids.contains(id.as_str()));

        let overrides_before = self.overrides.len();
        let added = &self.added;
        let server_rows = &self.server;
        self.overrides.retain(|id, patch| {
            match server_rows.iter().find(|session| session.id == *id) {
                Some(row) => !patch.is_reflected_in(row),
                None => added.iter().any(|session| session.id == *id),
            }
        });

        let pruned = (adds_before - self.added.len())
            + (deletes_before - self.deleted.len())
            + (overrides_before - self.overrides.len());
        if pruned > 0 {
            log_debug!("Pruned {pruned} settled optimistic session entries");
        }
    }

    pub fn add_optimistic(&mut self, session: Session) {
        let known = self.server.iter().chain(&self.added).any(|s| s.id == session.id);
        if !known {
            self.added.push(session);
        }
    }

    /// Later patches for the same session win field by field.
    pub fn update_optimistic(&mut self, session_id: &str, patch: SessionPatch) {
        if patch.is_empty() {
            return;
        }
        self.overrides
            .entry(session_id.to_string())
            .or_default()
            .merge(patch);
    }

    /// Undoes a failed patch. Only fields that still hold the failed value
    /// are dropped, so earlier accepted writes and newer edits stay visible.
    pub fn revert_override(&mut self, session_id: &str, failed: &SessionPatch) {
        let Some(patch) = self.overrides.get_mut(session_id) else {
            return;
        };
        if failed.title.is_some() && patch.title == failed.title {
            patch.title = None;
        }
        if failed.status.is_some() && patch.status == failed.status {
            patch.status = None;
        }
        if patch.is_empty() {
            self.overrides.remove(session_id);
        }
    }

    /// Hides the session. An optimistic add for it is withdrawn and returned
    /// so the delete can be undone.
    pub fn mark_deleted(&mut self, session_id: &str) -> Option<Session> {
        self.deleted.insert(session_id.to_string());
        let index = self.added.iter().position(|s| s.id == session_id)?;
        Some(self.added.remove(index))
    }

    pub fn withdraw_delete(&mut self, session_id: &str, restored: Option<Session>) {
        self.deleted.remove(session_id);
        if let Some(session) = restored {
            self.add_optimistic(session);
        }
    }

    /// Server rows with overrides applied, then optimistic adds, minus
    /// pending deletes.
    pub fn visible_sessions(&self) -> Vec<Session> {
        self.server
            .iter()
            .chain(&self.added)
            .filter(|session| !self.deleted.contains(&session.id))
            .map(|session| {
                let mut session = session.clone();
                if let Some(patch) = self.overrides.get(&session.id) {
                    patch.apply_to(&mut session);
                }
                session
            })
            .collect()
    }

    pub fn pending_adds(&self) -> usize {
        self.added.len()
    }

    pub fn pending_deletes(&self) -> usize {
        self.deleted.len()
    }

    pub fn pending_overrides(&self) -> usize {
        self.overrides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SessionStatus;
    use chrono::Utc;

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: None,
            spark: format!("spark {id}"),
            perspectives: Vec::new(),
            status: SessionStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn converges_after_server_catches_up() {
        let mut reconciler = SessionListReconciler::new(vec![session("A"), session("B")]);
        reconciler.add_optimistic(session("C"));
        reconciler.mark_deleted("B");
        assert_eq!(ids(&reconciler.visible_sessions()), ["A", "C"]);

        // Create has propagated, delete has not.
        reconciler.set_server_sessions(vec![session("A"), session("B"), session("C")]);
        assert_eq!(ids(&reconciler.visible_sessions()), ["A", "C"]);
        assert_eq!(reconciler.pending_adds(), 0);
        assert_eq!(reconciler.pending_deletes(), 1);

        reconciler.set_server_sessions(vec![session("A"), session("C")]);
        assert_eq!(ids(&reconciler.visible_sessions()), ["A", "C"]);
        assert_eq!(reconciler.pending_deletes(), 0);
    }

    #[test]
    fn overrides_apply_until_server_reflects_them() {
        let mut reconciler = SessionListReconciler::new(vec![session("A")]);
        reconciler.update_optimistic("A", SessionPatch::title(Some("Night Train".into())));
        reconciler.update_optimistic("A", SessionPatch::status(SessionStatus::Completed));

        let visible = reconciler.visible_sessions();
        assert_eq!(visible[0].display_title(), "Night Train");
        assert_eq!(visible[0].status, SessionStatus::Completed);

        // Server has the title but not yet the status.
        let mut partial = session("A");
        partial.title = Some("Night Train".into());
        reconciler.set_server_sessions(vec![partial.clone()]);
        assert_eq!(reconciler.pending_overrides(), 1);

        partial.status = SessionStatus::Completed;
        reconciler.set_server_sessions(vec![partial]);
        assert_eq!(reconciler.pending_overrides(), 0);
    }

    #[test]
    fn revert_only_drops_the_failed_fields() {
        let mut reconciler = SessionListReconciler::new(vec![session("A")]);
        reconciler.update_optimistic("A", SessionPatch::title(Some("Night Train".into())));
        let failed = SessionPatch::status(SessionStatus::Archived);
        reconciler.update_optimistic("A", failed.clone());

        reconciler.revert_override("A", &failed);
        let visible = reconciler.visible_sessions();
        assert_eq!(visible[0].display_title(), "Night Train");
        assert_eq!(visible[0].status, SessionStatus::Active);
        assert_eq!(reconciler.pending_overrides(), 1);
    }

    #[test]
    fn revert_keeps_a_newer_value_for_the_same_field() {
        let mut reconciler = SessionListReconciler::new(vec![session("A")]);
        let failed = SessionPatch::title(Some("Draft Title".into()));
        reconciler.update_optimistic("A", failed.clone());
        reconciler.update_optimistic("A", SessionPatch::title(Some("Final Title".into())));

        reconciler.revert_override("A", &failed);
        assert_eq!(reconciler.visible_sessions()[0].display_title(), "Final Title");

        reconciler.revert_override("A", &SessionPatch::title(Some("Final Title".into())));
        assert_eq!(reconciler.pending_overrides(), 0);
    }

    #[test]
    fn overrides_for_vanished_rows_are_dropped() {
        let mut reconciler = SessionListReconciler::new(vec![session("A")]);
        reconciler.update_optimistic("A", SessionPatch::status(SessionStatus::Archived));
        reconciler.set_server_sessions(Vec::new());
        assert_eq!(reconciler.pending_overrides(), 0);
    }

    #[test]
    fn withdrawn_delete_restores_optimistic_add() {
        let mut reconciler = SessionListReconciler::default();
        reconciler.add_optimistic(session("C"));

        let restored = reconciler.mark_deleted("C");
        assert!(reconciler.visible_sessions().is_empty());

        reconciler.withdraw_delete("C", restored);
        assert_eq!(ids(&reconciler.visible_sessions()), ["C"]);
    }

    #[test]
    fn duplicate_optimistic_add_is_ignored() {
        let mut reconciler = SessionListReconciler::new(vec![session("A")]);
        reconciler.add_optimistic(session("A"));
        reconciler.add_optimistic(session("B"));
        reconciler.add_optimistic(session("B"));
        assert_eq!(ids(&reconciler.visible_sessions()), ["A", "B"]);
    }
}
