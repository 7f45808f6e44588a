//! Save-status bookkeeping for every autosave scope.
//!
//! Each scope carries an edit counter. A commit remembers the counter value
//! it was issued for and may only move the scope to `Saving`/`Saved` while
//! that value is still current, so an in-flight write never reports `Saved`
//! over a newer local edit.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Unsaved,
    Saving,
    Saved,
}

/// Identity of one autosave timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum SaveScope {
    Box(String),
    AnchorSlot(u8),
    Rhymes,
    Draft,
}

#[derive(Debug, Clone, Copy)]
struct ScopeState {
    status: SaveStatus,
    edits: u64,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    scopes: HashMap<SaveScope, ScopeState>,
}

impl StatusBoard {
    pub fn status(&self, scope: &SaveScope) -> SaveStatus {
        self.scopes
            .get(scope)
            .map_or(SaveStatus::Saved, |state| state.status)
    }

    /// Combined status of every scope matching `filter`: unsaved beats
    /// saving beats saved.
    pub fn combined(&self, filter: impl Fn(&SaveScope) -> bool) -> SaveStatus {
        let mut combined = SaveStatus::Saved;
        for (scope, state) in &self.scopes {
            if !filter(scope) {
                continue;
            }
            match state.status {
                SaveStatus::Unsaved => return SaveStatus::Unsaved,
                SaveStatus::Saving => combined = SaveStatus::Saving,
                SaveStatus::Saved => {}
            }
        }
        combined
    }

    /// Records a local edit and returns the ticket its commit must carry.
    pub fn mark_edited(&mut self, scope: &SaveScope) -> u64 {
        let state = self.entry(scope);
        state.edits += 1;
        state.status = SaveStatus::Unsaved;
        state.edits
    }

    /// Returns the new status if it changed.
    pub fn mark_saving(&mut self, scope: &SaveScope, ticket: u64) -> Option<SaveStatus> {
        let state = self.entry(scope);
        if state.edits != ticket || state.status == SaveStatus::Saving {
            return None;
        }
        state.status = SaveStatus::Saving;
        Some(SaveStatus::Saving)
    }

    pub fn mark_saved(&mut self, scope: &SaveScope, ticket: u64) -> Option<SaveStatus> {
        let state = self.entry(scope);
        if state.edits != ticket || state.status == SaveStatus::Saved {
            return None;
        }
        state.status = SaveStatus::Saved;
        Some(SaveStatus::Saved)
    }

    pub fn mark_failed(&mut self, scope: &SaveScope) -> Option<SaveStatus> {
        let state = self.entry(scope);
        if state.status == SaveStatus::Unsaved {
            return None;
        }
        state.status = SaveStatus::Unsaved;
        Some(SaveStatus::Unsaved)
    }

    fn entry(&mut self, scope: &SaveScope) -> &mut ScopeState {
        self.scopes.entry(scope.clone()).or_insert(ScopeState {
            status: SaveStatus::Saved,
            edits: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_commit_cannot_report_saved() {
        let mut board = StatusBoard::default();
        let scope = SaveScope::Draft;

        let first = board.mark_edited(&scope);
        assert_eq!(board.mark_saving(&scope, first), Some(SaveStatus::Saving));

        let second = board.mark_edited(&scope);
        assert_eq!(board.status(&scope), SaveStatus::Unsaved);
        assert_eq!(board.mark_saved(&scope, first), None);
        assert_eq!(board.status(&scope), SaveStatus::Unsaved);

        board.mark_saving(&scope, second);
        assert_eq!(board.mark_saved(&scope, second), Some(SaveStatus::Saved));
    }

    #[test]
    fn failure_always_lands_on_unsaved() {
        let mut board = StatusBoard::default();
        let scope = SaveScope::Rhymes;

        let ticket = board.mark_edited(&scope);
        board.mark_saving(&scope, ticket);
        assert_eq!(board.mark_failed(&scope), Some(SaveStatus::Unsaved));
        assert_eq!(board.status(&scope), SaveStatus::Unsaved);
    }

    #[test]
    fn combined_status_prefers_unsaved() {
        let mut board = StatusBoard::default();
        let saving = board.mark_edited(&SaveScope::AnchorSlot(0));
        board.mark_saving(&SaveScope::AnchorSlot(0), saving);
        board.mark_edited(&SaveScope::AnchorSlot(5));

        let is_anchor = |scope: &SaveScope| matches!(scope, SaveScope::AnchorSlot(_));
        assert_eq!(board.combined(is_anchor), SaveStatus::Unsaved);
        assert_eq!(board.combined(|scope| *scope == SaveScope::Draft), SaveStatus::Saved);
    }
}
