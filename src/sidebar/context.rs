use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::reconciler::SessionListReconciler;
use crate::{
    db::models::{Session, SessionPatch},
    log_warn,
    settings::SettingsStore,
};

const ENABLE_LOGS: bool = true;

#[derive(Default)]
struct Chrome {
    collapsed: bool,
    has_content_topbar: bool,
    mobile_nav_open: bool,
}

struct SidebarInner {
    chrome: Chrome,
    sessions: SessionListReconciler,
}

/// Navigation state shared by everything that renders or edits the session
/// list. Cheap to clone; every clone sees the same state. The collapsed flag
/// is persisted through [`SettingsStore`].
#[derive(Clone)]
pub struct SidebarContext {
    inner: Arc<Mutex<SidebarInner>>,
    settings: Arc<SettingsStore>,
}

impl SidebarContext {
    pub fn new(settings: Arc<SettingsStore>, server_sessions: Vec<Session>) -> Self {
        let chrome = Chrome {
            collapsed: settings.sidebar_collapsed(),
            ..Chrome::default()
        };

        Self {
            inner: Arc::new(Mutex::new(SidebarInner {
                chrome,
                sessions: SessionListReconciler::new(server_sessions),
            })),
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SidebarInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_collapsed(&self) -> bool {
        self.lock().chrome.collapsed
    }

    pub fn toggle_sidebar(&self) -> bool {
        let collapsed = !self.is_collapsed();
        self.set_collapsed(collapsed);
        collapsed
    }

    pub fn collapse_sidebar(&self) {
        self.set_collapsed(true);
    }

    pub fn expand_sidebar(&self) {
        self.set_collapsed(false);
    }

    // A failed write only costs the preference on next launch.
    fn set_collapsed(&self, collapsed: bool) {
        self.lock().chrome.collapsed = collapsed;
        if let Err(err) = self.settings.set_sidebar_collapsed(collapsed) {
            log_warn!("Failed to persist sidebar state: {err:?}");
        }
    }

    pub fn has_content_topbar(&self) -> bool {
        self.lock().chrome.has_content_topbar
    }

    pub fn set_has_content_topbar(&self, value: bool) {
        self.lock().chrome.has_content_topbar = value;
    }

    pub fn mobile_nav_open(&self) -> bool {
        self.lock().chrome.mobile_nav_open
    }

    pub fn set_mobile_nav_open(&self, open: bool) {
        self.lock().chrome.mobile_nav_open = open;
    }

    pub fn visible_sessions(&self) -> Vec<Session> {
        self.lock().sessions.visible_sessions()
    }

    pub fn set_server_sessions(&self, sessions: Vec<Session>) {
        self.lock().sessions.set_server_sessions(sessions);
    }

    pub fn add_optimistic_session(&self, session: Session) {
        self.lock().sessions.add_optimistic(session);
    }

    pub fn update_optimistic_session(&self, session_id: &str, patch: SessionPatch) {
        self.lock().sessions.update_optimistic(session_id, patch);
    }

    pub fn revert_session_override(&self, session_id: &str, failed: &SessionPatch) {
        self.lock().sessions.revert_override(session_id, failed);
    }

    pub fn delete_optimistic_session(&self, session_id: &str) -> Option<Session> {
        self.lock().sessions.mark_deleted(session_id)
    }

    pub fn withdraw_session_delete(&self, session_id: &str, restored: Option<Session>) {
        self.lock().sessions.withdraw_delete(session_id, restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: &tempfile::TempDir) -> Arc<SettingsStore> {
        Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap())
    }

    #[test]
    fn collapsed_flag_is_restored_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let sidebar = SidebarContext::new(settings(&dir), Vec::new());
        assert!(!sidebar.is_collapsed());

        assert!(sidebar.toggle_sidebar());
        let reopened = SidebarContext::new(settings(&dir), Vec::new());
        assert!(reopened.is_collapsed());

        reopened.expand_sidebar();
        assert!(!SidebarContext::new(settings(&dir), Vec::new()).is_collapsed());
    }

    #[test]
    fn clones_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let sidebar = SidebarContext::new(settings(&dir), Vec::new());
        let other = sidebar.clone();

        other.set_mobile_nav_open(true);
        other.set_has_content_topbar(true);
        other.collapse_sidebar();

        assert!(sidebar.mobile_nav_open());
        assert!(sidebar.has_content_topbar());
        assert!(sidebar.is_collapsed());
    }
}
