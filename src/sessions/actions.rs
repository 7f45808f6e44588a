use std::sync::Arc;

use super::{create_session, SessionError};
use crate::{
    db::models::{Session, SessionPatch, SessionStatus},
    log_error,
    sidebar::SidebarContext,
    store::RemoteStore,
};

const ENABLE_LOGS: bool = true;

/// Session list mutations for one user. Each action updates the sidebar
/// first, then writes to the store, and rolls the sidebar back if the write
/// fails.
#[derive(Clone)]
pub struct SessionActions {
    store: Arc<dyn RemoteStore>,
    sidebar: SidebarContext,
    user_id: String,
}

impl SessionActions {
    pub fn new(store: Arc<dyn RemoteStore>, sidebar: SidebarContext, user_id: impl Into<String>) -> Self {
        Self {
            store,
            sidebar,
            user_id: user_id.into(),
        }
    }

    pub fn sidebar(&self) -> &SidebarContext {
        &self.sidebar
    }

    /// Reloads the server list, most recently updated first.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let sessions = self.store.list_sessions(&self.user_id).await?;
        self.sidebar.set_server_sessions(sessions);
        Ok(())
    }

    /// The new row only exists once the store returns it, so it is listed
    /// right after the insert rather than before.
    pub async fn create(&self, spark: &str) -> Result<Session, SessionError> {
        let session = create_session(self.store.as_ref(), &self.user_id, spark).await?;
        self.sidebar.add_optimistic_session(session.clone());
        Ok(session)
    }

    /// Blank titles clear the title.
    pub async fn rename(&self, session_id: &str, title: &str) -> Result<(), SessionError> {
        let title = Some(title.trim())
            .filter(|title| !title.is_empty())
            .map(str::to_string);
        self.patch(session_id, SessionPatch::title(title)).await
    }

    pub async fn set_status(&self, session_id: &str, status: SessionStatus) -> Result<(), SessionError> {
        self.patch(session_id, SessionPatch::status(status)).await
    }

    pub async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let restored = self.sidebar.delete_optimistic_session(session_id);
        if let Err(err) = self.store.delete_session(session_id).await {
            log_error!("Failed to delete session {session_id}: {err}");
            self.sidebar.withdraw_session_delete(session_id, restored);
            return Err(err.into());
        }
        Ok(())
    }

    async fn patch(&self, session_id: &str, patch: SessionPatch) -> Result<(), SessionError> {
        self.sidebar
            .update_optimistic_session(session_id, patch.clone());
        if let Err(err) = self.store.update_session(session_id, patch.clone()).await {
            log_error!("Failed to update session {session_id}: {err}");
            self.sidebar.revert_session_override(session_id, &patch);
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{settings::SettingsStore, store::InMemoryStore};

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<InMemoryStore>,
        actions: SessionActions,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
        let store = Arc::new(InMemoryStore::new());
        let remote: Arc<dyn RemoteStore> = store.clone();
        let actions = SessionActions::new(remote, SidebarContext::new(settings, Vec::new()), "u1");
        Fixture {
            _dir: dir,
            store,
            actions,
        }
    }

    #[tokio::test]
    async fn created_session_is_listed_before_refresh() {
        let Fixture { actions, .. } = fixture();
        let session = actions.create("harbor lights").await.unwrap();

        let visible = actions.sidebar().visible_sessions();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, session.id);

        actions.refresh().await.unwrap();
        assert_eq!(actions.sidebar().visible_sessions().len(), 1);
    }

    #[tokio::test]
    async fn rename_shows_immediately_and_lands_in_store() {
        let Fixture { store, actions, .. } = fixture();
        let session = actions.create("harbor lights").await.unwrap();

        actions.rename(&session.id, "  Harbor Lights ").await.unwrap();
        assert_eq!(actions.sidebar().visible_sessions()[0].display_title(), "Harbor Lights");
        assert_eq!(store.sessions()[0].title.as_deref(), Some("Harbor Lights"));
    }

    #[tokio::test]
    async fn failed_status_change_is_rolled_back() {
        let Fixture { store, actions, .. } = fixture();
        let session = actions.create("harbor lights").await.unwrap();
        actions.refresh().await.unwrap();

        store.fail_next_writes(1);
        let result = actions.set_status(&session.id, SessionStatus::Archived).await;
        assert!(matches!(result, Err(SessionError::Store(_))));
        assert_eq!(actions.sidebar().visible_sessions()[0].status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn failed_status_change_keeps_accepted_rename() {
        let Fixture { store, actions, .. } = fixture();
        let session = actions.create("harbor lights").await.unwrap();
        actions.refresh().await.unwrap();
        actions.rename(&session.id, "Harbor Lights").await.unwrap();

        store.fail_next_writes(1);
        assert!(actions.set_status(&session.id, SessionStatus::Archived).await.is_err());

        let visible = actions.sidebar().visible_sessions();
        assert_eq!(store.sessions()[0].title.as_deref(), Some("Harbor Lights"));
        assert_eq!(visible[0].title.as_deref(), Some("Harbor Lights"));
        assert_eq!(visible[0].status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn failed_delete_brings_session_back() {
        let Fixture { store, actions, .. } = fixture();
        let session = actions.create("harbor lights").await.unwrap();

        store.fail_next_writes(1);
        assert!(actions.delete(&session.id).await.is_err());
        assert_eq!(actions.sidebar().visible_sessions().len(), 1);

        actions.delete(&session.id).await.unwrap();
        assert!(actions.sidebar().visible_sessions().is_empty());
        actions.refresh().await.unwrap();
        assert!(actions.sidebar().visible_sessions().is_empty());
    }
}
