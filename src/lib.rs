pub mod db;
pub mod events;
pub mod sessions;
pub mod settings;
pub mod sidebar;
pub mod store;
pub mod timer;
pub mod utils;
pub mod workspace;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

use db::Database;
use sessions::{SessionActions, SessionError};
use settings::SettingsStore;
use sidebar::SidebarContext;
use store::RemoteStore;
use timer::FreewriteTimer;
use workspace::{SessionWorkspace, WorkspaceError};

pub use utils::logging::init_logging;

const ENABLE_LOGS: bool = true;

/// Application entry point: owns the store and the persisted settings and
/// hands out sidebars, workspaces and timers wired to them.
#[derive(Clone)]
pub struct Songsmith {
    store: Arc<dyn RemoteStore>,
    settings: Arc<SettingsStore>,
}

impl Songsmith {
    /// Opens (or creates) `songsmith.sqlite3` and `settings.json` under
    /// `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let database = Database::new(data_dir.join("songsmith.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        log_info!("Songsmith data directory: {}", data_dir.display());

        Ok(Self::with_store(Arc::new(database), Arc::new(settings)))
    }

    pub fn with_store(store: Arc<dyn RemoteStore>, settings: Arc<SettingsStore>) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Loads the user's sessions into a fresh sidebar.
    pub async fn sidebar_for(&self, user_id: &str) -> Result<SessionActions, SessionError> {
        let sessions = self.store.list_sessions(user_id).await?;
        let sidebar = SidebarContext::new(Arc::clone(&self.settings), sessions);
        Ok(SessionActions::new(self.store(), sidebar, user_id))
    }

    pub async fn open_workspace(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionWorkspace, WorkspaceError> {
        SessionWorkspace::open(
            self.store(),
            user_id,
            session_id,
            self.settings.workspace_config(),
        )
        .await
    }

    /// Countdown of the configured freewrite length driving `workspace`.
    pub fn freewrite_timer(&self, workspace: &SessionWorkspace) -> FreewriteTimer {
        FreewriteTimer::new(
            self.settings.freewrite_duration(),
            Arc::new(workspace.clone()),
        )
    }
}
