use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;
use crate::{log_debug, log_error, log_info, log_warn};

const ENABLE_LOGS: bool = true;
const THREAD_NAME: &str = "songsmith-db";

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Request {
    Run(Job),
    Close,
}

/// The thread that owns the connection. Closed and joined when the last
/// `Database` clone goes away.
struct Worker {
    requests: mpsc::Sender<Request>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let Some(thread) = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };

        if self.requests.send(Request::Close).is_err() {
            log_warn!("{THREAD_NAME} already stopped before close");
        }
        if let Err(panic) = thread.join() {
            log_error!("{THREAD_NAME} panicked: {panic:?}");
        }
    }
}

/// SQLite-backed store. Every statement runs on one dedicated thread that
/// owns the connection; async callers send it closures and await the reply.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
}

impl Database {
    /// Opens the file (creating parent directories), applies pending
    /// migrations and only returns once the worker is ready for requests.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create database directory {}", dir.display()))?;
        }

        let (requests, inbox) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || match open_connection(&thread_path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(conn, inbox);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn database thread")?;

        ready_rx
            .recv()
            .context("database thread exited during startup")??;
        log_info!("Opened database {}", path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                requests,
                thread: Mutex::new(Some(thread)),
            }),
        })
    }

    /// Runs `job` on the database thread and returns its result.
    pub async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Request::Run(Box::new(move |conn| {
            // The caller may have been cancelled; its result is discarded.
            let _ = reply_tx.send(job(conn));
        }));

        self.worker
            .requests
            .send(request)
            .map_err(|_| anyhow!("{THREAD_NAME} is no longer accepting work"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("{THREAD_NAME} dropped a request without replying"))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    // Cascades depend on foreign keys; WAL is only a performance setting.
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        log_warn!("Staying on the default journal mode: {err}");
    }

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve(mut conn: Connection, inbox: mpsc::Receiver<Request>) {
    for request in inbox {
        match request {
            Request::Run(job) => job(&mut conn),
            Request::Close => break,
        }
    }
    log_debug!("{THREAD_NAME} stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_with_foreign_keys_and_latest_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("nested").join("songsmith.sqlite3")).unwrap();

        let (foreign_keys, version): (i64, i64) = db
            .execute(|conn| {
                let foreign_keys = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
                let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
                Ok((foreign_keys, version))
            })
            .await
            .unwrap();

        assert_eq!(foreign_keys, 1);
        assert!(version >= 1);
    }

    #[tokio::test]
    async fn job_errors_reach_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("songsmith.sqlite3")).unwrap();

        let result: Result<()> = db
            .execute(|conn| {
                conn.execute("INSERT INTO no_such_table VALUES (1)", [])?;
                Ok(())
            })
            .await;
        assert!(result.is_err());

        // The worker keeps serving after a failed job.
        let one: i64 = db
            .execute(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(one, 1);
    }
}
