use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

mod migrations;
mod slots;

use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the worker thread. Dropping the last handle closes the task channel,
/// which ends the worker loop, and then joins the thread.
struct Worker {
    tasks: Option<mpsc::Sender<DbTask>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.tasks.take());
        if let Some(thread) = self.thread.take() {
            if let Err(join_err) = thread.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Handle to the SQLite connection. The connection lives on a dedicated
/// worker thread; every query is shipped there as a closure and answered on
/// a oneshot channel, so writes are applied in submission order.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (task_tx, task_rx) = mpsc::channel::<DbTask>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let path_for_thread = db_path.clone();

        let thread = thread::Builder::new()
            .name("planto-db".into())
            .spawn(move || {
                let mut conn = match open_connection(&path_for_thread) {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                for task in task_rx {
                    task(&mut conn);
                }
                debug!("Database thread shutting down");
            })
            .context("failed to spawn database worker thread")?;

        let worker = Worker {
            tasks: Some(task_tx),
            thread: Some(thread),
        };
        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(worker),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the worker thread and wait for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self
            .worker
            .tasks
            .as_ref()
            .ok_or_else(|| anyhow!("database worker already stopped"))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        sender
            .send(Box::new(move |conn| {
                if reply_tx.send(task(conn)).is_err() {
                    error!("DB caller dropped before receiving result");
                }
            }))
            .map_err(|_| anyhow!("failed to send task to DB thread"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }
    conn.busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tasks_run_on_worker_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("nested").join("planto.sqlite3")).unwrap();
        assert!(db.path().exists());

        db.write_slot("order", "first".into()).await.unwrap();
        db.write_slot("order", "second".into()).await.unwrap();
        let thread_name = db
            .execute(|_| Ok(thread::current().name().map(str::to_string)))
            .await
            .unwrap();

        assert_eq!(thread_name.as_deref(), Some("planto-db"));
        assert_eq!(db.read_slot("order").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn task_errors_reach_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("planto.sqlite3")).unwrap();

        let result: Result<()> = db
            .execute(|conn| {
                conn.execute_batch("SELECT * FROM missing_table")?;
                Ok(())
            })
            .await;
        assert!(result.is_err());
        assert!(db.read_slot("anything").await.unwrap().is_none());
    }
}
