//! Conversation checkpoint store.
//!
//! The coordinator persists its conversation as append-only snapshots: after
//! every model turn and every batch of tool results it writes the full
//! message list (minus the system instruction) keyed by agent identity and
//! session id. Restoring a session reads only the newest snapshot, so
//! concurrent writers on the same session resolve by last-writer-wins
//! without any locking.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::agent::message::ChatMessage;
use crate::error::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS checkpoints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent TEXT NOT NULL,
    session_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    state TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_checkpoints_agent_session
    ON checkpoints(agent, session_id, id);
";

/// Handle to the checkpoint table of a SQLite database.
///
/// `agent` namespaces snapshots so that several reasoning agents could share
/// one database file without reading each other's state. `keep` bounds the
/// retained snapshots per session; `None` retains everything.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    agent: String,
    keep: Option<usize>,
}

impl CheckpointStore {
    /// Opens the store at `path`, creating the schema if needed.
    pub fn open(
        path: impl Into<PathBuf>,
        agent: impl Into<String>,
        keep: Option<usize>,
    ) -> Result<Self, StorageError> {
        let store = Self {
            path: path.into(),
            agent: agent.into(),
            keep,
        };
        store.connect()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Appends a full conversation snapshot for `session_id`.
    pub fn append(&self, session_id: &str, messages: &[ChatMessage]) -> Result<(), StorageError> {
        let state = serde_json::to_string(messages)?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO checkpoints (agent, session_id, created_at, state) VALUES (?1, ?2, ?3, ?4)",
            params![self.agent, session_id, Utc::now().to_rfc3339(), state],
        )?;
        if let Some(keep) = self.keep {
            self.prune(&conn, session_id, keep)?;
        }
        Ok(())
    }

    fn prune(&self, conn: &Connection, session_id: &str, keep: usize) -> Result<(), StorageError> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        conn.execute(
            "DELETE FROM checkpoints
             WHERE agent = ?1 AND session_id = ?2 AND id NOT IN (
                 SELECT id FROM checkpoints
                 WHERE agent = ?1 AND session_id = ?2
                 ORDER BY id DESC LIMIT ?3
             )",
            params![self.agent, session_id, keep],
        )?;
        Ok(())
    }

    /// Returns the newest snapshot for `session_id`, or `None` for a fresh
    /// session.
    pub fn latest(&self, session_id: &str) -> Result<Option<Vec<ChatMessage>>, StorageError> {
        let conn = self.connect()?;
        let state: Option<String> = conn
            .query_row(
                "SELECT state FROM checkpoints
                 WHERE agent = ?1 AND session_id = ?2
                 ORDER BY id DESC LIMIT 1",
                params![self.agent, session_id],
                |row| row.get(0),
            )
            .optional()?;
        match state {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Number of retained snapshots for `session_id`.
    pub fn snapshot_count(&self, session_id: &str) -> Result<usize, StorageError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM checkpoints WHERE agent = ?1 AND session_id = ?2",
            params![self.agent, session_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// [`append`](Self::append) moved onto the blocking pool.
    pub async fn append_async(
        &self,
        session_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<(), StorageError> {
        let store = self.clone();
        let session = session_id.to_string();
        tokio::task::spawn_blocking(move || store.append(&session, &messages))
            .await
            .map_err(|e| StorageError::TaskJoin {
                message: e.to_string(),
            })?
    }

    /// [`latest`](Self::latest) moved onto the blocking pool.
    pub async fn latest_async(
        &self,
        session_id: &str,
    ) -> Result<Option<Vec<ChatMessage>>, StorageError> {
        let store = self.clone();
        let session = session_id.to_string();
        tokio::task::spawn_blocking(move || store.latest(&session))
            .await
            .map_err(|e| StorageError::TaskJoin {
                message: e.to_string(),
            })?
    }
}
