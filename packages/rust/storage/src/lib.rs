//! libSQL storage layer for session status records.
//!
//! The [`Storage`] struct wraps a libSQL database holding one row per
//! session run plus the artifacts that flowed through it. This is the
//! persisted status record that makes background failures externally
//! observable: the HTTP layer reads it back for `GET /sessions/{id}`.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use serde::Serialize;
use uuid::Uuid;

use strategypipe_shared::{Result, StrategyPipeError};

/// Session is still executing.
pub const SESSION_RUNNING: &str = "running";

/// Session delivered its handoff.
pub const SESSION_COMPLETE: &str = "complete";

/// Session terminated with an error.
pub const SESSION_FAILED: &str = "failed";

/// One session run's status record.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub email: String,
    pub gpt_module: String,
    pub status: String,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// One artifact record within a session.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub session_id: String,
    pub file_name: String,
    pub file_url: Option<String>,
    pub file_type: String,
    pub local_path: Option<String>,
    pub content_hash: Option<String>,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StrategyPipeError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    StrategyPipeError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Session operations
    // -----------------------------------------------------------------------

    /// Register a session in `running` state.
    ///
    /// Re-triggering an existing session resets its record: status back to
    /// `running`, error and `finished_at` cleared, `started_at` restamped.
    pub async fn insert_session(
        &self,
        id: &str,
        email: &str,
        gpt_module: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO sessions (id, email, gpt_module, status, error, started_at, finished_at)
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5, NULL)
                 ON CONFLICT(id) DO UPDATE SET
                   email = excluded.email,
                   gpt_module = excluded.gpt_module,
                   status = excluded.status,
                   error = NULL,
                   started_at = excluded.started_at,
                   finished_at = NULL",
                params![id, email, gpt_module, SESSION_RUNNING, now.as_str()],
            )
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Move a session to a terminal status, recording the error for failures.
    ///
    /// `finished_at` is stamped whenever the status leaves `running`.
    pub async fn update_session_status(
        &self,
        id: &str,
        status: &str,
        error: Option<&str>,
    ) -> Result<()> {
        let finished_at = if status == SESSION_RUNNING {
            None
        } else {
            Some(Utc::now().to_rfc3339())
        };
        self.conn
            .execute(
                "UPDATE sessions SET status = ?1, error = ?2, finished_at = ?3 WHERE id = ?4",
                params![status, error, finished_at.as_deref(), id],
            )
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a session record by id.
    pub async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, gpt_module, status, error, started_at, finished_at
                 FROM sessions WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StrategyPipeError::Storage(e.to_string())),
        }
    }

    /// List all sessions, most recently started first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, gpt_module, status, error, started_at, finished_at
                 FROM sessions ORDER BY started_at DESC",
                params![],
            )
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_session(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // File operations
    // -----------------------------------------------------------------------

    /// Upsert an artifact record (insert or update on `session_id + file_name`).
    pub async fn upsert_file(&self, file: &FileRecord) -> Result<()> {
        let id = Uuid::now_v7().to_string();
        self.conn
            .execute(
                "INSERT INTO session_files (id, session_id, file_name, file_url, file_type, local_path, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(session_id, file_name) DO UPDATE SET
                   file_url = excluded.file_url,
                   file_type = excluded.file_type,
                   local_path = excluded.local_path,
                   content_hash = excluded.content_hash",
                params![
                    id.as_str(),
                    file.session_id.as_str(),
                    file.file_name.as_str(),
                    file.file_url.as_deref(),
                    file.file_type.as_str(),
                    file.local_path.as_deref(),
                    file.content_hash.as_deref(),
                ],
            )
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// List all artifact records for a session.
    pub async fn list_files_by_session(&self, session_id: &str) -> Result<Vec<FileRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT session_id, file_name, file_url, file_type, local_path, content_hash
                 FROM session_files WHERE session_id = ?1 ORDER BY file_name",
                params![session_id],
            )
            .await
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(FileRecord {
                session_id: row
                    .get::<String>(0)
                    .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
                file_name: row
                    .get::<String>(1)
                    .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
                file_url: row.get::<String>(2).ok(),
                file_type: row
                    .get::<String>(3)
                    .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
                local_path: row.get::<String>(4).ok(),
                content_hash: row.get::<String>(5).ok(),
            });
        }
        Ok(results)
    }
}

/// Convert a database row to a [`SessionRecord`].
fn row_to_session(row: &libsql::Row) -> Result<SessionRecord> {
    let parse_ts = |s: String| {
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StrategyPipeError::Storage(format!("invalid date: {e}")))
    };

    Ok(SessionRecord {
        id: row
            .get::<String>(0)
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
        email: row
            .get::<String>(1)
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
        gpt_module: row
            .get::<String>(2)
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
        status: row
            .get::<String>(3)
            .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
        error: row.get::<String>(4).ok(),
        started_at: parse_ts(
            row.get::<String>(5)
                .map_err(|e| StrategyPipeError::Storage(e.to_string()))?,
        )?,
        finished_at: match row.get::<String>(6).ok() {
            Some(s) => Some(parse_ts(s)?),
            None => None,
        },
    })
}
