//! SQL migration definitions for the StrategyPipe database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: sessions, session_files",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per session run
CREATE TABLE IF NOT EXISTS sessions (
    id          TEXT PRIMARY KEY,
    email       TEXT NOT NULL,
    gpt_module  TEXT NOT NULL,
    status      TEXT NOT NULL,
    error       TEXT,
    started_at  TEXT NOT NULL,
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);

-- Artifacts flowing through a session, input and generated
CREATE TABLE IF NOT EXISTS session_files (
    id           TEXT PRIMARY KEY,
    session_id   TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    file_name    TEXT NOT NULL,
    file_url     TEXT,
    file_type    TEXT NOT NULL,
    local_path   TEXT,
    content_hash TEXT,
    UNIQUE(session_id, file_name)
);

CREATE INDEX IF NOT EXISTS idx_session_files_session ON session_files(session_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
