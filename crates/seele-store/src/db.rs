//! Schema initialisation. Safe to call on every startup (idempotent).

use rusqlite::{ffi::sqlite3_auto_extension, Connection};

use crate::error::Result;

/// Schema generation this build understands. `open` refuses stores that
/// declare any other version.
pub const SCHEMA_VERSION: i64 = 1;

static VEC_EXTENSION: std::sync::Once = std::sync::Once::new();

/// Register sqlite-vec as an auto extension so every subsequently opened
/// connection gets the `vec0` module. Must run before `Connection::open`.
pub fn register_vec_extension() {
    VEC_EXTENSION.call_once(|| unsafe {
        sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

pub fn init_db(conn: &Connection, dim: usize) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=3000;",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (
            key   TEXT NOT NULL PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS session (
            session_id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_ts   INTEGER NOT NULL,
            end_ts     INTEGER,
            status     TEXT NOT NULL DEFAULT 'active'
                       CHECK (status IN ('active','archived'))
        );
        CREATE INDEX IF NOT EXISTS idx_session_status ON session(status);

        CREATE TABLE IF NOT EXISTS turn (
            turn_id    INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES session(session_id),
            ts         INTEGER NOT NULL,
            role       TEXT NOT NULL CHECK (role IN ('user','assistant')),
            text       TEXT NOT NULL CHECK (length(text) > 0)
        );
        CREATE INDEX IF NOT EXISTS idx_turn_session ON turn(session_id, turn_id);

        CREATE TABLE IF NOT EXISTS summary (
            summary_id   INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id   INTEGER NOT NULL REFERENCES session(session_id),
            text         TEXT NOT NULL,
            first_ts     INTEGER NOT NULL,
            last_ts      INTEGER NOT NULL,
            last_turn_id INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_summary_session
            ON summary(session_id, last_ts DESC);
        CREATE INDEX IF NOT EXISTS idx_summary_coverage
            ON summary(session_id, last_turn_id DESC);

        CREATE TABLE IF NOT EXISTS task (
            task_id        TEXT NOT NULL PRIMARY KEY,
            name           TEXT NOT NULL,
            trigger_type   TEXT NOT NULL CHECK (trigger_type IN ('once','interval')),
            trigger_config TEXT NOT NULL,
            message        TEXT NOT NULL,
            created_at     INTEGER NOT NULL,
            next_run_at    INTEGER NOT NULL,
            last_run_at    INTEGER,
            status         TEXT NOT NULL DEFAULT 'active'
                           CHECK (status IN ('active','paused','completed'))
        );
        CREATE INDEX IF NOT EXISTS idx_task_due ON task(status, next_run_at);",
    )?;

    // FTS5 shadow tables, kept in sync with turn.text / summary.text by
    // triggers so a row and its FTS entry can never diverge.
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS turn_fts
            USING fts5(text, content='turn', content_rowid='turn_id');
        CREATE TRIGGER IF NOT EXISTS turn_fts_ai AFTER INSERT ON turn BEGIN
            INSERT INTO turn_fts(rowid, text) VALUES (new.turn_id, new.text);
        END;
        CREATE TRIGGER IF NOT EXISTS turn_fts_ad AFTER DELETE ON turn BEGIN
            INSERT INTO turn_fts(turn_fts, rowid, text)
                VALUES ('delete', old.turn_id, old.text);
        END;

        CREATE VIRTUAL TABLE IF NOT EXISTS summary_fts
            USING fts5(text, content='summary', content_rowid='summary_id');
        CREATE TRIGGER IF NOT EXISTS summary_fts_ai AFTER INSERT ON summary BEGIN
            INSERT INTO summary_fts(rowid, text) VALUES (new.summary_id, new.text);
        END;
        CREATE TRIGGER IF NOT EXISTS summary_fts_ad AFTER DELETE ON summary BEGIN
            INSERT INTO summary_fts(summary_fts, rowid, text)
                VALUES ('delete', old.summary_id, old.text);
        END;",
    )?;

    // Vector sidecars. rowid is the shadowed turn_id / summary_id.
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS turn_vec
            USING vec0(embedding float[{dim}] distance_metric=cosine);
        CREATE VIRTUAL TABLE IF NOT EXISTS summary_vec
            USING vec0(embedding float[{dim}] distance_metric=cosine);",
    ))?;

    Ok(())
}
