use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::db::{self, SCHEMA_VERSION};
use crate::error::{Result, StoreError};
use crate::fts;
use crate::types::*;

/// Which corpus a vector / full-text search runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Turn,
    Summary,
}

/// Session scoping for vector search.
#[derive(Debug, Clone, Copy)]
pub enum VectorFilter {
    None,
    /// Only rows belonging to this session.
    SessionIs(i64),
    /// Only rows NOT belonging to this session (recall must never surface
    /// the active session).
    ExcludeSession(i64),
}

/// Row filters for full-text search. All fields optional; timestamps are
/// UTC epoch seconds and `until` is exclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtsFilter {
    pub exclude_session: Option<i64>,
    pub role: Option<Role>,
    pub since: Option<i64>,
    pub until: Option<i64>,
}

/// The embedded store. One write connection behind a mutex; every public
/// operation is a single statement or an explicit transaction.
#[derive(Debug)]
pub struct Store {
    conn: Mutex<Connection>,
    dim: usize,
}

impl Store {
    /// Open (or create) the store file and apply the schema.
    ///
    /// Fails with `Conflict` when an existing file declares a different
    /// embedding dimension or an unknown schema version.
    pub fn open(path: &Path, dim: usize) -> Result<Self> {
        db::register_vec_extension();
        let conn = Connection::open(path)?;
        Self::from_connection(conn, dim)
    }

    /// In-memory store for tests.
    pub fn open_in_memory(dim: usize) -> Result<Self> {
        db::register_vec_extension();
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, dim)
    }

    fn from_connection(conn: Connection, dim: usize) -> Result<Self> {
        // Inspect declarations before (re-)applying the schema so a
        // mismatched store is refused untouched.
        let has_meta: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if has_meta {
            if let Some(declared) = meta_get(&conn, "schema_version")? {
                let declared: i64 = declared.parse().unwrap_or(-1);
                if declared != SCHEMA_VERSION {
                    return Err(StoreError::Conflict(format!(
                        "schema version {declared} not understood (expected {SCHEMA_VERSION})"
                    )));
                }
            }
            if let Some(declared) = meta_get(&conn, "embedding_dim")? {
                let declared: usize = declared.parse().unwrap_or(0);
                if declared != dim {
                    return Err(StoreError::Conflict(format!(
                        "store created with embedding dimension {declared}, opened with {dim}"
                    )));
                }
            }
        }

        db::init_db(&conn, dim)?;
        meta_set_if_absent(&conn, "schema_version", &SCHEMA_VERSION.to_string())?;
        meta_set_if_absent(&conn, "embedding_dim", &dim.to_string())?;

        Ok(Self {
            conn: Mutex::new(conn),
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    // --- sessions ----------------------------------------------------------

    /// Create a fresh active session. `Conflict` when one is already active
    /// (at most one session is active at any instant).
    pub fn create_session(&self, start_ts: i64) -> Result<Session> {
        let conn = self.conn.lock().unwrap();
        let existing: Option<i64> = conn
            .query_row(
                "SELECT session_id FROM session WHERE status = 'active'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Err(StoreError::Conflict(format!(
                "session {id} is already active"
            )));
        }
        conn.execute(
            "INSERT INTO session (start_ts, status) VALUES (?1, 'active')",
            [start_ts],
        )?;
        let session_id = conn.last_insert_rowid();
        debug!(session_id, "session created");
        Ok(Session {
            session_id,
            start_ts,
            end_ts: None,
            status: SessionStatus::Active,
        })
    }

    /// The currently active session, if any.
    pub fn active_session(&self) -> Result<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT session_id, start_ts, end_ts, status
                 FROM session WHERE status = 'active'",
                [],
                row_to_session,
            )
            .optional()?)
    }

    pub fn session(&self, session_id: i64) -> Result<Session> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT session_id, start_ts, end_ts, status
             FROM session WHERE session_id = ?1",
            [session_id],
            row_to_session,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("session {session_id}")))
    }

    pub fn archive_session(&self, session_id: i64, end_ts: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE session SET status = 'archived', end_ts = ?1 WHERE session_id = ?2",
            rusqlite::params![end_ts, session_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("session {session_id}")));
        }
        Ok(())
    }

    /// Hard-delete a session and everything linked to it: turns, summaries,
    /// both FTS shadows (via triggers) and both vector sidecars.
    pub fn delete_session(&self, session_id: i64) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM turn_vec WHERE rowid IN
                 (SELECT turn_id FROM turn WHERE session_id = ?1)",
            [session_id],
        )?;
        tx.execute(
            "DELETE FROM summary_vec WHERE rowid IN
                 (SELECT summary_id FROM summary WHERE session_id = ?1)",
            [session_id],
        )?;
        tx.execute("DELETE FROM turn WHERE session_id = ?1", [session_id])?;
        tx.execute("DELETE FROM summary WHERE session_id = ?1", [session_id])?;
        let n = tx.execute("DELETE FROM session WHERE session_id = ?1", [session_id])?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("session {session_id}")));
        }
        tx.commit()?;
        debug!(session_id, "session deleted");
        Ok(())
    }

    // --- turns -------------------------------------------------------------

    /// Append a turn. Returns the monotonically increasing turn id.
    pub fn append_turn(&self, session_id: i64, role: Role, text: &str, ts: i64) -> Result<i64> {
        if text.is_empty() {
            return Err(StoreError::Conflict("turn text must be non-empty".into()));
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO turn (session_id, ts, role, text) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![session_id, ts, role.to_string(), text],
        )
        .map_err(constraint_to_conflict)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn turn(&self, turn_id: i64) -> Result<Turn> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT turn_id, session_id, ts, role, text FROM turn WHERE turn_id = ?1",
            [turn_id],
            row_to_turn,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("turn {turn_id}")))
    }

    /// Last `n` turns of a session, ascending by append order.
    pub fn recent_turns(&self, session_id: i64, n: usize) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT turn_id, session_id, ts, role, text FROM
                 (SELECT * FROM turn WHERE session_id = ?1
                  ORDER BY turn_id DESC LIMIT ?2)
             ORDER BY turn_id ASC",
        )?;
        let rows = stmt.query_map(rusqlite::params![session_id, n as i64], row_to_turn)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    pub fn count_turns(&self, session_id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM turn WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Turns of a session not yet covered by any summary, ascending.
    ///
    /// Coverage is the highest `last_turn_id` across the session's
    /// summaries; everything above it is the live tail.
    pub fn unsummarized_turns(&self, session_id: i64) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT turn_id, session_id, ts, role, text FROM turn
             WHERE session_id = ?1
               AND turn_id > COALESCE(
                   (SELECT MAX(last_turn_id) FROM summary WHERE session_id = ?1), 0)
             ORDER BY turn_id ASC",
        )?;
        let rows = stmt.query_map([session_id], row_to_turn)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    pub fn count_unsummarized(&self, session_id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM turn
             WHERE session_id = ?1
               AND turn_id > COALESCE(
                   (SELECT MAX(last_turn_id) FROM summary WHERE session_id = ?1), 0)",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    // --- summaries ---------------------------------------------------------

    pub fn insert_summary(
        &self,
        session_id: i64,
        text: &str,
        first_ts: i64,
        last_ts: i64,
        last_turn_id: i64,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO summary (session_id, text, first_ts, last_ts, last_turn_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![session_id, text, first_ts, last_ts, last_turn_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn summary(&self, summary_id: i64) -> Result<Summary> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT summary_id, session_id, text, first_ts, last_ts, last_turn_id
             FROM summary WHERE summary_id = ?1",
            [summary_id],
            row_to_summary,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("summary {summary_id}")))
    }

    /// The `n` newest summaries of a session by `last_ts`, ascending.
    pub fn recent_summaries(&self, session_id: i64, n: usize) -> Result<Vec<Summary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT summary_id, session_id, text, first_ts, last_ts, last_turn_id FROM
                 (SELECT * FROM summary WHERE session_id = ?1
                  ORDER BY last_ts DESC, summary_id DESC LIMIT ?2)
             ORDER BY last_ts ASC, summary_id ASC",
        )?;
        let rows = stmt.query_map(rusqlite::params![session_id, n as i64], row_to_summary)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    // --- vectors -----------------------------------------------------------

    pub fn attach_turn_vector(&self, turn_id: i64, embedding: &[f32]) -> Result<()> {
        self.attach_vector("turn_vec", "turn", "turn_id", turn_id, embedding)
    }

    pub fn attach_summary_vector(&self, summary_id: i64, embedding: &[f32]) -> Result<()> {
        self.attach_vector("summary_vec", "summary", "summary_id", summary_id, embedding)
    }

    fn attach_vector(
        &self,
        vec_table: &str,
        base_table: &str,
        id_column: &str,
        id: i64,
        embedding: &[f32],
    ) -> Result<()> {
        if embedding.len() != self.dim {
            return Err(StoreError::Conflict(format!(
                "embedding dimension {} does not match store dimension {}",
                embedding.len(),
                self.dim
            )));
        }
        let conn = self.conn.lock().unwrap();
        let exists: Option<i64> = conn
            .query_row(
                &format!("SELECT {id_column} FROM {base_table} WHERE {id_column} = ?1"),
                [id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(format!("{base_table} {id}")));
        }
        conn.execute(
            &format!("INSERT INTO {vec_table} (rowid, embedding) VALUES (?1, ?2)"),
            rusqlite::params![id, vec_to_bytes(embedding)],
        )
        .map_err(constraint_to_conflict)?;
        Ok(())
    }

    pub fn has_turn_vector(&self, turn_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM turn_vec WHERE rowid = ?1",
            [turn_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Turns that were stored without a vector (embedder was down at write
    /// time). Used by the startup reconcile pass; retrieval simply never
    /// sees these rows.
    pub fn turns_missing_vectors(&self, limit: usize) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.turn_id, t.session_id, t.ts, t.role, t.text FROM turn t
             WHERE t.turn_id NOT IN (SELECT rowid FROM turn_vec)
             ORDER BY t.turn_id ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], row_to_turn)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Cosine KNN over turns or summaries. Returns `(id, score)` with
    /// score = 1 − cosine distance, best first.
    pub fn vector_search(
        &self,
        kind: VectorKind,
        query: &[f32],
        k: usize,
        filter: VectorFilter,
    ) -> Result<Vec<(i64, f64)>> {
        if query.len() != self.dim {
            return Err(StoreError::Conflict(format!(
                "query dimension {} does not match store dimension {}",
                query.len(),
                self.dim
            )));
        }
        let (vec_table, id_select) = match kind {
            VectorKind::Turn => ("turn_vec", "SELECT turn_id FROM turn"),
            VectorKind::Summary => ("summary_vec", "SELECT summary_id FROM summary"),
        };
        let scope = match filter {
            VectorFilter::None => String::new(),
            VectorFilter::SessionIs(_) => {
                format!("AND rowid IN ({id_select} WHERE session_id = ?3)")
            }
            VectorFilter::ExcludeSession(_) => {
                format!("AND rowid IN ({id_select} WHERE session_id <> ?3)")
            }
        };
        let sql = format!(
            "SELECT rowid, distance FROM {vec_table}
             WHERE embedding MATCH ?1 AND k = ?2 {scope}
             ORDER BY distance"
        );

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let bytes = vec_to_bytes(query);
        let map = |row: &rusqlite::Row<'_>| {
            let id: i64 = row.get(0)?;
            let distance: f64 = row.get(1)?;
            Ok((id, 1.0 - distance))
        };
        let rows = match filter {
            VectorFilter::None => {
                stmt.query_map(rusqlite::params![bytes, k as i64], map)?
            }
            VectorFilter::SessionIs(sid) | VectorFilter::ExcludeSession(sid) => {
                stmt.query_map(rusqlite::params![bytes, k as i64, sid], map)?
            }
        };
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    // --- full-text ---------------------------------------------------------

    /// Boolean full-text search. Returns `(id, rank)` best first; the query
    /// is validated up front and malformed input fails with `BadQuery`.
    pub fn fts_search(
        &self,
        kind: VectorKind,
        query: &str,
        filter: FtsFilter,
        k: usize,
    ) -> Result<Vec<(i64, f64)>> {
        fts::validate_query(query)?;
        let sql = match kind {
            VectorKind::Turn => {
                "SELECT t.turn_id, f.rank FROM turn_fts f
                 JOIN turn t ON t.turn_id = f.rowid
                 WHERE turn_fts MATCH ?1
                   AND (?2 IS NULL OR t.session_id <> ?2)
                   AND (?3 IS NULL OR t.role = ?3)
                   AND (?4 IS NULL OR t.ts >= ?4)
                   AND (?5 IS NULL OR t.ts < ?5)
                 ORDER BY f.rank LIMIT ?6"
            }
            VectorKind::Summary => {
                // Summaries carry no role; ?3 is accepted and ignored.
                "SELECT s.summary_id, f.rank FROM summary_fts f
                 JOIN summary s ON s.summary_id = f.rowid
                 WHERE summary_fts MATCH ?1
                   AND (?2 IS NULL OR s.session_id <> ?2)
                   AND (?3 IS NULL OR 1)
                   AND (?4 IS NULL OR s.last_ts >= ?4)
                   AND (?5 IS NULL OR s.first_ts < ?5)
                 ORDER BY f.rank LIMIT ?6"
            }
        };
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let role = filter.role.map(|r| r.to_string());
        let rows = stmt.query_map(
            rusqlite::params![
                query,
                filter.exclude_session,
                role,
                filter.since,
                filter.until,
                k as i64
            ],
            |row| {
                let id: i64 = row.get(0)?;
                let rank: f64 = row.get(1)?;
                Ok((id, rank))
            },
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    // --- scheduled tasks ---------------------------------------------------

    /// Insert or replace a task by id. Active tasks must carry a positive
    /// `next_run_at` strictly after `created_at`.
    pub fn upsert_task(&self, task: &ScheduledTask) -> Result<()> {
        if task.status == TaskStatus::Active
            && (task.next_run_at <= 0 || task.next_run_at <= task.created_at)
        {
            return Err(StoreError::Conflict(format!(
                "active task {} must have next_run_at after created_at",
                task.task_id
            )));
        }
        let config = serde_json::to_string(&task.trigger)
            .map_err(|e| StoreError::Conflict(format!("trigger config: {e}")))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO task
                 (task_id, name, trigger_type, trigger_config, message,
                  created_at, next_run_at, last_run_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                task.task_id,
                task.name,
                task.trigger.trigger_type(),
                config,
                task.message,
                task.created_at,
                task.next_run_at,
                task.last_run_at,
                task.status.to_string()
            ],
        )?;
        Ok(())
    }

    pub fn task(&self, task_id: &str) -> Result<ScheduledTask> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("{TASK_SELECT} WHERE task_id = ?1"),
            [task_id],
            row_to_task,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("task {task_id}")))
    }

    pub fn list_tasks(&self) -> Result<Vec<ScheduledTask>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{TASK_SELECT} ORDER BY created_at, task_id"))?;
        let rows = stmt.query_map([], row_to_task)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Active tasks due at `now`, ascending by `next_run_at`.
    pub fn tasks_due(&self, now: i64) -> Result<Vec<ScheduledTask>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{TASK_SELECT} WHERE status = 'active' AND next_run_at <= ?1
             ORDER BY next_run_at ASC, task_id ASC"
        ))?;
        let rows = stmt.query_map([now], row_to_task)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE task SET status = ?1 WHERE task_id = ?2",
            rusqlite::params![status.to_string(), task_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }

    pub fn set_task_next_run(&self, task_id: &str, next: i64, last: Option<i64>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE task SET next_run_at = ?1, last_run_at = ?2 WHERE task_id = ?3",
            rusqlite::params![next, last, task_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }

    /// Record a firing attempt. One statement, so the status transition can
    /// never be torn from the timestamp update: a `once` task becomes
    /// `completed` (and can never refire), an `interval` task advances its
    /// `next_run_at` by the interval and stays active.
    pub fn complete_firing(&self, task: &ScheduledTask, now: i64) -> Result<()> {
        let (next, status) = match task.trigger {
            TriggerConfig::Once { .. } => (task.next_run_at, TaskStatus::Completed),
            TriggerConfig::Interval { interval } => (now + interval as i64, task.status),
        };
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE task SET last_run_at = ?1, next_run_at = ?2, status = ?3
             WHERE task_id = ?4",
            rusqlite::params![now, next, status.to_string(), task.task_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("task {}", task.task_id)));
        }
        Ok(())
    }

    /// Look up a task by its seed identity `(name, trigger)`. Seed loading
    /// is idempotent on this key.
    pub fn find_task_by_identity(
        &self,
        name: &str,
        trigger: &TriggerConfig,
    ) -> Result<Option<ScheduledTask>> {
        let config = serde_json::to_string(trigger)
            .map_err(|e| StoreError::Conflict(format!("trigger config: {e}")))?;
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "{TASK_SELECT} WHERE name = ?1 AND trigger_type = ?2
                     AND trigger_config = ?3"
                ),
                rusqlite::params![name, trigger.trigger_type(), config],
                row_to_task,
            )
            .optional()?)
    }
}

const TASK_SELECT: &str = "SELECT task_id, name, trigger_type, trigger_config, message,
        created_at, next_run_at, last_run_at, status FROM task";

// --- meta ------------------------------------------------------------------

fn meta_get(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?)
}

fn meta_set_if_absent(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

// --- row mappers -----------------------------------------------------------

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let status: String = row.get(3)?;
    Ok(Session {
        session_id: row.get(0)?,
        start_ts: row.get(1)?,
        end_ts: row.get(2)?,
        status: status.parse().unwrap_or(SessionStatus::Archived),
    })
}

fn row_to_turn(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let role: String = row.get(3)?;
    Ok(Turn {
        turn_id: row.get(0)?,
        session_id: row.get(1)?,
        ts: row.get(2)?,
        role: role.parse().unwrap_or(Role::User),
        text: row.get(4)?,
    })
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<Summary> {
    Ok(Summary {
        summary_id: row.get(0)?,
        session_id: row.get(1)?,
        text: row.get(2)?,
        first_ts: row.get(3)?,
        last_ts: row.get(4)?,
        last_turn_id: row.get(5)?,
    })
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledTask> {
    let config: String = row.get(3)?;
    let status: String = row.get(8)?;
    let trigger: TriggerConfig =
        serde_json::from_str(&config).unwrap_or(TriggerConfig::Once { timestamp: 0 });
    Ok(ScheduledTask {
        task_id: row.get(0)?,
        name: row.get(1)?,
        trigger,
        message: row.get(4)?,
        created_at: row.get(5)?,
        next_run_at: row.get(6)?,
        last_run_at: row.get(7)?,
        status: status.parse().unwrap_or(TaskStatus::Completed),
    })
}

/// sqlite-vec expects raw little-endian f32 bytes.
fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for f in v {
        out.extend_from_slice(&f.to_le_bytes());
    }
    out
}

/// Constraint violations are `Conflict` (uniqueness / schema invariants);
/// everything else stays `Unavailable`.
fn constraint_to_conflict(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(msg.clone().unwrap_or_else(|| "constraint violation".into()))
        }
        _ => StoreError::Unavailable(e),
    }
}
