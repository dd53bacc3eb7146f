use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use seele_store::{Role, Store, Summary, Turn};

use crate::error::Result;

/// Context window parameters (env-configurable).
#[derive(Debug, Clone, Copy)]
pub struct WindowParams {
    /// Turns kept in the tail after a compaction.
    pub keep_min: usize,
    /// Unsummarized-turn count at which compaction fires.
    pub trigger: usize,
    /// Newest summaries shown in the prompt.
    pub recent_summaries_max: usize,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            keep_min: 12,
            trigger: 24,
            recent_summaries_max: 3,
        }
    }
}

/// Tail buffer over the currently active session.
///
/// The store's ordering is authoritative; this type only tracks which
/// session is active and translates the window parameters into compaction
/// decisions. Summarised turns stay in the store (they remain retrievable)
/// but drop out of the tail, which is derived from summary coverage.
pub struct ContextWindow {
    store: Arc<Store>,
    params: WindowParams,
    active: Mutex<i64>,
}

impl ContextWindow {
    /// Attach to the active session, creating one when none exists.
    pub fn open(store: Arc<Store>, params: WindowParams, now: i64) -> Result<Self> {
        let session_id = match store.active_session()? {
            Some(session) => session.session_id,
            None => store.create_session(now)?.session_id,
        };
        debug!(session_id, "context window attached");
        Ok(Self {
            store,
            params,
            active: Mutex::new(session_id),
        })
    }

    pub fn params(&self) -> WindowParams {
        self.params
    }

    pub fn active_session_id(&self) -> i64 {
        *self.active.lock().unwrap()
    }

    /// Persist a turn. The returned flag is the compaction decision: true
    /// once the unsummarized tail has reached the trigger.
    pub fn append(&self, role: Role, text: &str, ts: i64) -> Result<(i64, bool)> {
        let session_id = self.active_session_id();
        let turn_id = self.store.append_turn(session_id, role, text, ts)?;
        let count = self.store.count_unsummarized(session_id)?;
        Ok((turn_id, count >= self.params.trigger))
    }

    /// True when the unsummarized tail has reached the trigger.
    pub fn needs_compaction(&self) -> Result<bool> {
        let count = self.store.count_unsummarized(self.active_session_id())?;
        Ok(count >= self.params.trigger)
    }

    /// The oldest `count − KEEP_MIN` unsummarized turns — the slice handed
    /// to the summariser. Empty when the trigger has not been reached.
    pub fn compaction_slice(&self) -> Result<Vec<Turn>> {
        let mut turns = self.store.unsummarized_turns(self.active_session_id())?;
        if turns.len() < self.params.trigger {
            return Ok(Vec::new());
        }
        turns.truncate(turns.len() - self.params.keep_min);
        Ok(turns)
    }

    /// Every turn not yet condensed — the slice summarised on `/new`.
    pub fn finalization_slice(&self) -> Result<Vec<Turn>> {
        Ok(self.store.unsummarized_turns(self.active_session_id())?)
    }

    /// The prompt tail: unsummarized turns in chronological order
    /// (exactly `KEEP_MIN` immediately after a compaction).
    pub fn tail(&self) -> Result<Vec<Turn>> {
        Ok(self.store.unsummarized_turns(self.active_session_id())?)
    }

    /// Newest `RECENT_SUMMARIES_MAX` summaries, oldest first.
    pub fn recent_summaries(&self) -> Result<Vec<Summary>> {
        self.store
            .recent_summaries(self.active_session_id(), self.params.recent_summaries_max)
            .map_err(Into::into)
    }

    /// `/new`: archive the active session and start a fresh one. The caller
    /// summarises the remaining tail *before* rotating.
    pub fn rotate(&self, now: i64) -> Result<i64> {
        let mut active = self.active.lock().unwrap();
        self.store.archive_session(*active, now)?;
        let fresh = self.store.create_session(now)?;
        info!(archived = *active, created = fresh.session_id, "session rotated");
        *active = fresh.session_id;
        Ok(fresh.session_id)
    }

    /// `/reset`: hard-delete the active session (turns, summaries, vectors,
    /// FTS rows) and start a fresh one.
    pub fn reset(&self, now: i64) -> Result<i64> {
        let mut active = self.active.lock().unwrap();
        self.store.delete_session(*active)?;
        let fresh = self.store.create_session(now)?;
        info!(deleted = *active, created = fresh.session_id, "session reset");
        *active = fresh.session_id;
        Ok(fresh.session_id)
    }
}
