//! `seele-store` — the embedded relational store.
//!
//! A single SQLite file holds sessions, turns, summaries, scheduled tasks
//! and meta, plus two sidecar index families kept aligned with the rows
//! they shadow:
//!
//! * FTS5 external-content tables (`turn_fts`, `summary_fts`), synchronised
//!   by storage-level triggers — a turn/summary row always has exactly one
//!   FTS row.
//! * sqlite-vec `vec0` tables (`turn_vec`, `summary_vec`) holding one
//!   embedding per row, dimension-checked against the dimension recorded
//!   in `meta` at creation time.
//!
//! All writes go through one connection behind a mutex; operations fail
//! with `NotFound`, `Conflict`, `BadQuery` or `Unavailable` — never with a
//! silent partial write.

pub mod db;
pub mod error;
pub mod fts;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::{FtsFilter, Store, VectorFilter, VectorKind};
pub use types::{
    Role, ScheduledTask, Session, SessionStatus, Summary, TaskStatus, TriggerConfig, Turn,
};
