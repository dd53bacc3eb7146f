//! `seele-scheduler` — the durable timer that lets the agent speak first.
//!
//! Tasks live in the store's `task` table. The engine polls every
//! `POLL_INTERVAL`, fires each due task through a [`engine::TaskRunner`],
//! and records the attempt atomically: a `once` task transitions to
//! `completed` in the same statement that stamps `last_run_at`, so it can
//! never refire; an `interval` task advances `next_run_at` and stays
//! active.
//!
//! Trigger inputs from the LLM go through the restricted grammar in
//! [`trigger`]; preset tasks are merged idempotently from a JSON seed
//! file by [`seed`].

pub mod engine;
pub mod error;
pub mod ops;
pub mod seed;
pub mod trigger;

pub use engine::{synthetic_prompt, SchedulerEngine, TaskRunner};
pub use error::{Result, SchedulerError};
