//! Seed-task loading — preset tasks merged from a JSON file on startup.
//!
//! Identity is `(name, trigger_type, trigger_config)`: loading the same
//! file twice creates nothing new.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use seele_store::{ScheduledTask, Store, TaskStatus, TriggerConfig};

use crate::error::{Result, SchedulerError};

#[derive(Debug, Deserialize)]
struct SeedTask {
    name: String,
    trigger_type: String,
    trigger_config: TriggerConfig,
    message: String,
}

/// Merge the seed file into the store. Returns the number of tasks added.
pub fn load_seed_file(store: &Store, path: &Path, now: i64) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SchedulerError::Seed(format!("{}: {e}", path.display())))?;
    let tasks: Vec<SeedTask> = serde_json::from_str(&raw)
        .map_err(|e| SchedulerError::Seed(format!("{}: {e}", path.display())))?;

    let mut added = 0;
    for seed in tasks {
        if seed.trigger_config.trigger_type() != seed.trigger_type {
            warn!(
                name = %seed.name,
                declared = %seed.trigger_type,
                "seed task trigger_type does not match its config, skipping"
            );
            continue;
        }
        if store
            .find_task_by_identity(&seed.name, &seed.trigger_config)?
            .is_some()
        {
            continue;
        }
        let next_run_at = seed.trigger_config.initial_next_run(now);
        if next_run_at <= now {
            warn!(name = %seed.name, "seed task fires in the past, skipping");
            continue;
        }
        store.upsert_task(&ScheduledTask {
            task_id: Uuid::new_v4().to_string(),
            name: seed.name,
            trigger: seed.trigger_config,
            message: seed.message,
            created_at: now,
            next_run_at,
            last_run_at: None,
            status: TaskStatus::Active,
        })?;
        added += 1;
    }

    if added > 0 {
        info!(added, path = %path.display(), "seed tasks loaded");
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NOW: i64 = 1_700_000_000;

    fn seed_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loading_twice_adds_nothing_new() {
        let store = Store::open_in_memory(4).unwrap();
        let file = seed_file(
            r#"[
                {"name": "morning", "trigger_type": "interval",
                 "trigger_config": {"interval": 86400},
                 "message": "say good morning"},
                {"name": "checkin", "trigger_type": "interval",
                 "trigger_config": {"interval": 3600},
                 "message": "check in"}
            ]"#,
        );

        assert_eq!(load_seed_file(&store, file.path(), NOW).unwrap(), 2);
        assert_eq!(load_seed_file(&store, file.path(), NOW + 10).unwrap(), 0);
        assert_eq!(store.list_tasks().unwrap().len(), 2);
    }

    #[test]
    fn past_once_seed_is_skipped() {
        let store = Store::open_in_memory(4).unwrap();
        let file = seed_file(
            r#"[{"name": "stale", "trigger_type": "once",
                 "trigger_config": {"timestamp": 1000},
                 "message": "never"}]"#,
        );
        assert_eq!(load_seed_file(&store, file.path(), NOW).unwrap(), 0);
        assert!(store.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn mismatched_trigger_type_is_skipped() {
        let store = Store::open_in_memory(4).unwrap();
        let file = seed_file(
            r#"[{"name": "odd", "trigger_type": "once",
                 "trigger_config": {"interval": 60},
                 "message": "odd"}]"#,
        );
        assert_eq!(load_seed_file(&store, file.path(), NOW).unwrap(), 0);
    }

    #[test]
    fn malformed_seed_file_is_an_error() {
        let store = Store::open_in_memory(4).unwrap();
        let file = seed_file("not json");
        assert!(load_seed_file(&store, file.path(), NOW).is_err());
    }
}
