//! Task management operations backing the `scheduled_task` tool.

use chrono_tz::Tz;
use uuid::Uuid;

use seele_store::{ScheduledTask, Store, TaskStatus, TriggerConfig};

use crate::error::{Result, SchedulerError};
use crate::trigger;

/// Create a one-shot task from a user-facing trigger spec.
pub fn create_once(
    store: &Store,
    name: &str,
    when: &str,
    message: &str,
    now: i64,
    tz: Tz,
) -> Result<ScheduledTask> {
    let at = trigger::parse_once(when, now, tz)?;
    if at <= now {
        return Err(SchedulerError::BadArgument(format!(
            "trigger time must be in the future: {when}"
        )));
    }
    insert(store, name, TriggerConfig::Once { timestamp: at }, message, now)
}

/// Create a recurring task from a compact interval spec (`30s`, `5m`, …).
pub fn create_interval(
    store: &Store,
    name: &str,
    every: &str,
    message: &str,
    now: i64,
) -> Result<ScheduledTask> {
    let interval = trigger::parse_interval(every)?;
    insert(
        store,
        name,
        TriggerConfig::Interval { interval },
        message,
        now,
    )
}

fn insert(
    store: &Store,
    name: &str,
    trigger: TriggerConfig,
    message: &str,
    now: i64,
) -> Result<ScheduledTask> {
    if name.trim().is_empty() {
        return Err(SchedulerError::BadArgument("task name must not be empty".into()));
    }
    let task = ScheduledTask {
        task_id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        next_run_at: trigger.initial_next_run(now),
        trigger,
        message: message.to_string(),
        created_at: now,
        last_run_at: None,
        status: TaskStatus::Active,
    };
    store.upsert_task(&task)?;
    Ok(task)
}

pub fn pause(store: &Store, task_id: &str) -> Result<()> {
    let task = store.task(task_id)?;
    if task.status == TaskStatus::Completed {
        return Err(SchedulerError::BadArgument(format!(
            "task {task_id} is completed and cannot be paused"
        )));
    }
    store.set_task_status(task_id, TaskStatus::Paused)?;
    Ok(())
}

pub fn resume(store: &Store, task_id: &str) -> Result<()> {
    let task = store.task(task_id)?;
    if task.status != TaskStatus::Paused {
        return Err(SchedulerError::BadArgument(format!(
            "task {task_id} is not paused"
        )));
    }
    store.set_task_status(task_id, TaskStatus::Active)?;
    Ok(())
}

/// Cancel a task — terminal, like a `once` task after its firing.
pub fn cancel(store: &Store, task_id: &str) -> Result<()> {
    store.task(task_id)?;
    store.set_task_status(task_id, TaskStatus::Completed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn store() -> Store {
        Store::open_in_memory(4).unwrap()
    }

    #[test]
    fn create_once_from_relative_grammar() {
        let store = store();
        let task = create_once(&store, "wake", "in 5 minutes", "good morning", NOW, Tz::UTC)
            .unwrap();
        assert_eq!(task.next_run_at, NOW + 300);
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(store.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn past_once_trigger_is_rejected() {
        let store = store();
        let err = create_once(&store, "late", "1000", "too late", NOW, Tz::UTC).unwrap_err();
        assert!(matches!(err, SchedulerError::BadArgument(_)));
        assert!(store.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn create_interval_sets_first_run_one_interval_out() {
        let store = store();
        let task = create_interval(&store, "tick", "1h", "hourly check", NOW).unwrap();
        assert_eq!(task.next_run_at, NOW + 3600);
        assert_eq!(task.trigger, TriggerConfig::Interval { interval: 3600 });
    }

    #[test]
    fn pause_resume_cancel_lifecycle() {
        let store = store();
        let task = create_interval(&store, "tick", "5m", "m", NOW).unwrap();

        pause(&store, &task.task_id).unwrap();
        assert_eq!(store.task(&task.task_id).unwrap().status, TaskStatus::Paused);

        resume(&store, &task.task_id).unwrap();
        assert_eq!(store.task(&task.task_id).unwrap().status, TaskStatus::Active);

        cancel(&store, &task.task_id).unwrap();
        assert_eq!(
            store.task(&task.task_id).unwrap().status,
            TaskStatus::Completed
        );

        // Completed is terminal for pause.
        assert!(pause(&store, &task.task_id).is_err());
    }

    #[test]
    fn unknown_task_id_is_not_found() {
        let store = store();
        let err = cancel(&store, "nope").unwrap_err();
        assert_eq!(err.kind(), seele_core::ErrorKind::NotFound);
    }
}
