use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::{error, info, warn};

use seele_core::time::{human_time, now_epoch};
use seele_store::{ScheduledTask, Store};

use crate::error::Result;

/// Fixed preamble marking a scheduler-synthesised prompt.
pub const SCHEDULED_PREAMBLE: &str = "[SYSTEM_SCHEDULED_TASK]";

/// Callback seam into the orchestrator. The runner receives the synthetic
/// user-role prompt; the prompt itself is never stored as a turn.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run_scheduled(&self, task: &ScheduledTask, prompt: &str)
        -> std::result::Result<(), String>;
}

/// Compose the synthetic prompt for a firing: preamble, task name, the
/// formatted trigger time, and the task's briefing.
pub fn synthetic_prompt(task: &ScheduledTask, tz: Tz) -> String {
    format!(
        "{SCHEDULED_PREAMBLE}\nTask: {}\nScheduled for: {}\nBriefing: {}\n\
         Act on this briefing and message the user as appropriate.",
        task.name,
        human_time(task.next_run_at, tz),
        task.message,
    )
}

/// Polls the store for due tasks and drives firings at `poll_interval`
/// granularity (default 10 s; ±one interval of jitter is acceptable).
pub struct SchedulerEngine {
    store: Arc<Store>,
    runner: Arc<dyn TaskRunner>,
    poll_interval: Duration,
    tz: Tz,
}

impl SchedulerEngine {
    pub fn new(
        store: Arc<Store>,
        runner: Arc<dyn TaskRunner>,
        poll_interval: Duration,
        tz: Tz,
    ) -> Self {
        Self {
            store,
            runner,
            poll_interval,
            tz,
        }
    }

    /// Main loop. Polls until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(poll_secs = self.poll_interval.as_secs_f64(), "scheduler started");
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once(now_epoch()).await {
                        error!(kind = %e.kind(), error = %e, "scheduler poll failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Process every task due at `now`, in `next_run_at` order.
    ///
    /// The attempt record commits before the loop advances: `once` tasks
    /// flip to `completed` in the same statement as the `last_run_at`
    /// stamp (so a slow firing can never cause a refire), `interval`
    /// tasks advance by their interval and stay active. A failed firing is
    /// logged and recorded the same way — availability is traded for the
    /// no-refire guarantee.
    pub async fn poll_once(&self, now: i64) -> Result<()> {
        let due = self.store.tasks_due(now)?;
        for task in due {
            let prompt = synthetic_prompt(&task, self.tz);
            info!(task_id = %task.task_id, name = %task.name, "firing scheduled task");

            if let Err(e) = self.runner.run_scheduled(&task, &prompt).await {
                warn!(task_id = %task.task_id, error = %e, "scheduled firing failed");
            }

            self.store.complete_firing(&task, now_epoch())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use seele_store::{TaskStatus, TriggerConfig};

    struct RecordingRunner {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TaskRunner for RecordingRunner {
        async fn run_scheduled(
            &self,
            _task: &ScheduledTask,
            prompt: &str,
        ) -> std::result::Result<(), String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err("runner down".into())
            } else {
                Ok(())
            }
        }
    }

    fn engine(store: Arc<Store>, fail: bool) -> (SchedulerEngine, Arc<RecordingRunner>) {
        let runner = Arc::new(RecordingRunner {
            prompts: Mutex::new(Vec::new()),
            fail,
        });
        let engine = SchedulerEngine::new(
            store,
            Arc::clone(&runner) as Arc<dyn TaskRunner>,
            Duration::from_secs(1),
            chrono_tz::Tz::UTC,
        );
        (engine, runner)
    }

    fn seed_once(store: &Store, id: &str, at: i64) {
        store
            .upsert_task(&ScheduledTask {
                task_id: id.into(),
                name: "wake".into(),
                trigger: TriggerConfig::Once { timestamp: at },
                message: "M".into(),
                created_at: at - 100,
                next_run_at: at,
                last_run_at: None,
                status: TaskStatus::Active,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn once_task_fires_exactly_once() {
        let store = Arc::new(Store::open_in_memory(4).unwrap());
        seed_once(&store, "t1", 1000);
        let (engine, runner) = engine(Arc::clone(&store), false);

        engine.poll_once(1000).await.unwrap();
        engine.poll_once(2000).await.unwrap();
        engine.poll_once(i64::MAX).await.unwrap();

        let prompts = runner.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with(SCHEDULED_PREAMBLE));
        assert!(prompts[0].contains("Briefing: M"));
        assert_eq!(store.task("t1").unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn failed_once_firing_still_completes() {
        let store = Arc::new(Store::open_in_memory(4).unwrap());
        seed_once(&store, "t1", 1000);
        let (engine, runner) = engine(Arc::clone(&store), true);

        engine.poll_once(1000).await.unwrap();
        engine.poll_once(2000).await.unwrap();

        assert_eq!(runner.prompts.lock().unwrap().len(), 1);
        let task = store.task("t1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.last_run_at.is_some());
    }

    #[tokio::test]
    async fn interval_task_advances_each_poll() {
        let store = Arc::new(Store::open_in_memory(4).unwrap());
        store
            .upsert_task(&ScheduledTask {
                task_id: "t2".into(),
                name: "tick".into(),
                trigger: TriggerConfig::Interval { interval: 300 },
                message: "check".into(),
                created_at: 700,
                next_run_at: 1000,
                last_run_at: None,
                status: TaskStatus::Active,
            })
            .unwrap();
        let (engine, runner) = engine(Arc::clone(&store), false);

        engine.poll_once(1000).await.unwrap();
        let after_first = store.task("t2").unwrap();
        assert_eq!(after_first.status, TaskStatus::Active);
        assert!(after_first.next_run_at >= 1300);

        // Not yet due again.
        engine.poll_once(after_first.next_run_at - 1).await.unwrap();
        assert_eq!(runner.prompts.lock().unwrap().len(), 1);

        engine.poll_once(after_first.next_run_at).await.unwrap();
        assert_eq!(runner.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn due_tasks_fire_in_next_run_order() {
        let store = Arc::new(Store::open_in_memory(4).unwrap());
        store
            .upsert_task(&ScheduledTask {
                task_id: "late".into(),
                name: "late".into(),
                trigger: TriggerConfig::Once { timestamp: 900 },
                message: "second".into(),
                created_at: 100,
                next_run_at: 900,
                last_run_at: None,
                status: TaskStatus::Active,
            })
            .unwrap();
        store
            .upsert_task(&ScheduledTask {
                task_id: "early".into(),
                name: "early".into(),
                trigger: TriggerConfig::Once { timestamp: 500 },
                message: "first".into(),
                created_at: 100,
                next_run_at: 500,
                last_run_at: None,
                status: TaskStatus::Active,
            })
            .unwrap();
        let (engine, runner) = engine(store, false);

        engine.poll_once(1000).await.unwrap();
        let prompts = runner.prompts.lock().unwrap();
        assert!(prompts[0].contains("first"));
        assert!(prompts[1].contains("second"));
    }

    #[tokio::test]
    async fn paused_tasks_never_fire() {
        let store = Arc::new(Store::open_in_memory(4).unwrap());
        seed_once(&store, "t3", 1000);
        store
            .set_task_status("t3", TaskStatus::Paused)
            .unwrap();
        let (engine, runner) = engine(store, false);

        engine.poll_once(5000).await.unwrap();
        assert!(runner.prompts.lock().unwrap().is_empty());
    }
}
