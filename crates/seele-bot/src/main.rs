use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use seele_agent::BotContext;
use seele_scheduler::{SchedulerEngine, TaskRunner};
use seele_telegram::{TelegramAdapter, TelegramError};

mod app;

use app::{App, AppRunner};

/// A single-user companion agent with three-tier memory over Telegram.
#[derive(Parser, Debug)]
#[command(name = "seele-bot", version)]
struct Args {
    /// Path to seele.toml (env vars override file values).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // DEBUG / RUST_LOG tune verbosity only; behaviour never changes.
    let default_filter = if std::env::var("DEBUG").is_ok() {
        "seele=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let args = Args::parse();
    let config = seele_core::Config::load(args.config.as_deref())?;

    let bot_token = config
        .telegram_bot_token
        .clone()
        .ok_or(TelegramError::NoToken)?;
    let user_id = config.telegram_user_id.ok_or(TelegramError::NoAuthorizedUser)?;
    let poll_interval = Duration::from_secs(config.poll_interval_secs.max(1));
    let tz = config.tz();

    let (proactive_tx, proactive_rx) = tokio::sync::mpsc::channel(32);
    let app = App::bootstrap(config, proactive_tx).await?;
    info!(session = app.window().active_session_id(), "seele ready");

    // Backfill vectors for turns persisted while the embedder was down.
    let app2 = Arc::clone(&app);
    tokio::spawn(async move {
        seele_agent::pipeline::reconcile_missing_vectors(&app2, 256).await;
    });

    // Scheduler: fires proactive turns through the orchestrator.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let runner: Arc<dyn TaskRunner> = Arc::new(AppRunner(Arc::clone(&app)));
    let engine = SchedulerEngine::new(Arc::clone(app.store()), runner, poll_interval, tz);
    tokio::spawn(engine.run(shutdown_rx));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping scheduler");
            let _ = shutdown_tx.send(true);
        }
    });

    // The adapter long-polls for the lifetime of the process.
    TelegramAdapter::new(Arc::clone(&app), bot_token, user_id)
        .run(Some(proactive_rx))
        .await;

    Ok(())
}
