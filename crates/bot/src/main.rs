mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use jobwatch_bot::commands::bot_commands;
use jobwatch_bot::scheduler::{run_scheduler, WARM_UP};
use jobwatch_bot::updates::run_updates;
use jobwatch_bot::{CommandHandler, PollOutcome, Poller};
use jobwatch_core::config::{load_dotenv, load_dotenv_from};
use jobwatch_core::BotConfig;
use jobwatch_llm::{GeminiProvider, VacancyScorer};
use jobwatch_notify::TelegramClient;
use jobwatch_source::HhClient;
use jobwatch_storage::SeenStore;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    match &args.env_file {
        Some(path) => load_dotenv_from(path).context("failed to load env file")?,
        None => load_dotenv(),
    }

    let mut config = BotConfig::from_env().context("invalid configuration")?;
    if let Some(path) = &args.database {
        config.database_path = path.clone();
    }
    config.log_summary();
    let config = Arc::new(config);

    let store = SeenStore::open(&config.database_path)
        .await
        .context("failed to open dedup store")?;

    let telegram = Arc::new(
        TelegramClient::from_config(config.bot_token.clone())
            .context("failed to create Telegram client")?,
    );
    let source = Arc::new(HhClient::new().context("failed to create hh.ru client")?);

    let mut poller = Poller::new(config.clone(), source, store.clone(), telegram.clone());
    if config.ai.is_configured() {
        let provider = GeminiProvider::from_config(&config.ai).context("failed to configure Gemini")?;
        poller = poller.with_scorer(Arc::new(VacancyScorer::new(Box::new(provider), config.ai.min_score)));
        info!("AI filter enabled");
    } else if config.ai.enabled {
        warn!("AI_FILTER_ENABLED is set but GEMINI_API_KEY is missing; AI filter disabled");
    }
    let poller = Arc::new(poller);

    if args.once {
        let outcome = poller.run_cycle().await.context("poll cycle failed")?;
        match outcome {
            PollOutcome::Completed(report) => info!(%report, "single cycle finished"),
            PollOutcome::NoTargetChat => warn!("no target chat: set CHAT_ID or send /start first"),
            PollOutcome::AlreadyRunning => {}
        }
        store.close().await;
        return Ok(());
    }

    if let Err(e) = telegram.set_my_commands(&bot_commands()).await {
        warn!(error = %e, "failed to register bot commands");
    }

    let handler = Arc::new(CommandHandler::new(poller.clone()).context("failed to build command handler")?);
    // One signal per task: a stored permit reaches a task that is mid-cycle.
    let stop_scheduler = Arc::new(Notify::new());
    let stop_updates = Arc::new(Notify::new());

    let scheduler = tokio::spawn(run_scheduler(poller.clone(), WARM_UP, stop_scheduler.clone()));
    let updates = tokio::spawn(run_updates(telegram.clone(), handler, stop_updates.clone()));

    info!("bot started");
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("shutting down");
    stop_scheduler.notify_one();
    stop_updates.notify_one();

    for (name, task) in [("scheduler", scheduler), ("updates", updates)] {
        if let Err(e) = task.await {
            error!(task = name, error = %e, "task panicked");
        }
    }

    store.close().await;
    info!("bye");
    Ok(())
}
