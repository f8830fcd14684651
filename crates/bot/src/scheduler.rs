//! Interval-driven background polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::poller::{PollOutcome, Poller};

/// Delay before the first cycle, so startup logging and `setMyCommands` settle first.
pub const WARM_UP: Duration = Duration::from_secs(10);

/// Run poll cycles every `check_interval` until `shutdown` is notified.
///
/// Ticks missed while a cycle runs long are skipped rather than bunched up.
pub async fn run_scheduler(poller: Arc<Poller>, warm_up: Duration, shutdown: Arc<Notify>) {
    let period = poller.config().search.check_interval;
    info!("poll scheduler started (interval: {}s)", period.as_secs());

    let start = tokio::time::Instant::now() + warm_up;
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("poll scheduler stopping");
                return;
            }
            _ = ticker.tick() => {
                match poller.run_cycle().await {
                    Ok(PollOutcome::Completed(_)) | Ok(PollOutcome::NoTargetChat) => {}
                    Ok(PollOutcome::AlreadyRunning) => info!("previous cycle still running, tick skipped"),
                    Err(e) => error!(error = %e, "poll cycle aborted"),
                }
            }
        }
    }
}
