//! `getUpdates` long-poll loop routing messages and button presses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use jobwatch_notify::types::Update;
use jobwatch_notify::{NotifyError, TelegramClient};

use crate::actions::on_action;
use crate::commands::CommandHandler;

/// Server-side wait of each `getUpdates` call.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed `getUpdates` before trying again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Anything that can hand out batches of updates after an offset.
#[async_trait]
pub trait UpdateFeed: Send + Sync {
    async fn fetch(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, NotifyError>;
}

#[async_trait]
impl UpdateFeed for TelegramClient {
    async fn fetch(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, NotifyError> {
        self.get_updates(offset, timeout_secs).await
    }
}

/// Route a single update to the command handler or the action handler.
pub async fn route_update(handler: &CommandHandler, update: &Update) {
    if let Some(callback) = &update.callback_query {
        let outcome = on_action(handler.poller(), callback).await;
        debug!(update_id = update.update_id, ?outcome, "callback handled");
        return;
    }

    if let Some(message) = &update.message {
        if let Some(text) = message.text.as_deref() {
            handler.handle_text(message.chat.id, text).await;
        }
    }
}

/// Long-poll until `shutdown` is notified. Updates are handled one at a
/// time, in order; the offset advances past each batch.
pub async fn run_updates(feed: Arc<dyn UpdateFeed>, handler: Arc<CommandHandler>, shutdown: Arc<Notify>) {
    info!("update loop started");
    let mut offset: i64 = 0;

    loop {
        let batch = tokio::select! {
            _ = shutdown.notified() => {
                info!("update loop stopping");
                return;
            }
            batch = feed.fetch(offset, LONG_POLL_TIMEOUT_SECS) => batch,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    route_update(&handler, &update).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying in {}s", ERROR_BACKOFF.as_secs());
                tokio::select! {
                    _ = shutdown.notified() => {
                        info!("update loop stopping");
                        return;
                    }
                    _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                }
            }
        }
    }
}
