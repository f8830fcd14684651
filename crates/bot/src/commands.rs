//! Chat command surface: `/start`, `/jobs`, `/favorites`, `/help`.

use std::sync::Arc;

use tracing::{error, info, warn};

use jobwatch_notify::types::BotCommand;
use jobwatch_notify::{escape_html, ListingRenderer, NotifyError};

use crate::poller::{PollOutcome, Poller};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Jobs,
    Favorites,
    Help,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Start, Command::Jobs, Command::Favorites, Command::Help];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Jobs => "jobs",
            Command::Favorites => "favorites",
            Command::Help => "help",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Deliver listings to this chat and show search settings",
            Command::Jobs => "Check for new listings now",
            Command::Favorites => "Show saved listings",
            Command::Help => "List commands",
        }
    }

    /// Parse the first word of a message. Accepts `/cmd` and `/cmd@botname`.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(cmd, _)| cmd);
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

/// Command list registered through `setMyCommands`.
pub fn bot_commands() -> Vec<BotCommand> {
    Command::ALL
        .iter()
        .map(|c| BotCommand {
            command: c.name().to_string(),
            description: c.description().to_string(),
        })
        .collect()
}

fn help_text() -> String {
    let mut text = String::from("<b>Commands</b>\n");
    for c in Command::ALL {
        text.push_str(&format!("/{} - {}\n", c.name(), c.description()));
    }
    text.trim_end().to_string()
}

/// Executes commands against the shared poller and replies through its notifier.
pub struct CommandHandler {
    poller: Arc<Poller>,
    renderer: ListingRenderer,
}

impl CommandHandler {
    pub fn new(poller: Arc<Poller>) -> Result<Self, NotifyError> {
        Ok(Self {
            poller,
            renderer: ListingRenderer::new()?,
        })
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    /// Handle a plain text message; non-commands are ignored.
    pub async fn handle_text(&self, chat_id: i64, text: &str) {
        if let Some(command) = Command::parse(text) {
            self.handle(chat_id, command).await;
        }
    }

    pub async fn handle(&self, chat_id: i64, command: Command) {
        info!(chat_id, command = command.name(), "command received");
        match command {
            Command::Start => self.start(chat_id).await,
            Command::Jobs => self.jobs(chat_id).await,
            Command::Favorites => self.favorites(chat_id).await,
            Command::Help => self.reply(chat_id, &help_text()).await,
        }
    }

    async fn reply(&self, chat_id: i64, html: &str) {
        if let Err(e) = self.poller.notifier().reply(chat_id, html).await {
            warn!(chat_id, error = %e, "failed to send reply");
        }
    }

    async fn start(&self, chat_id: i64) {
        let config = self.poller.config();

        let delivery = match config.chat_id {
            Some(fixed) if fixed != chat_id => {
                "New listings go to the chat configured with CHAT_ID.".to_string()
            }
            Some(_) => "New listings will be sent to this chat.".to_string(),
            None => match self.poller.store().set_target_chat(chat_id).await {
                Ok(()) => {
                    info!(chat_id, "target chat bound");
                    "New listings will be sent to this chat.".to_string()
                }
                Err(e) => {
                    error!(chat_id, error = %e, "failed to store target chat");
                    "⚠️ Could not save this chat as the target. Try /start again later.".to_string()
                }
            },
        };

        let text = format!(
            "👋 Hi! I watch hh.ru for new listings.\n\n<b>Search settings</b>\n{}\n\n{}",
            escape_html(&config.search.summary()),
            delivery
        );
        self.reply(chat_id, &text).await;

        match self.poller.run_cycle().await {
            Ok(outcome) => info!(chat_id, ?outcome, "initial check after /start"),
            Err(e) => error!(chat_id, error = %e, "initial check failed"),
        }
    }

    async fn jobs(&self, chat_id: i64) {
        let text = match self.poller.run_cycle().await {
            Ok(PollOutcome::Completed(report)) if report.delivered == 0 => {
                format!("No new listings ({report}).")
            }
            Ok(PollOutcome::Completed(report)) => format!("Check finished: {report}."),
            Ok(PollOutcome::AlreadyRunning) => {
                "A check is already running; new listings will arrive shortly.".to_string()
            }
            Ok(PollOutcome::NoTargetChat) => "No target chat yet. Send /start first.".to_string(),
            Err(e) => {
                error!(chat_id, error = %e, "manual check failed");
                "⚠️ The check failed. Please try again later.".to_string()
            }
        };
        self.reply(chat_id, &text).await;
    }

    async fn favorites(&self, chat_id: i64) {
        let records = match self.poller.store().list_favorites().await {
            Ok(records) => records,
            Err(e) => {
                error!(chat_id, error = %e, "failed to load favorites");
                self.reply(chat_id, "⚠️ Could not load favorites.").await;
                return;
            }
        };

        match self.renderer.render_favorites(&records) {
            Ok(pages) => {
                for page in pages {
                    self.reply(chat_id, &page).await;
                }
            }
            Err(e) => error!(chat_id, error = %e, "failed to render favorites"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::tests::{config, listing, poller, MockNotifier, MockSource, QUERY};
    use jobwatch_core::SeenStatus;

    async fn handler(chat_id: Option<i64>, source: MockSource) -> (CommandHandler, Arc<MockNotifier>) {
        let notifier = Arc::new(MockNotifier::default());
        let poller = poller(config(chat_id), Arc::new(source), notifier.clone()).await;
        (CommandHandler::new(Arc::new(poller)).unwrap(), notifier)
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/jobs@jobwatch_bot"), Some(Command::Jobs));
        assert_eq!(Command::parse("  /Favorites please"), Some(Command::Favorites));
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("jobs"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn registered_commands_cover_all() {
        let names: Vec<String> = bot_commands().into_iter().map(|c| c.command).collect();
        assert_eq!(names, vec!["start", "jobs", "favorites", "help"]);
        assert!(help_text().contains("/favorites - Show saved listings"));
    }

    #[tokio::test]
    async fn start_binds_chat_and_polls() {
        let (handler, notifier) = handler(None, MockSource::with(QUERY, vec![listing("1", None)])).await;

        handler.handle_text(555, "/start").await;

        assert_eq!(handler.poller().store().target_chat().await.unwrap(), Some(555));
        let replies = notifier.reply_texts();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("Queries: Frontend React"));
        assert!(replies[0].contains("sent to this chat"));
        // the immediate check delivered to the new chat
        assert_eq!(notifier.sent.lock().unwrap()[0].0, 555);
    }

    #[tokio::test]
    async fn start_keeps_configured_chat() {
        let (handler, notifier) = handler(Some(1), MockSource::default()).await;

        handler.handle(2, Command::Start).await;

        assert_eq!(handler.poller().store().target_chat().await.unwrap(), None);
        assert!(notifier.reply_texts()[0].contains("configured with CHAT_ID"));
    }

    #[tokio::test]
    async fn jobs_reports_cycle_summary() {
        let (handler, notifier) = handler(Some(1), MockSource::with(QUERY, vec![listing("1", None)])).await;

        handler.handle(1, Command::Jobs).await;
        handler.handle(1, Command::Jobs).await;

        let replies = notifier.reply_texts();
        assert!(replies[0].starts_with("Check finished: delivered 1"));
        assert!(replies[1].starts_with("No new listings (delivered 0"));
    }

    #[tokio::test]
    async fn jobs_without_chat_asks_for_start() {
        let (handler, notifier) = handler(None, MockSource::default()).await;
        handler.handle(9, Command::Jobs).await;
        assert!(notifier.reply_texts()[0].contains("Send /start first"));
    }

    #[tokio::test]
    async fn favorites_lists_saved_listings() {
        let (handler, notifier) = handler(Some(1), MockSource::default()).await;
        let store = handler.poller().store();

        let saved = listing("77", Some(200_000));
        store.mark_seen(&saved, SeenStatus::Delivered).await.unwrap();
        store.update_status("77", SeenStatus::Favorited).await.unwrap();
        store.mark_seen(&listing("78", None), SeenStatus::Delivered).await.unwrap();

        handler.handle(1, Command::Favorites).await;

        let replies = notifier.reply_texts();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("Favorites (1)"));
        assert!(replies[0].contains(&saved.title));
        assert!(replies[0].contains("https://hh.ru/vacancy/77"));
        assert!(!replies[0].contains("https://hh.ru/vacancy/78"));
    }

    #[tokio::test]
    async fn favorites_when_empty() {
        let (handler, notifier) = handler(Some(1), MockSource::default()).await;
        handler.handle(1, Command::Favorites).await;
        assert!(notifier.reply_texts()[0].starts_with("No favorites yet"));
    }

    #[tokio::test]
    async fn plain_text_is_ignored() {
        let (handler, notifier) = handler(Some(1), MockSource::default()).await;
        handler.handle_text(1, "hello there").await;
        assert!(notifier.reply_texts().is_empty());
    }
}
