//! Notifier trait definition and shared error types.

use jobwatch_core::Listing;

use crate::types::InlineKeyboardMarkup;

/// Chat-side message identifier.
pub type MessageId = i64;

/// Errors that can occur while talking to the chat API.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API error {code}: {description}")]
    Api { code: u16, description: String },

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("failed to decode chat API response: {0}")]
    Decode(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// AI assessment shown under a listing. Empty strings are not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AiSummary {
    pub score: u8,
    pub stack: String,
    pub pros: String,
    pub cons: String,
    pub verdict: String,
}

/// A listing about to be delivered, plus the optional AI assessment.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OutgoingListing {
    pub listing: Listing,
    pub ai: Option<AiSummary>,
}

impl OutgoingListing {
    pub fn plain(listing: Listing) -> Self {
        Self { listing, ai: None }
    }
}

/// Chat channel used by the poller and the command surface.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a listing with its favorite/hide actions attached.
    async fn send(&self, chat_id: i64, item: &OutgoingListing) -> Result<MessageId, NotifyError>;

    /// Send an HTML reply to a command.
    async fn reply(&self, chat_id: i64, html: &str) -> Result<MessageId, NotifyError>;

    /// Answer a button press with a short toast.
    async fn acknowledge(&self, callback_id: &str, text: &str) -> Result<(), NotifyError>;

    /// Replace (or with `None`, remove) the inline keyboard of a sent message.
    async fn edit_actions(
        &self,
        chat_id: i64,
        message_id: MessageId,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "telegram").
    fn channel_name(&self) -> &str;
}
