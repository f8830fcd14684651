//! Chat delivery for job listings.
//!
//! This crate provides:
//! - `Notifier` trait for the chat channel (send, reply, acknowledge, edit actions)
//! - Telegram Bot API client and its wire types
//! - Inline keyboard builders and callback data codec for favorite/hide actions
//! - Minijinja templates for listing and favorites messages

pub mod keyboard;
pub mod telegram;
pub mod templating;
pub mod traits;
pub mod types;

pub use keyboard::ListingAction;
pub use telegram::{escape_html, TelegramClient};
pub use templating::ListingRenderer;
pub use traits::{AiSummary, MessageId, Notifier, NotifyError, OutgoingListing};
