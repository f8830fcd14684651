pub mod config;
pub mod error;
pub mod listing;

pub use config::{AiConfig, BotConfig, UserConfig};
pub use error::*;
pub use listing::*;
