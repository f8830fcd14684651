//! Poll loop, command surface and update routing for the jobwatch bot.
//!
//! - `filter`: client-side match of listings against the search criteria
//! - `poller`: one serialized fetch → filter → dedup → deliver cycle
//! - `scheduler`: interval ticks driving the poller
//! - `commands` / `actions`: chat commands and inline button presses
//! - `updates`: `getUpdates` long-poll loop feeding the two above

pub mod actions;
pub mod commands;
pub mod filter;
pub mod poller;
pub mod scheduler;
pub mod updates;

pub use commands::{Command, CommandHandler};
pub use poller::{PollError, PollOutcome, PollReport, Poller};
