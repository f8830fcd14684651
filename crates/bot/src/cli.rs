use std::path::PathBuf;

use clap::Parser;

/// Watches hh.ru for new vacancies and posts them to a Telegram chat.
#[derive(Parser, Debug)]
#[command(name = "jobwatch", version, about = "Job listing relay for Telegram")]
pub struct CliArgs {
    /// Load environment from this file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,
}
