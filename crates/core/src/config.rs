use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::listing::Experience;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load a specific env file. Missing files are an error here since the path was asked for.
pub fn load_dotenv_from(path: &std::path::Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path).map(|_| ()).map_err(|e| ConfigError::Invalid {
        key: "--env-file",
        value: path.display().to_string(),
        reason: e.to_string(),
    })
}

// ── Env helpers ───────────────────────────────────────────────

/// Key lookup backed by a closure, so tests never touch the process env.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn opt(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    /// Like `or`, but an explicitly empty value is kept (used by `AREA`).
    fn raw_or(&self, key: &str, default: &str) -> String {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.opt(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.opt(key) {
            None => Ok(None),
            Some(v) => v.parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
                key,
                value: v.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn bool(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.opt(key) {
            None => Ok(default),
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                key,
                value: v.clone(),
                reason: "expected true/false".to_string(),
            }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated query list, dropping blanks.
pub fn split_queries(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Search criteria ───────────────────────────────────────────

/// User search criteria. Built once at startup; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub queries: Vec<String>,
    /// 0 disables the salary filter.
    pub min_salary: u64,
    pub experience: Option<Experience>,
    /// hh.ru area id; empty means worldwide.
    pub area: String,
    pub remote_only: bool,
    pub check_interval: Duration,
    pub per_page: u32,
}

impl UserConfig {
    pub fn min_salary(&self) -> Option<u64> {
        (self.min_salary > 0).then_some(self.min_salary)
    }

    /// Human-readable summary used by `/start`.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Queries: {}", self.queries.join(", "))];
        lines.push(match self.min_salary() {
            Some(s) => format!("Min salary: {s}"),
            None => "Min salary: any".to_string(),
        });
        lines.push(format!(
            "Experience: {}",
            self.experience.map(|e| e.label()).unwrap_or("any")
        ));
        lines.push(format!(
            "Area: {}",
            if self.area.is_empty() { "worldwide" } else { self.area.as_str() }
        ));
        lines.push(format!("Remote only: {}", if self.remote_only { "yes" } else { "no" }));
        lines.push(format!(
            "Check interval: {} min",
            self.check_interval.as_secs_f64() / 60.0
        ));
        lines.join("\n")
    }
}

// ── AI scoring ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Listings scored below this are not delivered.
    pub min_score: u8,
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && self.gemini_api_key.is_some()
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub bot_token: String,
    /// Fixed delivery chat. When unset, `/start` binds the chat.
    pub chat_id: Option<i64>,
    pub database_path: PathBuf,
    pub send_delay: Duration,
    pub search: UserConfig,
    pub ai: AiConfig,
}

impl BotConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let queries = split_queries(&env.or("SEARCH_QUERY", "Frontend React"));
        if queries.is_empty() {
            return Err(ConfigError::Invalid {
                key: "SEARCH_QUERY",
                value: String::new(),
                reason: "at least one query is required".to_string(),
            });
        }

        let interval_secs = env.parsed::<u64>("CHECK_INTERVAL_SECONDS")?.unwrap_or(600);
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "CHECK_INTERVAL_SECONDS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let per_page = env.parsed::<u32>("PER_PAGE")?.unwrap_or(20);
        if per_page == 0 || per_page > 100 {
            return Err(ConfigError::Invalid {
                key: "PER_PAGE",
                value: per_page.to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        let search = UserConfig {
            queries,
            min_salary: env.parsed::<u64>("MIN_SALARY")?.unwrap_or(0),
            experience: env.parsed::<Experience>("EXPERIENCE")?,
            area: env.raw_or("AREA", "113"),
            remote_only: env.bool("REMOTE_ONLY", false)?,
            check_interval: Duration::from_secs(interval_secs),
            per_page,
        };

        let min_score = env.parsed::<u8>("MIN_AI_SCORE")?.unwrap_or(60);
        if min_score > 100 {
            return Err(ConfigError::Invalid {
                key: "MIN_AI_SCORE",
                value: min_score.to_string(),
                reason: "must be between 0 and 100".to_string(),
            });
        }

        let ai = AiConfig {
            enabled: env.bool("AI_FILTER_ENABLED", false)?,
            gemini_api_key: env.opt("GEMINI_API_KEY"),
            gemini_model: env.or("GEMINI_MODEL", "gemini-flash-latest"),
            min_score,
        };

        Ok(Self {
            bot_token: env.required("BOT_TOKEN")?,
            chat_id: env.parsed::<i64>("CHAT_ID")?,
            database_path: PathBuf::from(env.or("DATABASE_PATH", "data/vacancies.db")),
            send_delay: Duration::from_millis(env.parsed::<u64>("SEND_DELAY_MS")?.unwrap_or(1000)),
            search,
            ai,
        })
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  queries:     {}", self.search.queries.join(", "));
        tracing::info!(
            "  filters:     min_salary={}, experience={}, area={}, remote_only={}",
            self.search.min_salary,
            self.search.experience.map(|e| e.as_str()).unwrap_or("any"),
            if self.search.area.is_empty() { "worldwide" } else { self.search.area.as_str() },
            self.search.remote_only
        );
        tracing::info!("  interval:    {}s", self.search.check_interval.as_secs());
        tracing::info!(
            "  chat:        {}",
            self.chat_id
                .map(|c| c.to_string())
                .unwrap_or_else(|| "(bound by /start)".to_string())
        );
        tracing::info!("  database:    {}", self.database_path.display());
        tracing::info!(
            "  ai filter:   {}",
            if self.ai.is_configured() {
                format!("gemini model={} min_score={}", self.ai.gemini_model, self.ai.min_score)
            } else {
                "disabled".to_string()
            }
        );
    }
}
