use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use jobwatch_core::{Listing, SeenRecord, SeenStatus};

use crate::error::StoreError;

const TARGET_CHAT_KEY: &str = "target_chat_id";

/// Raw `seen_listings` row before status validation.
#[derive(Debug, sqlx::FromRow)]
struct SeenRow {
    listing_id: String,
    status: String,
    title: String,
    company: String,
    url: String,
    salary: Option<String>,
    delivered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeenRow> for SeenRecord {
    type Error = StoreError;

    fn try_from(row: SeenRow) -> Result<Self, Self::Error> {
        let status = SeenStatus::from_str(&row.status).map_err(|e| StoreError::InvalidStatus {
            listing_id: row.listing_id.clone(),
            reason: e.to_string(),
        })?;
        Ok(SeenRecord {
            listing_id: row.listing_id,
            status,
            title: row.title,
            company: row.company,
            url: row.url,
            salary: row.salary,
            delivered_at: row.delivered_at,
            updated_at: row.updated_at,
        })
    }
}

/// Dedup store. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct SeenStore {
    pool: SqlitePool,
}

impl SeenStore {
    /// Open (or create) the database file and apply migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "dedup store opened");
        Ok(store)
    }

    /// Private in-memory database. A single connection that never expires,
    /// since each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Close the pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// True if the listing was ever delivered, whatever its current status.
    pub async fn has_seen(&self, listing_id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM seen_listings WHERE listing_id = ?")
                .bind(listing_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Insert-or-ignore. Returns `true` only when this call created the row.
    pub async fn mark_seen(&self, listing: &Listing, status: SeenStatus) -> Result<bool, StoreError> {
        let now = Utc::now();
        let salary = listing.salary.as_ref().map(|s| s.to_string()).filter(|s| !s.is_empty());

        let result = sqlx::query(
            "INSERT OR IGNORE INTO seen_listings
                (listing_id, status, title, company, url, salary, delivered_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&listing.id)
        .bind(status.as_str())
        .bind(&listing.title)
        .bind(&listing.company)
        .bind(&listing.url)
        .bind(salary)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        debug!(listing_id = %listing.id, %status, inserted, "mark_seen");
        Ok(inserted)
    }

    /// Change the status of an existing record. Returns `false` if the
    /// listing was never delivered.
    pub async fn update_status(&self, listing_id: &str, status: SeenStatus) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE seen_listings SET status = ?, updated_at = ? WHERE listing_id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(listing_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, listing_id: &str) -> Result<Option<SeenRecord>, StoreError> {
        let row = sqlx::query_as::<_, SeenRow>(
            "SELECT listing_id, status, title, company, url, salary, delivered_at, updated_at
             FROM seen_listings
             WHERE listing_id = ?",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SeenRecord::try_from).transpose()
    }

    /// Favorited listings, most recently favorited first.
    pub async fn list_favorites(&self) -> Result<Vec<SeenRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SeenRow>(
            "SELECT listing_id, status, title, company, url, salary, delivered_at, updated_at
             FROM seen_listings
             WHERE status = ?
             ORDER BY updated_at DESC, listing_id",
        )
        .bind(SeenStatus::Favorited.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SeenRecord::try_from).collect()
    }

    /// Chat bound by `/start`, if any.
    pub async fn target_chat(&self) -> Result<Option<i64>, StoreError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM bot_settings WHERE key = ?")
            .bind(TARGET_CHAT_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    pub async fn set_target_chat(&self, chat_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bot_settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(TARGET_CHAT_KEY)
        .bind(chat_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
