//! hh.ru vacancy search client.
//!
//! Wraps `GET /vacancies` with `order_by=publication_time`, so results come
//! back newest-first. Salary, experience, area and remote filters are passed
//! through as query parameters; the poller re-checks them client-side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use jobwatch_core::{Experience, Listing, Salary, UserConfig};

use crate::error::SourceError;
use crate::traits::ListingSource;

const DEFAULT_BASE_URL: &str = "https://api.hh.ru";

/// hh.ru rejects requests without a descriptive User-Agent.
const USER_AGENT: &str = concat!("jobwatch/", env!("CARGO_PKG_VERSION"));

pub struct HhClient {
    client: reqwest::Client,
    base_url: String,
}

impl HhClient {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (mirrors, local fixtures).
    pub fn with_base_url(base_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query parameters for one search.
    pub fn build_query(query: &str, filters: &UserConfig) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("text", query.to_string()),
            ("order_by", "publication_time".to_string()),
            ("per_page", filters.per_page.to_string()),
            ("search_field", "name".to_string()),
        ];
        if !filters.area.is_empty() {
            params.push(("area", filters.area.clone()));
        }
        if let Some(min) = filters.min_salary() {
            params.push(("salary", min.to_string()));
        }
        if let Some(exp) = filters.experience {
            params.push(("experience", exp.as_str().to_string()));
        }
        if filters.remote_only {
            params.push(("schedule", "remote".to_string()));
        }
        params
    }

    /// Decode a `/vacancies` response body into normalized listings.
    pub fn parse_response(body: &str) -> Result<Vec<Listing>, SourceError> {
        let resp: SearchResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(resp.items.into_iter().filter_map(HhVacancy::into_listing).collect())
    }
}

#[async_trait]
impl ListingSource for HhClient {
    async fn search(&self, query: &str, filters: &UserConfig) -> Result<Vec<Listing>, SourceError> {
        let url = format!("{}/vacancies", self.base_url);
        let params = Self::build_query(query, filters);

        debug!(query, params = params.len(), "hh.ru search request");

        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&body, 200)
            )));
        }

        let body = response.text().await?;
        let listings = Self::parse_response(&body)?;
        debug!(query, count = listings.len(), "hh.ru search returned");
        Ok(listings)
    }

    fn source_name(&self) -> &str {
        "hh.ru"
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<HhVacancy>,
}

#[derive(Debug, Deserialize)]
struct HhVacancy {
    id: Option<String>,
    name: Option<String>,
    employer: Option<Named>,
    salary: Option<HhSalary>,
    experience: Option<IdRef>,
    schedule: Option<IdRef>,
    area: Option<Named>,
    alternate_url: Option<String>,
    published_at: Option<String>,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HhSalary {
    from: Option<u64>,
    to: Option<u64>,
    currency: Option<String>,
    gross: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    requirement: Option<String>,
    responsibility: Option<String>,
}

impl HhVacancy {
    /// Items without an id cannot be deduplicated and are dropped.
    fn into_listing(self) -> Option<Listing> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let url = self
            .alternate_url
            .unwrap_or_else(|| format!("https://hh.ru/vacancy/{id}"));
        let (requirement, responsibility) = match self.snippet {
            Some(s) => (
                s.requirement.map(|t| strip_tags(&t)),
                s.responsibility.map(|t| strip_tags(&t)),
            ),
            None => (None, None),
        };

        Some(Listing {
            title: self.name.unwrap_or_else(|| "No title".to_string()),
            company: self
                .employer
                .and_then(|e| e.name)
                .unwrap_or_else(|| "Unknown company".to_string()),
            salary: self.salary.map(|s| Salary {
                from: s.from,
                to: s.to,
                currency: s.currency,
                gross: s.gross,
            }),
            experience: self
                .experience
                .and_then(|e| e.id)
                .and_then(|id| id.parse::<Experience>().ok()),
            remote: self
                .schedule
                .and_then(|s| s.id)
                .is_some_and(|id| id == "remote"),
            area: self.area.and_then(|a| a.name),
            published_at: self.published_at.as_deref().and_then(parse_published_at),
            url,
            id,
            requirement,
            responsibility,
        })
    }
}

/// hh.ru timestamps look like `2024-05-01T12:30:00+0300`.
fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Snippets carry `<highlighttext>` markup around matched words.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}
