//! Relevance scoring of listings against the user's search queries.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use jobwatch_core::Listing;

use crate::provider::{LlmError, LlmProvider, Message};

/// Snippet text is capped before it goes into the prompt.
const SNIPPET_LIMIT: usize = 800;

const SYSTEM_PROMPT: &str = "You are an experienced technical recruiter. \
Rate how relevant a vacancy is for a candidate with the given search queries. \
A missing salary is not a drawback. \
Reply with a single JSON object: \
{\"score\": 0-100, \"stack\": \"comma-separated technologies\", \
\"pros\": \"2-3 short points\", \"cons\": \"1-2 short points\", \
\"verdict\": \"one sentence\"}";

/// Parsed AI verdict for one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Clamped to 0..=100.
    pub score: u8,
    pub stack: String,
    pub pros: String,
    pub cons: String,
    pub verdict: String,
}

/// Scores listings; the poller drops listings below `min_score`.
#[async_trait]
pub trait ListingScorer: Send + Sync {
    async fn score(&self, listing: &Listing, queries: &[String]) -> Result<Score, LlmError>;

    fn min_score(&self) -> u8;

    /// Whether a scored listing should be delivered.
    fn accepts(&self, score: &Score) -> bool {
        score.score >= self.min_score()
    }
}

pub struct VacancyScorer {
    provider: Box<dyn LlmProvider>,
    min_score: u8,
    temperature: f32,
    max_tokens: u32,
}

impl VacancyScorer {
    pub fn new(provider: Box<dyn LlmProvider>, min_score: u8) -> Self {
        Self {
            provider,
            min_score: min_score.min(100),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }

    fn build_prompt(listing: &Listing, queries: &[String]) -> String {
        let snippet = |s: &Option<String>| {
            s.as_deref()
                .map(|t| t.chars().take(SNIPPET_LIMIT).collect::<String>())
                .unwrap_or_default()
        };

        format!(
            "Candidate search queries: {queries}\n\n\
             Vacancy:\n\
             - Title: {title}\n\
             - Company: {company}\n\
             - Salary: {salary}\n\
             - Location: {area}\n\
             - Experience: {experience}\n\
             - Remote: {remote}\n\
             - Requirements: {requirement}\n\
             - Responsibilities: {responsibility}",
            queries = queries.join(", "),
            title = listing.title,
            company = listing.company,
            salary = listing.salary_text(),
            area = listing.area.as_deref().unwrap_or("unknown"),
            experience = listing.experience.map(|e| e.label()).unwrap_or("unspecified"),
            remote = if listing.remote { "yes" } else { "no" },
            requirement = snippet(&listing.requirement),
            responsibility = snippet(&listing.responsibility),
        )
    }
}

#[async_trait]
impl ListingScorer for VacancyScorer {
    async fn score(&self, listing: &Listing, queries: &[String]) -> Result<Score, LlmError> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(Self::build_prompt(listing, queries)),
        ];

        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;
        debug!(listing_id = %listing.id, "AI response: {}", response);

        let score = parse_score(&response)?;
        info!(listing_id = %listing.id, score = score.score, "AI scored listing");
        Ok(score)
    }

    fn min_score(&self) -> u8 {
        self.min_score
    }
}

/// Slice out the outermost JSON object, tolerating code fences and chatter.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse the model's JSON verdict. `score` may arrive as a number or a string.
pub fn parse_score(response: &str) -> Result<Score, LlmError> {
    let value: Value = serde_json::from_str(extract_json(response))
        .map_err(|e| LlmError::ParseError(format!("invalid JSON from model: {e}")))?;

    let raw = match &value["score"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| LlmError::ParseError("missing numeric 'score'".into()))?;

    let text = |key: &str| value[key].as_str().unwrap_or_default().trim().to_string();

    Ok(Score {
        score: raw.round().clamp(0.0, 100.0) as u8,
        stack: text("stack"),
        pros: text("pros"),
        cons: text("cons"),
        verdict: text("verdict"),
    })
}
