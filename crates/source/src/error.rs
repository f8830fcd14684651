use thiserror::Error;

/// Errors from a listing source. None of these are fatal; the poller skips
/// the query for the current cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode source response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Unavailable(e.to_string())
        }
    }
}
