use async_trait::async_trait;

use jobwatch_core::{Listing, UserConfig};

use crate::error::SourceError;

/// A searchable listing backend.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Run one search query with the shared filters applied server-side
    /// where supported. Results are ordered newest-first.
    async fn search(&self, query: &str, filters: &UserConfig) -> Result<Vec<Listing>, SourceError>;

    /// Human-readable name for logs (e.g. "hh.ru").
    fn source_name(&self) -> &str;
}
