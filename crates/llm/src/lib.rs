//! Optional AI relevance scoring for listings.
//!
//! A `VacancyScorer` asks an `LlmProvider` (Gemini) to rate a listing
//! against the user's search queries and parses the JSON verdict.

pub mod gemini;
pub mod provider;
pub mod scoring;

pub use gemini::GeminiProvider;
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use scoring::{ListingScorer, Score, VacancyScorer};
