//! Listing source adapters.
//!
//! - `ListingSource` trait: one search query in, newest-first listings out
//! - `HhClient`: the hh.ru `/vacancies` implementation

pub mod error;
pub mod hh;
pub mod traits;

pub use error::SourceError;
pub use hh::HhClient;
pub use traits::ListingSource;
