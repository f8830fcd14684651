//! SQLite-backed deduplication store.
//!
//! One row per delivered listing keyed by its external id. The primary key
//! makes check-and-insert atomic, so overlapping delivery attempts collapse
//! into a single record.

pub mod error;
pub mod seen;

pub use error::StoreError;
pub use seen::SeenStore;
