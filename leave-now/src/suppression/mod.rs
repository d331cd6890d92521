//! User-driven alert suppression.
//!
//! Dismissing a notification mutes its category for a fixed window (bus:
//! 30 minutes, weather: one hour) or, for the persistent category, until it
//! is explicitly re-enabled. Dismissal times live in a small key/value store
//! so they survive restarts when a file-backed store is used.

mod error;
mod gate;
mod store;

pub use error::SuppressionError;
pub use gate::{Category, SuppressionGate, SuppressionWindow};
pub use store::{JsonFileSuppressionStore, MemorySuppressionStore, SuppressionStore};
