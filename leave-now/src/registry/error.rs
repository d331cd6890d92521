//! Route registry error types.

use crate::domain::RouteKey;

/// Errors from registering or editing routes.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An active entry already monitors this (stop, route) pair
    #[error("route {route_id} at stop {stop_id} is already registered")]
    DuplicateActive { stop_id: String, route_id: String },

    /// No entry with this key
    #[error("no registered route {0}")]
    NotFound(RouteKey),

    /// Registration is missing a required field
    #[error("invalid registration: {0}")]
    Invalid(&'static str),

    /// Failed to read a routes file
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Failed to parse a routes file
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
