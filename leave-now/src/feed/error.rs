//! Transit feed error types.

use std::sync::Arc;
use std::time::Duration;

/// Errors from fetching or decoding a stop's arrival board.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, connect failure, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete in time
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),

    /// Service key rejected
    #[error("unauthorized (invalid service key)")]
    Unauthorized,

    /// API returned a non-success HTTP status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// API answered 200 but reported an error in its envelope
    #[error("service error {code}: {message}")]
    Service { code: String, message: String },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Failure of a fetch shared between several concurrent callers
    #[error(transparent)]
    Shared(Arc<FeedError>),
}
