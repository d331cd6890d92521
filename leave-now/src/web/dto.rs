//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::suppression::Category;

/// A position fix pushed by the device.
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub lat: f64,
    pub lon: f64,

    /// When the fix was taken, in epoch milliseconds. Defaults to now.
    pub timestamp_ms: Option<i64>,
}

/// Current suppression state of one category.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SuppressionStatus {
    pub category: Category,
    pub suppressed: bool,
    pub last_dismissed: Option<DateTime<Utc>>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
