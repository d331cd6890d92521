//! Live bus arrival feed.
//!
//! This module provides an HTTP client for the public bus arrival service
//! and a file-backed mock with the same decoding path.
//!
//! Key characteristics of the feed:
//! - Arrival times are seconds-to-arrival; we keep whole minutes (floored,
//!   minimum 1)
//! - A stop's board is queried by `(cityCode, nodeId)`
//! - Failures are sometimes reported in-band with a 200 status, as an XML
//!   envelope or a non-`"00"` result code

mod client;
mod convert;
mod error;
mod mock;
mod types;

use std::future::Future;

use crate::domain::LiveArrival;

pub use client::{FeedClient, FeedConfig};
pub use convert::{ConversionError, convert_arrival_item, parse_arrivals};
pub use error::FeedError;
pub use mock::MockFeed;
pub use types::{ArrivalItem, ArrivalResponse};

/// Source of live arrivals for a stop.
///
/// This abstraction allows the scheduler to be tested with mock data.
pub trait TransitFeed: Send + Sync {
    /// Fetch the current arrival board for `stop_id` in `city_code`.
    ///
    /// Returns arrivals in feed order. An empty list means the feed had
    /// nothing for the stop, which is not an error.
    fn fetch_arrivals(
        &self,
        stop_id: &str,
        city_code: u32,
    ) -> impl Future<Output = Result<Vec<LiveArrival>, FeedError>> + Send;
}

impl<T: TransitFeed> TransitFeed for std::sync::Arc<T> {
    fn fetch_arrivals(
        &self,
        stop_id: &str,
        city_code: u32,
    ) -> impl Future<Output = Result<Vec<LiveArrival>, FeedError>> + Send {
        (**self).fetch_arrivals(stop_id, city_code)
    }
}
