//! Short-lived caching of arrival boards.
//!
//! Several registered routes often share one stop. Within a cycle they all
//! need the same board, so boards are cached per (stop, city) for less than
//! one poll interval. Errors are never cached: a failed stop is retried on
//! the next cycle.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::LiveArrival;
use crate::feed::{FeedError, TransitFeed};

/// Cache key for arrival boards: (stop ID, city code).
type BoardKey = (String, u32);

/// Cached arrival board.
type BoardEntry = Arc<Vec<LiveArrival>>;

/// Configuration for the board cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached boards. Keep below the poll interval.
    pub ttl: Duration,

    /// Maximum number of cached boards.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10),
            max_capacity: 256,
        }
    }
}

/// Feed wrapper that caches successful board fetches.
pub struct CachedFeed<F> {
    feed: F,
    boards: MokaCache<BoardKey, BoardEntry>,
}

impl<F: TransitFeed> CachedFeed<F> {
    /// Create a new cached feed.
    pub fn new(feed: F, config: &CacheConfig) -> Self {
        let boards = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { feed, boards }
    }

    /// Get a stop's board, from cache if fresh.
    ///
    /// Concurrent callers for the same stop share a single upstream fetch.
    pub async fn get_board(&self, stop_id: &str, city_code: u32) -> Result<BoardEntry, FeedError> {
        let key = (stop_id.to_string(), city_code);

        self.boards
            .try_get_with(key, async {
                self.feed
                    .fetch_arrivals(stop_id, city_code)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e| Arc::try_unwrap(e).unwrap_or_else(FeedError::Shared))
    }

    /// Access the underlying feed for operations that bypass cache.
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.boards.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.boards.invalidate_all();
    }
}

impl<F: TransitFeed> TransitFeed for CachedFeed<F> {
    async fn fetch_arrivals(
        &self,
        stop_id: &str,
        city_code: u32,
    ) -> Result<Vec<LiveArrival>, FeedError> {
        let board = self.get_board(stop_id, city_code).await?;
        Ok(board.as_ref().clone())
    }
}
