//! Poll loop configuration.

use std::time::Duration;

use chrono::NaiveTime;

use crate::engine::{DEFAULT_FIRE_BUFFER_MINS, DEFAULT_REFIRE_MINS};
use crate::walking::WalkingConfig;

/// Configuration parameters for the polling scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between the starts of two cycles.
    pub poll_interval: Duration,

    /// Upper bound on a single stop's feed request.
    pub fetch_timeout: Duration,

    /// Maximum number of routes processed at once within a cycle.
    pub max_concurrent_routes: usize,

    /// Alert when `0 <= arrival - walk <= fire_buffer_mins`.
    pub fire_buffer_mins: i64,

    /// Minimum time before a route that already alerted may alert again
    /// while it stays inside the firing window (minutes).
    pub refire_interval_mins: i64,

    /// Local time of day after which cycles are skipped.
    /// `None` polls around the clock.
    pub active_until: Option<NaiveTime>,

    /// Walking time model.
    pub walking: WalkingConfig,
}

impl SchedulerConfig {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the per-cycle route concurrency.
    pub fn with_max_concurrent_routes(mut self, n: usize) -> Self {
        self.max_concurrent_routes = n;
        self
    }

    /// Set the firing buffer in minutes.
    pub fn with_fire_buffer(mut self, mins: i64) -> Self {
        self.fire_buffer_mins = mins;
        self
    }

    /// Set the re-fire interval in minutes.
    pub fn with_refire_interval(mut self, mins: i64) -> Self {
        self.refire_interval_mins = mins;
        self
    }

    /// Skip cycles after this local time of day.
    pub fn with_active_until(mut self, until: Option<NaiveTime>) -> Self {
        self.active_until = until;
        self
    }

    /// Set the walking time model.
    pub fn with_walking(mut self, walking: WalkingConfig) -> Self {
        self.walking = walking;
        self
    }

    /// Returns the re-fire interval as a Duration.
    pub fn refire_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.refire_interval_mins)
    }

    /// Whether a cycle starting at local time `now` falls after the cut-off.
    pub fn is_after_cutoff(&self, now: NaiveTime) -> bool {
        self.active_until.is_some_and(|until| now >= until)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            max_concurrent_routes: 4,
            fire_buffer_mins: DEFAULT_FIRE_BUFFER_MINS,
            refire_interval_mins: DEFAULT_REFIRE_MINS,
            active_until: None,
            walking: WalkingConfig::default(),
        }
    }
}
