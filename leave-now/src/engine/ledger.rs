//! Per-route record of fired alerts.
//!
//! The firing rule is stateless, so while a bus stays inside the window it
//! would fire on every cycle. The ledger holds a route's alert back until it
//! is re-armed: either the route left the firing window, or the re-fire
//! interval has passed since the last alert.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::RouteKey;

/// Default minimum time between two alerts for the same route.
pub const DEFAULT_REFIRE_MINS: i64 = 5;

#[derive(Debug, Clone)]
pub struct FireLedger {
    last_fired: HashMap<RouteKey, DateTime<Utc>>,
    refire_interval: Duration,
}

impl FireLedger {
    pub fn new(refire_interval: Duration) -> Self {
        Self {
            last_fired: HashMap::new(),
            refire_interval,
        }
    }

    /// Whether an alert for `key` may be emitted at `now`.
    pub fn is_armed(&self, key: RouteKey, now: DateTime<Utc>) -> bool {
        match self.last_fired.get(&key) {
            None => true,
            Some(last) => now.signed_duration_since(*last) >= self.refire_interval,
        }
    }

    /// Record that an alert for `key` went out at `now`.
    pub fn record_fire(&mut self, key: RouteKey, now: DateTime<Utc>) {
        self.last_fired.insert(key, now);
    }

    /// Forget the last alert for `key`, so the next Fire goes out immediately.
    pub fn rearm(&mut self, key: RouteKey) {
        self.last_fired.remove(&key);
    }

    /// Drop entries for routes that are no longer registered.
    pub fn retain(&mut self, keep: impl Fn(&RouteKey) -> bool) {
        self.last_fired.retain(|k, _| keep(k));
    }

    pub fn last_fired(&self, key: RouteKey) -> Option<DateTime<Utc>> {
        self.last_fired.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}

impl Default for FireLedger {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_REFIRE_MINS))
    }
}
