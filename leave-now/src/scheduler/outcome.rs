//! Per-route and per-cycle results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{LiveArrival, RouteKey};
use crate::engine::Decision;

/// Why a route did or did not alert in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeReason {
    MatchedAndFired,
    MatchedButEarly,
    MatchedButLate,
    NoMatch,
    NoFeedData,
    NoPosition,
    UnknownStopLocation,
    Suppressed,
    FetchFailed,
    /// Inside the window, but this route already alerted and is not re-armed.
    AlreadyNotified,
}

impl OutcomeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeReason::MatchedAndFired => "matched-and-fired",
            OutcomeReason::MatchedButEarly => "matched-but-early",
            OutcomeReason::MatchedButLate => "matched-but-late",
            OutcomeReason::NoMatch => "no-match",
            OutcomeReason::NoFeedData => "no-feed-data",
            OutcomeReason::NoPosition => "no-position",
            OutcomeReason::UnknownStopLocation => "unknown-stop-location",
            OutcomeReason::Suppressed => "suppressed",
            OutcomeReason::FetchFailed => "fetch-failed",
            OutcomeReason::AlreadyNotified => "already-notified",
        }
    }

    /// Whether this outcome re-arms a route that already alerted.
    ///
    /// Transient conditions (no fix, failed fetch, muted) say nothing about
    /// where the bus is, so they leave the route's alert state alone.
    pub fn rearms(&self) -> bool {
        !matches!(
            self,
            OutcomeReason::MatchedAndFired
                | OutcomeReason::AlreadyNotified
                | OutcomeReason::Suppressed
                | OutcomeReason::FetchFailed
                | OutcomeReason::NoPosition
        )
    }
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one cycle for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    pub route: RouteKey,
    pub route_number: String,
    pub reason: OutcomeReason,
    pub arrival: Option<LiveArrival>,
    pub walking_mins: Option<u32>,
    /// Verdict of the firing rule, if the cycle got that far.
    pub decision: Option<Decision>,
}

impl PollOutcome {
    pub(crate) fn new(route: RouteKey, route_number: &str, reason: OutcomeReason) -> Self {
        Self {
            route,
            route_number: route_number.to_string(),
            reason,
            arrival: None,
            walking_mins: None,
            decision: None,
        }
    }

    pub(crate) fn with_estimate(
        mut self,
        arrival: LiveArrival,
        walking_mins: u32,
        decision: Decision,
    ) -> Self {
        self.arrival = Some(arrival);
        self.walking_mins = Some(walking_mins);
        self.decision = Some(decision);
        self
    }

    /// True if a notification went out for this route.
    pub fn fired(&self) -> bool {
        self.reason == OutcomeReason::MatchedAndFired
    }
}

/// Why a whole cycle was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleSkip {
    /// The cycle started after the configured daily cut-off.
    AfterCutoff,
    /// The route store could not be read.
    RouteListFailed { message: String },
}

/// Result of one full cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Outcomes in route-list order.
    pub outcomes: Vec<PollOutcome>,
    pub skipped: Option<CycleSkip>,
}

impl CycleReport {
    pub(crate) fn skipped(started_at: DateTime<Utc>, reason: CycleSkip) -> Self {
        Self {
            started_at,
            outcomes: Vec::new(),
            skipped: Some(reason),
        }
    }

    /// Number of notifications emitted in the cycle.
    pub fn fired_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.fired()).count()
    }

    /// The outcome for `route`, if it was polled.
    pub fn outcome(&self, route: RouteKey) -> Option<&PollOutcome> {
        self.outcomes.iter().find(|o| o.route == route)
    }
}
