//! The "leave now" firing rule.

use serde::Serialize;

/// Default slack, in minutes, between walking time and bus arrival.
pub const DEFAULT_FIRE_BUFFER_MINS: i64 = 2;

/// Verdict of the firing rule for one arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Leaving now reaches the stop with `0..=buffer` minutes to spare.
    Fire,
    /// More than `buffer` minutes to spare; alerting now would be premature.
    TooEarly,
    /// Walking takes longer than the bus needs to arrive.
    TooLate,
}

impl Decision {
    pub fn is_fire(&self) -> bool {
        matches!(self, Decision::Fire)
    }
}

/// Stateless comparison of arrival and walking minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertRule {
    buffer_mins: i64,
}

impl AlertRule {
    /// Create a rule with the given buffer. Negative buffers are treated as 0.
    pub fn new(buffer_mins: i64) -> Self {
        Self {
            buffer_mins: buffer_mins.max(0),
        }
    }

    pub fn buffer_mins(&self) -> i64 {
        self.buffer_mins
    }

    /// Fire iff `0 <= arrival - walking <= buffer`.
    pub fn decide(&self, arrival_mins: u32, walking_mins: u32) -> Decision {
        let delta = delta(arrival_mins, walking_mins);
        if delta < 0 {
            Decision::TooLate
        } else if delta > self.buffer_mins {
            Decision::TooEarly
        } else {
            Decision::Fire
        }
    }
}

impl Default for AlertRule {
    fn default() -> Self {
        Self::new(DEFAULT_FIRE_BUFFER_MINS)
    }
}

/// `arrival - walking` in minutes.
pub fn delta(arrival_mins: u32, walking_mins: u32) -> i64 {
    i64::from(arrival_mins) - i64::from(walking_mins)
}
