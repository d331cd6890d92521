//! Pure decision logic for one route in one poll cycle.
//!
//! Matching picks the route's bus out of a stop's arrival board, the alert
//! rule compares its arrival against the walk to the stop, and the ledger
//! keeps a route that is still inside the window from alerting every cycle.

mod decision;
mod ledger;
mod matcher;

pub use decision::{AlertRule, DEFAULT_FIRE_BUFFER_MINS, Decision, delta};
pub use ledger::{DEFAULT_REFIRE_MINS, FireLedger};
pub use matcher::{ArrivalMatch, match_arrival};
