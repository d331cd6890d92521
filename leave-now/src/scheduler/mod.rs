//! Periodic polling of registered routes.
//!
//! Each cycle runs every active route through the alert pipeline:
//!
//! 1. Skip if there is no position fix or the stop location is unknown
//! 2. Fetch the stop's arrival board (bounded by a timeout)
//! 3. Pick the route's bus off the board
//! 4. Estimate the walk from the current position to the stop
//! 5. Apply the firing rule, the suppression gate and the fire ledger
//! 6. Emit a "leave now" notification
//!
//! Each route runs as its own task and reports one [`PollOutcome`] per cycle.

mod config;
mod outcome;
mod poll;


pub use config::SchedulerConfig;
pub use outcome::{CycleReport, CycleSkip, OutcomeReason, PollOutcome};
pub use poll::{PollingScheduler, SchedulerHandle};
