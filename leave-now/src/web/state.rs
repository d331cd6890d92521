//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::watch;

use crate::position::PositionCell;
use crate::scheduler::CycleReport;
use crate::suppression::{SuppressionGate, SuppressionStore};

/// Suppression gate shared between the scheduler and the web layer.
pub type SharedGate = Arc<SuppressionGate<Box<dyn SuppressionStore>>>;

/// Shared application state.
///
/// Holds the write side of the position cell and the read side of the
/// scheduler's reports.
#[derive(Clone)]
pub struct AppState {
    /// Latest device position
    pub position: PositionCell,

    /// Dismissal state
    pub gate: SharedGate,

    /// Most recent cycle report
    pub reports: watch::Receiver<Option<Arc<CycleReport>>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        position: PositionCell,
        gate: SharedGate,
        reports: watch::Receiver<Option<Arc<CycleReport>>>,
    ) -> Self {
        Self {
            position,
            gate,
            reports,
        }
    }
}
