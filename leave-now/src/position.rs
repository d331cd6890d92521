//! Latest known device position.
//!
//! Position updates arrive independently of the poll cycle. A single writer
//! publishes fixes into a watch channel; the scheduler only ever reads the
//! most recent one. "No fix yet" is a normal state.

use tokio::sync::watch;

use crate::domain::PositionFix;

/// Read access to the most recent position fix.
pub trait PositionSource: Send + Sync {
    /// The latest fix, or `None` if none has been delivered yet.
    fn latest(&self) -> Option<PositionFix>;
}

/// Last-write-wins cell holding the latest fix.
///
/// Cloning shares the same cell.
#[derive(Debug, Clone)]
pub struct PositionCell {
    tx: watch::Sender<Option<PositionFix>>,
}

impl PositionCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current fix.
    ///
    /// Fixes older than the one already held are ignored so a late delivery
    /// cannot move the user backwards.
    pub fn publish(&self, fix: PositionFix) {
        self.tx.send_if_modified(|current| match current {
            Some(held) if held.timestamp_ms > fix.timestamp_ms => false,
            _ => {
                *current = Some(fix);
                true
            }
        });
    }

    /// Forget the current fix (e.g. location permission revoked).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Receiver that is notified on every accepted update.
    pub fn subscribe(&self) -> watch::Receiver<Option<PositionFix>> {
        self.tx.subscribe()
    }
}

impl Default for PositionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for PositionCell {
    fn latest(&self) -> Option<PositionFix> {
        *self.tx.borrow()
    }
}
