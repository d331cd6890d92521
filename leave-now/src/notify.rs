//! Outgoing alerts.
//!
//! The engine hands finished notifications to a sink and never looks at the
//! result: delivery is best-effort.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::domain::RegisteredRoute;
use crate::suppression::Category;

/// Base notification ID for bus alerts; route hashes are added to it.
pub const BUS_NOTIFICATION_BASE: i32 = 2000;

/// Display priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Default,
    High,
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub category: Category,
    /// Slot ID. A notification replaces any earlier one with the same key.
    pub key: i32,
    pub title: String,
    pub body: String,
    pub priority: Priority,
}

impl Notification {
    /// The "leave now" alert for a route.
    pub fn leave_now(route: &RegisteredRoute, arrival_mins: u32, walking_mins: u32) -> Self {
        Self {
            category: Category::Bus,
            key: bus_notification_key(&route.route_number),
            title: "Leave now!".to_string(),
            body: format!(
                "{} arrives in {} min ({} min walk)",
                route.display_name(),
                arrival_mins,
                walking_mins
            ),
            priority: Priority::High,
        }
    }
}

/// Stable slot ID for a route number.
///
/// Uses the 31-multiplier string hash so IDs are identical across runs and
/// builds; distinct route numbers land in distinct slots in practice.
pub fn bus_notification_key(route_number: &str) -> i32 {
    let hash = route_number
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c)));
    BUS_NOTIFICATION_BASE.wrapping_add(hash)
}

/// Destination for notifications.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification. Must not block and must not panic.
    fn emit(&self, notification: &Notification);
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn emit(&self, notification: &Notification) {
        tracing::info!(
            category = %notification.category,
            key = notification.key,
            priority = ?notification.priority,
            title = %notification.title,
            "{}",
            notification.body
        );
    }
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    emitted: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications emitted so far, oldest first.
    pub fn emitted(&self) -> Vec<Notification> {
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, notification: &Notification) {
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn emit(&self, notification: &Notification) {
        (**self).emit(notification)
    }
}
