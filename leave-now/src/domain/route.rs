//! User-registered (stop, route) pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coord;

/// Local identifier of a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(pub u64);

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A user's saved (stop, route) pairing that the engine monitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredRoute {
    pub id: RouteKey,
    /// Feed-side stop identifier (e.g. `SJB293064313`).
    pub stop_id: String,
    pub stop_name: String,
    /// Feed-side route identifier.
    pub route_id: String,
    /// Public route number shown on the bus (e.g. `"370"`).
    pub route_number: String,
    pub direction: Option<String>,
    pub city_code: u32,
    /// Stop location. `None` for legacy entries registered before stop
    /// coordinates were captured.
    pub stop_location: Option<Coord>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub alias: Option<String>,
}

impl RegisteredRoute {
    /// Name to show the user: the alias if set, otherwise the route number.
    pub fn display_name(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.trim().is_empty() => alias,
            _ => &self.route_number,
        }
    }

    /// The `(stop_id, route_id)` pair that must be unique among active entries.
    pub fn identity(&self) -> (&str, &str) {
        (&self.stop_id, &self.route_id)
    }
}
