//! Live arrival estimates and position fixes.

use serde::{Deserialize, Serialize};

use super::Coord;

/// One vehicle's estimated time and distance to a stop.
///
/// Valid only for the cycle that fetched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveArrival {
    pub route_id: String,
    pub route_number: String,
    /// Number of stops the vehicle still has to pass.
    pub stops_away: u32,
    /// Whole minutes until arrival, at least 1.
    pub minutes_to_arrival: u32,
    /// Vehicle identifier, when the feed reports one.
    pub vehicle_id: Option<String>,
    /// Vehicle class such as low-floor.
    pub vehicle_type: Option<String>,
    pub direction: Option<String>,
    pub route_type: Option<String>,
}

impl LiveArrival {
    /// Minimal arrival with no vehicle or direction information.
    pub fn new(
        route_id: impl Into<String>,
        route_number: impl Into<String>,
        minutes_to_arrival: u32,
    ) -> Self {
        Self {
            route_id: route_id.into(),
            route_number: route_number.into(),
            stops_away: 0,
            minutes_to_arrival: minutes_to_arrival.max(1),
            vehicle_id: None,
            vehicle_type: None,
            direction: None,
            route_type: None,
        }
    }
}

/// Convert the feed's seconds-to-arrival into whole minutes.
///
/// Floors, then raises to a minimum of 1 so that an imminent bus is never
/// reported as "0 minutes away". Negative inputs are treated as imminent.
pub fn minutes_from_seconds(seconds: i64) -> u32 {
    let minutes = seconds.max(0) / 60;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// A position reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub coord: Coord,
    /// Milliseconds since the Unix epoch when the fix was taken.
    pub timestamp_ms: i64,
}

impl PositionFix {
    pub fn new(lat: f64, lon: f64, timestamp_ms: i64) -> Self {
        Self {
            coord: Coord::new(lat, lon),
            timestamp_ms,
        }
    }
}
