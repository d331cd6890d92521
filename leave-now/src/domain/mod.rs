//! Domain types for the bus alert engine.
//!
//! Registered routes are long-lived user data; live arrivals and position
//! fixes are transient values that only live for one poll cycle.

mod arrival;
mod coord;
mod route;

pub use arrival::{LiveArrival, PositionFix, minutes_from_seconds};
pub use coord::{Coord, EARTH_RADIUS_M};
pub use route::{RegisteredRoute, RouteKey};
