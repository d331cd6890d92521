//! Walking time between the user and a bus stop.
//!
//! Straight-line (haversine) distance is inflated by a fixed factor to
//! approximate the length of a real street path, then converted to whole
//! minutes at a constant walking pace. A routing service would be more
//! accurate but the poll loop only needs minute-level precision.

use crate::domain::Coord;

/// Default multiplier from straight-line to street distance.
pub const DEFAULT_PATH_INFLATION: f64 = 1.3;

/// Default walking pace: 4 km/h.
pub const DEFAULT_METRES_PER_MINUTE: f64 = 4000.0 / 60.0;

/// Configuration for walking time estimation.
#[derive(Debug, Clone)]
pub struct WalkingConfig {
    /// Multiplier applied to the haversine distance.
    pub path_inflation: f64,

    /// Walking pace in metres per minute.
    pub metres_per_minute: f64,

    /// Lower clamp on the estimate, in minutes.
    pub min_minutes: u32,

    /// Upper clamp on the estimate, in minutes.
    pub max_minutes: u32,
}

impl WalkingConfig {
    /// Set the path inflation factor.
    pub fn with_path_inflation(mut self, factor: f64) -> Self {
        self.path_inflation = factor;
        self
    }

    /// Set the walking pace in km/h.
    pub fn with_speed_kmh(mut self, kmh: f64) -> Self {
        self.metres_per_minute = kmh * 1000.0 / 60.0;
        self
    }
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            path_inflation: DEFAULT_PATH_INFLATION,
            metres_per_minute: DEFAULT_METRES_PER_MINUTE,
            min_minutes: 1,
            max_minutes: 60,
        }
    }
}

/// Estimates minutes on foot between two coordinates.
///
/// Total: never fails. Degenerate input (identical points, non-finite or
/// out-of-range coordinates) yields `min_minutes`.
#[derive(Debug, Clone, Default)]
pub struct WalkingEstimator {
    config: WalkingConfig,
}

impl WalkingEstimator {
    pub fn new(config: WalkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WalkingConfig {
        &self.config
    }

    /// Estimated walking distance in metres, after path inflation.
    ///
    /// `None` if either coordinate is invalid.
    pub fn walking_distance_m(&self, origin: &Coord, destination: &Coord) -> Option<f64> {
        if !origin.is_valid() || !destination.is_valid() {
            return None;
        }
        let d = origin.haversine_m(destination) * self.config.path_inflation;
        d.is_finite().then_some(d)
    }

    /// Estimated walking time in whole minutes, rounded up and clamped.
    pub fn estimate(&self, origin: &Coord, destination: &Coord) -> u32 {
        let min = self.config.min_minutes;
        let max = self.config.max_minutes.max(min);

        let Some(distance) = self.walking_distance_m(origin, destination) else {
            return min;
        };
        if self.config.metres_per_minute <= 0.0 || !self.config.metres_per_minute.is_finite() {
            return min;
        }

        let minutes = (distance / self.config.metres_per_minute).ceil();
        if !minutes.is_finite() || minutes <= 0.0 {
            return min;
        }
        if minutes >= max as f64 {
            return max;
        }
        (minutes as u32).clamp(min, max)
    }
}
