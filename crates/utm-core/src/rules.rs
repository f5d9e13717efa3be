//! Thresholds and tunables for flight-request decisions.

use serde::{Deserialize, Serialize};

/// Configuration for conflict evaluation and rerouting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Lateral margin on each side of the requested route (meters)
    pub corridor_width_m: f64,
    /// Wind above this speed is advisory (knots)
    pub wind_limit_kts: f64,
    /// Planning grid steps per axis; the grid has `steps + 1` nodes per axis
    pub grid_steps: usize,
    /// Tolerance for simplifying planned routes (meters)
    pub simplify_tolerance_m: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            corridor_width_m: 50.0,
            wind_limit_kts: 25.0,
            grid_steps: 40,
            simplify_tolerance_m: 30.0,
        }
    }
}
