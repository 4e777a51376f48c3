//! System-wide limits and fixed parameters.

use std::time::Duration;

/// Maximum waypoints per engagement plan or drop plan.
pub const MAX_WAYPOINTS: usize = 8;

/// Maximum points in a computed trajectory.
pub const MAX_TRAJECTORY_POINTS: usize = 128;

/// Maximum turning points reported for a missile plan.
pub const MAX_TURNING_POINTS: usize = 16;

/// Granularity at which blocking waits poll their cancellation tokens.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

// --- Target registry ---

/// Tracks older than this are evicted from the registry.
pub const TARGET_MAX_AGE: Duration = Duration::from_secs(300);

/// Minimum interval between eviction sweeps.
pub const TARGET_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// --- Geodesy ---

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// --- AAM performance (fixed, not configurable) ---

/// AAM maximum range (km).
pub const AAM_MAX_RANGE_KM: f64 = 80.0;

/// AAM cruise speed (m/s).
pub const AAM_SPEED_MPS: f64 = 350.0;

// --- Position validation ranges ---

/// Minimum valid depth for a plan position (meters; negative = altitude).
pub const MIN_POSITION_DEPTH_M: f64 = -1000.0;

/// Maximum valid depth for a plan position (meters).
pub const MAX_POSITION_DEPTH_M: f64 = 10_000.0;
