//! Trajectory computation strategy.
//!
//! The path runs launch -> waypoints -> target, sampled along each leg.
//! Timing is kinematic: path length divided by the kind's cruise speed.
//! Guarantees: at most 128 points, first point equals the launch position,
//! last point equals the target position, total time strictly positive.

use wcs_core::constants::{MAX_TRAJECTORY_POINTS, MAX_TURNING_POINTS};
use wcs_core::enums::WeaponKind;
use wcs_core::types::{GeoPoint, GeodeticPosition};

/// Inputs to the trajectory strategy.
pub struct TrajectoryInput<'a> {
    pub kind: WeaponKind,
    pub launch: GeodeticPosition,
    pub target: GeodeticPosition,
    pub waypoints: &'a [GeodeticPosition],
    pub speed_mps: f64,
    /// Geodetic reference for the computation; the kinematic model keeps
    /// the contract field without bending paths around it.
    pub axis_center: GeoPoint,
}

/// Computed flight path with per-point cumulative distances.
#[derive(Debug, Clone)]
pub struct TrajectoryPlan {
    pub points: Vec<GeodeticPosition>,
    /// Cumulative surface distance at each point, meters.
    pub cumulative_m: Vec<f64>,
    pub total_time_s: f64,
    /// Missiles: the waypoints double as heading-change points. Mines: empty.
    pub turning_points: Vec<GeodeticPosition>,
    /// Time of arrival at each waypoint, seconds from launch.
    pub waypoint_eta_s: Vec<f64>,
}

impl TrajectoryPlan {
    pub fn path_length_m(&self) -> f64 {
        self.cumulative_m.last().copied().unwrap_or(0.0)
    }

    /// Position along the path at `t` seconds after launch. Piecewise
    /// linear at constant path speed; clamps to the final point once the
    /// total time has elapsed.
    pub fn position_at(&self, t_since_launch_s: f64) -> GeodeticPosition {
        let Some(&first) = self.points.first() else {
            return GeodeticPosition::default();
        };
        if self.points.len() < 2 || self.total_time_s <= 0.0 {
            return first;
        }

        let progress = (t_since_launch_s / self.total_time_s).clamp(0.0, 1.0);
        let distance = progress * self.path_length_m();

        let idx = self
            .cumulative_m
            .partition_point(|&d| d <= distance)
            .min(self.points.len() - 1);
        if idx == 0 {
            return first;
        }

        let seg_start = self.cumulative_m[idx - 1];
        let seg_len = self.cumulative_m[idx] - seg_start;
        let local = if seg_len > 0.0 {
            (distance - seg_start) / seg_len
        } else {
            1.0
        };
        self.points[idx - 1].lerp(&self.points[idx], local)
    }
}

/// Compute a flight path for the given inputs.
pub fn compute(input: &TrajectoryInput<'_>) -> TrajectoryPlan {
    let mut legs: Vec<GeodeticPosition> = input.waypoints.to_vec();
    legs.push(input.target);

    // Spread the point budget across the legs.
    let samples_per_leg = ((MAX_TRAJECTORY_POINTS - 1) / legs.len()).clamp(1, 12);

    let mut points = vec![input.launch];
    let mut waypoint_indices = Vec::with_capacity(input.waypoints.len());
    let mut prev = input.launch;
    for (leg_idx, &leg_end) in legs.iter().enumerate() {
        for s in 1..=samples_per_leg {
            let t = s as f64 / samples_per_leg as f64;
            points.push(prev.lerp(&leg_end, t));
        }
        if leg_idx < input.waypoints.len() {
            waypoint_indices.push(points.len() - 1);
        }
        prev = leg_end;
    }

    let mut cumulative_m = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative_m.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance_m(&pair[1]);
        cumulative_m.push(total);
    }

    let speed = input.speed_mps.max(0.1);
    let total_time_s = (total / speed).max(0.001);

    let waypoint_eta_s = waypoint_indices
        .iter()
        .map(|&idx| cumulative_m[idx] / speed)
        .collect();

    let turning_points = if input.kind.is_missile() {
        input
            .waypoints
            .iter()
            .take(MAX_TURNING_POINTS)
            .copied()
            .collect()
    } else {
        Vec::new()
    };

    TrajectoryPlan {
        points,
        cumulative_m,
        total_time_s,
        turning_points,
        waypoint_eta_s,
    }
}
