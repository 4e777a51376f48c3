//! Derived status snapshots. Produced on demand, never stored.

use serde::{Deserialize, Serialize};

use crate::enums::{ControlState, WeaponKind};
use crate::types::GeodeticPosition;

/// Point-in-time view of one launch tube.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchTubeStatus {
    pub tube_no: u16,
    pub has_weapon: bool,
    pub weapon_kind: WeaponKind,
    pub control_state: ControlState,
    pub launched: bool,
    pub engagement_plan_valid: bool,
}

impl LaunchTubeStatus {
    /// Status of an empty tube.
    pub fn empty(tube_no: u16) -> Self {
        Self {
            tube_no,
            ..Default::default()
        }
    }
}

/// Result of an engagement-plan computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementPlanResult {
    pub tube_no: u16,
    pub kind: WeaponKind,
    pub valid: bool,
    pub total_time_s: f64,
    pub time_to_target_s: f64,
    pub next_waypoint_index: u32,
    pub time_to_next_waypoint_s: f64,
    /// Ordered trajectory, at most 128 points. First point is the launch
    /// position, last is the target (drop point for mines).
    pub trajectory: Vec<GeodeticPosition>,
    /// Ordered waypoints, at most 8.
    pub waypoints: Vec<GeodeticPosition>,
    /// Heading-change points, missiles only, at most 16.
    pub turning_points: Vec<GeodeticPosition>,
    pub current_position: GeodeticPosition,
    pub launch_position: GeodeticPosition,
    pub target_position: GeodeticPosition,
}

impl EngagementPlanResult {
    pub fn empty(tube_no: u16, kind: WeaponKind) -> Self {
        Self {
            tube_no,
            kind,
            ..Default::default()
        }
    }
}

/// Aggregated all-tube snapshot for the periodic status report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub tubes: Vec<LaunchTubeStatus>,
    pub assigned_tubes: usize,
    /// Tubes currently in RTL.
    pub ready_tubes: usize,
}
