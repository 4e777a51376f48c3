//! Engagement manager for the guided-missile kinds (ALM/ASM/AAM).

use tracing::debug;

use wcs_core::constants::MAX_WAYPOINTS;
use wcs_core::enums::WeaponKind;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::types::{GeodeticPosition, TargetTrack};

use crate::engagement::EngagementCore;

pub struct MissileEngagement {
    pub(crate) core: EngagementCore,
    system_target_id: Option<u32>,
    has_valid_target: bool,
}

impl MissileEngagement {
    pub fn new(kind: WeaponKind, speed_mps: f64) -> Self {
        Self {
            core: EngagementCore::new(kind, speed_mps),
            system_target_id: None,
            has_valid_target: false,
        }
    }

    /// Direct geodetic targeting. Clears any system-target binding and
    /// recomputes synchronously.
    pub fn set_target_position(&mut self, position: GeodeticPosition) -> WcsResult<()> {
        self.core.target_position = position;
        self.system_target_id = None;
        self.has_valid_target = true;
        self.calculate_plan()
    }

    /// Bind to a system target. The target becomes valid only once a
    /// matching track report arrives.
    pub fn set_system_target(&mut self, system_target_id: u32) -> WcsResult<()> {
        if system_target_id == 0 {
            return Err(WcsError::NoTarget);
        }
        self.system_target_id = Some(system_target_id);
        self.has_valid_target = false;
        debug!(
            tube_no = self.core.tube_no,
            system_target_id, "system target bound, awaiting track"
        );
        Ok(())
    }

    pub fn system_target_id(&self) -> Option<u32> {
        self.system_target_id
    }

    /// Consume a track report for the bound system target.
    pub fn update_target_info(&mut self, track: &TargetTrack) {
        if self.system_target_id != Some(track.system_target_id) {
            return;
        }
        self.core.target_position = track.position;
        self.has_valid_target = true;
        let _ = self.calculate_plan();
    }

    /// Replace the waypoint list (max 8) and recompute. A rejected update
    /// leaves the prior plan untouched.
    pub fn update_waypoints(&mut self, waypoints: Vec<GeodeticPosition>) -> WcsResult<()> {
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(WcsError::TooManyWaypoints(waypoints.len()));
        }
        self.core.waypoints = waypoints;
        self.calculate_plan()
    }

    pub fn waypoints(&self) -> &[GeodeticPosition] {
        &self.core.waypoints
    }

    pub fn has_valid_target(&self) -> bool {
        self.has_valid_target
    }

    pub fn calculate_plan(&mut self) -> WcsResult<()> {
        if !self.has_valid_target {
            self.core.invalidate();
            return Err(WcsError::NoTarget);
        }
        self.core.rebuild_plan();
        Ok(())
    }
}
