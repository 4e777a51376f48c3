//! Engagement manager for the self-propelled mine.
//!
//! The drop plan is the mission: launch point, drop point and up to eight
//! waypoints come from the plan store, and waypoint edits are written back
//! through it (file first, then cache).

use std::sync::Arc;

use tracing::debug;

use wcs_core::constants::MAX_WAYPOINTS;
use wcs_core::enums::WeaponKind;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::types::{GeodeticPosition, MinePlan};
use wcs_store::MinePlanStore;

use crate::engagement::EngagementCore;

pub struct MineEngagement {
    pub(crate) core: EngagementCore,
    store: Arc<MinePlanStore>,
    list_no: u32,
    plan: Option<MinePlan>,
}

impl MineEngagement {
    pub fn new(speed_mps: f64, store: Arc<MinePlanStore>) -> Self {
        Self {
            core: EngagementCore::new(WeaponKind::MMine, speed_mps),
            store,
            list_no: 0,
            plan: None,
        }
    }

    /// Resolve a drop plan from the store and adopt its geometry.
    pub fn set_drop_plan(&mut self, list_no: u32, plan_no: u32) -> WcsResult<()> {
        let plan = self.store.get_plan(list_no, plan_no)?;

        self.list_no = list_no;
        self.core.launch_position = plan.launch_position;
        self.core.target_position = plan.drop_position;
        self.core.waypoints = plan.waypoints.clone();
        self.plan = Some(plan);

        debug!(
            tube_no = self.core.tube_no,
            list_no, plan_no, "drop plan loaded"
        );
        self.calculate_plan()
    }

    pub fn drop_plan(&self) -> Option<&MinePlan> {
        self.plan.as_ref()
    }

    pub fn drop_plan_list_no(&self) -> u32 {
        self.list_no
    }

    pub fn drop_plan_no(&self) -> u32 {
        self.plan.as_ref().map_or(0, |p| p.plan_no)
    }

    /// Replace the plan's waypoints (max 8), persisting through the store
    /// before mutating in-memory state.
    pub fn update_drop_plan_waypoints(
        &mut self,
        waypoints: Vec<GeodeticPosition>,
    ) -> WcsResult<()> {
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(WcsError::TooManyWaypoints(waypoints.len()));
        }
        let Some(plan) = &self.plan else {
            return Err(WcsError::InvalidPlan("no drop plan loaded".into()));
        };

        let mut updated = plan.clone();
        updated.waypoints = waypoints.clone();
        self.store.update_plan(self.list_no, updated.clone())?;

        self.plan = Some(updated);
        self.core.waypoints = waypoints;
        self.calculate_plan()
    }

    /// Planning is permitted regardless of target; validity reflects
    /// whether a drop mission is loaded.
    pub fn calculate_plan(&mut self) -> WcsResult<()> {
        if self.plan.is_some() {
            self.core.rebuild_plan();
        } else {
            self.core.invalidate();
        }
        Ok(())
    }
}
