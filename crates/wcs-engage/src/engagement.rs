//! Shared engagement state and the kind dispatch.
//!
//! The two manager variants share `EngagementCore`; kind-specific commands
//! are routed by the coordinator through the `Engagement` tagged union, so
//! call sites never downcast.

use std::time::Instant;

use wcs_core::enums::WeaponKind;
use wcs_core::errors::WcsResult;
use wcs_core::state::EngagementPlanResult;
use wcs_core::types::{GeoPoint, GeodeticPosition, OwnShipNav, TargetTrack};

use crate::mine::MineEngagement;
use crate::missile::MissileEngagement;
use crate::trajectory::{self, TrajectoryInput, TrajectoryPlan};

/// State common to both manager variants.
pub struct EngagementCore {
    pub(crate) tube_no: u16,
    pub(crate) kind: WeaponKind,
    pub(crate) speed_mps: f64,
    pub(crate) launched: bool,
    pub(crate) launch_started_at: Option<Instant>,
    pub(crate) axis_center: GeoPoint,
    pub(crate) own_ship: OwnShipNav,
    pub(crate) waypoints: Vec<GeodeticPosition>,
    pub(crate) launch_position: GeodeticPosition,
    pub(crate) target_position: GeodeticPosition,
    pub(crate) plan: Option<TrajectoryPlan>,
    pub(crate) result: EngagementPlanResult,
}

impl EngagementCore {
    pub(crate) fn new(kind: WeaponKind, speed_mps: f64) -> Self {
        Self {
            tube_no: 0,
            kind,
            speed_mps,
            launched: false,
            launch_started_at: None,
            axis_center: GeoPoint::default(),
            own_ship: OwnShipNav::default(),
            waypoints: Vec::new(),
            launch_position: GeodeticPosition::default(),
            target_position: GeodeticPosition::default(),
            plan: None,
            result: EngagementPlanResult::default(),
        }
    }

    pub(crate) fn initialize(&mut self, tube_no: u16, kind: WeaponKind) {
        self.tube_no = tube_no;
        self.kind = kind;
        self.launched = false;
        self.launch_started_at = None;
        self.result = EngagementPlanResult::empty(tube_no, kind);
    }

    pub(crate) fn reset(&mut self) {
        self.launched = false;
        self.launch_started_at = None;
        self.waypoints.clear();
        self.plan = None;
        self.result = EngagementPlanResult::empty(self.tube_no, self.kind);
    }

    /// Recompute the trajectory and publish a valid result.
    pub(crate) fn rebuild_plan(&mut self) {
        let plan = trajectory::compute(&TrajectoryInput {
            kind: self.kind,
            launch: self.launch_position,
            target: self.target_position,
            waypoints: &self.waypoints,
            speed_mps: self.speed_mps,
            axis_center: self.axis_center,
        });

        self.result = EngagementPlanResult {
            tube_no: self.tube_no,
            kind: self.kind,
            valid: true,
            total_time_s: plan.total_time_s,
            time_to_target_s: plan.total_time_s,
            next_waypoint_index: 0,
            time_to_next_waypoint_s: plan.waypoint_eta_s.first().copied().unwrap_or(0.0),
            trajectory: plan.points.clone(),
            waypoints: self.waypoints.clone(),
            turning_points: plan.turning_points.clone(),
            current_position: self.launch_position,
            launch_position: self.launch_position,
            target_position: self.target_position,
        };
        self.plan = Some(plan);

        if self.launched {
            self.refresh_flight_state();
        }
    }

    /// Publish an invalid result, keeping the geometry fields readable.
    pub(crate) fn invalidate(&mut self) {
        self.plan = None;
        let mut result = EngagementPlanResult::empty(self.tube_no, self.kind);
        result.waypoints = self.waypoints.clone();
        result.launch_position = self.launch_position;
        result.target_position = self.target_position;
        self.result = result;
    }

    pub(crate) fn set_launched(&mut self, launched: bool) {
        if launched && !self.launched {
            self.launch_started_at = Some(Instant::now());
        } else if !launched {
            self.launch_started_at = None;
        }
        self.launched = launched;
    }

    pub(crate) fn current_position(&self, t_since_launch_s: f64) -> GeodeticPosition {
        match &self.plan {
            Some(plan) => plan.position_at(t_since_launch_s),
            None => self.launch_position,
        }
    }

    /// Post-launch wall-clock update of position and countdown fields.
    pub(crate) fn refresh_flight_state(&mut self) {
        let Some(started) = self.launch_started_at else {
            return;
        };
        let Some(plan) = &self.plan else {
            return;
        };

        let t = started.elapsed().as_secs_f64();
        self.result.current_position = plan.position_at(t);
        self.result.time_to_target_s = (plan.total_time_s - t).max(0.0);

        let next = plan.waypoint_eta_s.partition_point(|&eta| eta <= t);
        self.result.next_waypoint_index = next as u32;
        self.result.time_to_next_waypoint_s = plan
            .waypoint_eta_s
            .get(next)
            .map(|eta| eta - t)
            .unwrap_or(0.0);
    }

    pub(crate) fn tick(&mut self) {
        if self.launched {
            self.refresh_flight_state();
        }
    }
}

/// Per-tube engagement manager, one variant per weapon family.
pub enum Engagement {
    Missile(MissileEngagement),
    Mine(MineEngagement),
}

impl Engagement {
    fn core(&self) -> &EngagementCore {
        match self {
            Engagement::Missile(m) => &m.core,
            Engagement::Mine(m) => &m.core,
        }
    }

    fn core_mut(&mut self) -> &mut EngagementCore {
        match self {
            Engagement::Missile(m) => &mut m.core,
            Engagement::Mine(m) => &mut m.core,
        }
    }

    pub fn initialize(&mut self, tube_no: u16, kind: WeaponKind) {
        self.core_mut().initialize(tube_no, kind);
    }

    pub fn reset(&mut self) {
        self.core_mut().reset();
    }

    pub fn kind(&self) -> WeaponKind {
        self.core().kind
    }

    pub fn calculate_plan(&mut self) -> WcsResult<()> {
        match self {
            Engagement::Missile(m) => m.calculate_plan(),
            Engagement::Mine(m) => m.calculate_plan(),
        }
    }

    pub fn result(&self) -> &EngagementPlanResult {
        &self.core().result
    }

    pub fn is_plan_valid(&self) -> bool {
        self.core().result.valid
    }

    /// Missiles re-anchor their launch position to own ship; mines keep
    /// the drop plan's stored launch position.
    pub fn update_own_ship(&mut self, nav: &OwnShipNav) {
        let is_missile = matches!(self, Engagement::Missile(_));
        let core = self.core_mut();
        core.own_ship = *nav;
        if is_missile {
            core.launch_position = nav.position;
        }
    }

    /// Route a track report to a missile manager; mines ignore tracks.
    pub fn update_target_info(&mut self, track: &TargetTrack) {
        if let Engagement::Missile(m) = self {
            m.update_target_info(track);
        }
    }

    pub fn set_axis_center(&mut self, center: GeoPoint) {
        self.core_mut().axis_center = center;
    }

    pub fn set_launched(&mut self, launched: bool) {
        self.core_mut().set_launched(launched);
    }

    pub fn is_launched(&self) -> bool {
        self.core().launched
    }

    pub fn current_position(&self, t_since_launch_s: f64) -> GeodeticPosition {
        self.core().current_position(t_since_launch_s)
    }

    pub fn tick(&mut self) {
        self.core_mut().tick();
    }

    pub fn as_missile_mut(&mut self) -> Option<&mut MissileEngagement> {
        match self {
            Engagement::Missile(m) => Some(m),
            Engagement::Mine(_) => None,
        }
    }

    pub fn as_mine_mut(&mut self) -> Option<&mut MineEngagement> {
        match self {
            Engagement::Mine(m) => Some(m),
            Engagement::Missile(_) => None,
        }
    }
}
