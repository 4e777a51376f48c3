//! One launch tube: a slot holding the (weapon, engagement manager,
//! assignment info) triple, delegation to both halves, and change
//! detection for engagement-plan reports.

use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use wcs_core::enums::WeaponKind;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::events::WcsEvent;
use wcs_core::state::{EngagementPlanResult, LaunchTubeStatus};
use wcs_core::types::{AssignmentInfo, GeoPoint, GeodeticPosition, OwnShipNav, TargetTrack};
use wcs_engage::Engagement;

use crate::weapon::Weapon;

struct TubeSlot {
    weapon: Arc<Weapon>,
    engagement: Mutex<Engagement>,
    info: AssignmentInfo,
}

pub struct LaunchTube {
    tube_no: u16,
    events: mpsc::Sender<WcsEvent>,
    slot: Option<TubeSlot>,
    /// Last reported plan, for change detection.
    last_reported: Mutex<Option<EngagementPlanResult>>,
}

impl LaunchTube {
    pub fn new(tube_no: u16, events: mpsc::Sender<WcsEvent>) -> Self {
        Self {
            tube_no,
            events,
            slot: None,
            last_reported: Mutex::new(None),
        }
    }

    pub fn tube_no(&self) -> u16 {
        self.tube_no
    }

    pub fn has_weapon(&self) -> bool {
        self.slot.is_some()
    }

    pub fn info(&self) -> Option<&AssignmentInfo> {
        self.slot.as_ref().map(|slot| &slot.info)
    }

    pub fn weapon(&self) -> Option<&Arc<Weapon>> {
        self.slot.as_ref().map(|slot| &slot.weapon)
    }

    /// Bind a freshly built pair to this tube. The engagement manager is
    /// initialized here; kind-specific setup happens in
    /// `setup_assignment`.
    pub fn assign(
        &mut self,
        weapon: Weapon,
        mut engagement: Engagement,
        info: AssignmentInfo,
    ) -> WcsResult<()> {
        if self.slot.is_some() {
            return Err(WcsError::AlreadyAssigned(self.tube_no));
        }
        if info.tube_no != self.tube_no {
            return Err(WcsError::InvalidTube(info.tube_no));
        }

        engagement.initialize(self.tube_no, info.weapon_kind);
        self.slot = Some(TubeSlot {
            weapon: Arc::new(weapon),
            engagement: Mutex::new(engagement),
            info,
        });
        *self.last_reported.lock() = None;
        Ok(())
    }

    /// Kind-specific assignment setup: mines resolve their drop plan,
    /// missiles bind their targeting source.
    pub fn setup_assignment(&self) -> WcsResult<()> {
        let Some(slot) = &self.slot else {
            return Err(WcsError::NotAssigned(self.tube_no));
        };
        let info = &slot.info;
        let mut engagement = slot.engagement.lock();

        if info.weapon_kind.is_mine() {
            let mine = engagement
                .as_mine_mut()
                .ok_or(WcsError::UnsupportedKind(info.weapon_kind))?;
            let list = info.drop_plan_list.unwrap_or(0);
            let plan = info.drop_plan_no.unwrap_or(0);
            mine.set_drop_plan(list, plan)
        } else {
            let missile = engagement
                .as_missile_mut()
                .ok_or(WcsError::UnsupportedKind(info.weapon_kind))?;
            match (info.system_target_id, info.direct_target_position) {
                (Some(id), _) if id != 0 => missile.set_system_target(id),
                (_, Some(position)) => missile.set_target_position(position),
                _ => Err(WcsError::NoTarget),
            }
        }
    }

    /// Release the tube: cancel in-flight work and drop both halves.
    pub fn clear(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.weapon.reset();
            slot.engagement.lock().reset();
            debug!(tube_no = self.tube_no, "assignment cleared");
        }
        *self.last_reported.lock() = None;
    }

    // --- Environment pushes ---

    pub fn update_own_ship(&self, nav: &OwnShipNav) {
        if let Some(slot) = &self.slot {
            slot.engagement.lock().update_own_ship(nav);
        }
    }

    /// Track reports reach only missile managers with a matching target.
    pub fn update_target(&self, track: &TargetTrack) {
        if let Some(slot) = &self.slot {
            slot.engagement.lock().update_target_info(track);
        }
    }

    pub fn set_axis_center(&self, center: GeoPoint) {
        if let Some(slot) = &self.slot {
            slot.engagement.lock().set_axis_center(center);
        }
    }

    /// Mirror a committed launch-status change into the engagement manager.
    pub fn set_launched(&self, launched: bool) {
        if let Some(slot) = &self.slot {
            slot.engagement.lock().set_launched(launched);
        }
    }

    /// Dispatch a waypoint update to the manager variant for the kind.
    pub fn update_waypoints(&self, waypoints: Vec<GeodeticPosition>) -> WcsResult<()> {
        let Some(slot) = &self.slot else {
            return Err(WcsError::NotAssigned(self.tube_no));
        };
        let mut engagement = slot.engagement.lock();
        match &mut *engagement {
            Engagement::Mine(mine) => mine.update_drop_plan_waypoints(waypoints),
            Engagement::Missile(missile) => missile.update_waypoints(waypoints),
        }
    }

    /// Recompute the engagement plan. On success the validity flag feeds
    /// the weapon's fire-solution interlock and a materially changed plan
    /// is reported.
    pub fn calculate_plan(&self) -> WcsResult<()> {
        let Some(slot) = &self.slot else {
            return Err(WcsError::NotAssigned(self.tube_no));
        };

        let (outcome, result) = {
            let mut engagement = slot.engagement.lock();
            let outcome = engagement.calculate_plan();
            (outcome, engagement.result().clone())
        };

        if outcome.is_ok() {
            slot.weapon.set_fire_solution_ready(result.valid);
            self.report_plan_change(result);
        }
        outcome
    }

    /// Fire the plan event only when validity toggled, the total time
    /// changed, or the trajectory length changed.
    fn report_plan_change(&self, result: EngagementPlanResult) {
        let mut last = self.last_reported.lock();
        let changed = match &*last {
            Some(prev) => {
                prev.valid != result.valid
                    || prev.total_time_s != result.total_time_s
                    || prev.trajectory.len() != result.trajectory.len()
            }
            None => true,
        };
        if changed {
            let _ = self.events.send(WcsEvent::EngagementPlanUpdated {
                tube_no: self.tube_no,
                result: result.clone(),
            });
            *last = Some(result);
        }
    }

    /// Periodic drive: weapon auto-transitions, post-launch tracking, and
    /// pre-launch replanning.
    pub fn tick(&self) {
        let Some(slot) = &self.slot else {
            return;
        };
        slot.weapon.tick();
        slot.engagement.lock().tick();
        if !slot.weapon.is_launched() {
            let _ = self.calculate_plan();
        }
    }

    pub fn status(&self) -> LaunchTubeStatus {
        match &self.slot {
            Some(slot) => LaunchTubeStatus {
                tube_no: self.tube_no,
                has_weapon: true,
                weapon_kind: slot.weapon.kind(),
                control_state: slot.weapon.current_state(),
                launched: slot.weapon.is_launched(),
                engagement_plan_valid: slot.engagement.lock().is_plan_valid(),
            },
            None => LaunchTubeStatus::empty(self.tube_no),
        }
    }

    pub fn engagement_result(&self) -> EngagementPlanResult {
        match &self.slot {
            Some(slot) => slot.engagement.lock().result().clone(),
            None => EngagementPlanResult::empty(self.tube_no, WeaponKind::Na),
        }
    }
}
