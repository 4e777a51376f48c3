//! The launch-tube coordinator: owns the tube array and the environment
//! cache, routes commands, fans environment updates to assigned tubes,
//! drives the periodic update and replan sweeps, and forwards events to
//! the outward callback.
//!
//! Locking discipline: the tubes lock is shared for lookup and exclusive
//! for assignment changes; the environment lock is separate and the two
//! are never held together. Weapons are cloned out before any blocking
//! call, so no coordinator lock spans a multi-second operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use wcs_core::config::WcsConfig;
use wcs_core::enums::ControlState;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::events::WcsEvent;
use wcs_core::state::{EngagementPlanResult, LaunchTubeStatus, SystemSnapshot};
use wcs_core::types::{AssignmentInfo, GeoPoint, GeodeticPosition, OwnShipNav, TargetTrack};

use crate::cancel::CancelToken;
use crate::kinds::WeaponFactory;
use crate::tube::LaunchTube;
use crate::weapon::Weapon;

pub type EventCallback = Box<dyn Fn(&WcsEvent) + Send + Sync>;

#[derive(Default)]
struct Environment {
    axis_center: GeoPoint,
    own_ship: OwnShipNav,
    targets: HashMap<u32, TargetTrack>,
}

pub struct LaunchTubeCoordinator {
    config: WcsConfig,
    factory: WeaponFactory,
    tubes: RwLock<Vec<LaunchTube>>,
    env: RwLock<Environment>,
    events_tx: mpsc::Sender<WcsEvent>,
    events_rx: Mutex<mpsc::Receiver<WcsEvent>>,
    callback: RwLock<Option<EventCallback>>,
    initialized: AtomicBool,
}

impl LaunchTubeCoordinator {
    pub fn new(config: WcsConfig, factory: WeaponFactory) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            config,
            factory,
            tubes: RwLock::new(Vec::new()),
            env: RwLock::new(Environment::default()),
            events_tx,
            events_rx: Mutex::new(events_rx),
            callback: RwLock::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &WcsConfig {
        &self.config
    }

    /// Register the canonical outward callback for all tube events.
    pub fn set_event_callback(&self, callback: EventCallback) {
        *self.callback.write() = Some(callback);
    }

    /// Construct the tube array. Idempotent.
    pub fn initialize(&self) -> WcsResult<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let count = self.config.system.max_launch_tubes;
        let mut tubes = self.tubes.write();
        tubes.clear();
        for tube_no in 1..=count {
            tubes.push(LaunchTube::new(tube_no, self.events_tx.clone()));
        }
        info!(tubes = count, "launch tube coordinator initialized");
        Ok(())
    }

    /// Clear every assignment and drop all weapons and managers.
    pub fn shutdown(&self) {
        let mut tubes = self.tubes.write();
        for tube in tubes.iter_mut() {
            if tube.has_weapon() {
                let kind = tube.status().weapon_kind;
                let tube_no = tube.tube_no();
                tube.clear();
                let _ = self.events_tx.send(WcsEvent::AssignmentChanged {
                    tube_no,
                    kind,
                    assigned: false,
                });
            }
        }
        self.initialized.store(false, Ordering::SeqCst);
        info!("launch tube coordinator shut down");
    }

    fn check_tube_no(&self, tube_no: u16) -> WcsResult<usize> {
        if tube_no == 0 || tube_no > self.config.system.max_launch_tubes {
            return Err(WcsError::InvalidTube(tube_no));
        }
        Ok((tube_no - 1) as usize)
    }

    /// Assign a weapon to a tube. Atomic: any sub-failure rolls the tube
    /// back to unassigned.
    pub fn assign(&self, info: AssignmentInfo) -> WcsResult<()> {
        let idx = self.check_tube_no(info.tube_no)?;
        info.validate()?;
        if !self.factory.supports(info.weapon_kind) {
            return Err(WcsError::UnsupportedKind(info.weapon_kind));
        }

        // Copy the current environment out before touching the tubes lock.
        let (axis_center, own_ship, track) = {
            let env = self.env.read();
            let track = info
                .system_target_id
                .and_then(|id| env.targets.get(&id).copied());
            (env.axis_center, env.own_ship, track)
        };

        let mut tubes = self.tubes.write();
        let tube = tubes.get_mut(idx).ok_or(WcsError::InvalidTube(info.tube_no))?;
        if tube.has_weapon() {
            return Err(WcsError::AlreadyAssigned(info.tube_no));
        }

        let kind = info.weapon_kind;
        let (weapon, engagement) =
            self.factory
                .build(info.tube_no, kind, self.events_tx.clone())?;
        tube.assign(weapon, engagement, info)?;

        // Push the current environment down, then run kind-specific setup.
        tube.set_axis_center(axis_center);
        tube.update_own_ship(&own_ship);
        if let Some(track) = track {
            tube.update_target(&track);
        }

        if let Err(err) = tube.setup_assignment() {
            warn!(tube_no = tube.tube_no(), %err, "assignment setup failed, rolling back");
            tube.clear();
            return Err(err);
        }

        let _ = self.events_tx.send(WcsEvent::AssignmentChanged {
            tube_no: tube.tube_no(),
            kind,
            assigned: true,
        });
        info!(tube_no = tube.tube_no(), %kind, "weapon assigned");
        Ok(())
    }

    pub fn unassign(&self, tube_no: u16) -> WcsResult<()> {
        let idx = self.check_tube_no(tube_no)?;
        let mut tubes = self.tubes.write();
        let tube = tubes.get_mut(idx).ok_or(WcsError::InvalidTube(tube_no))?;
        if !tube.has_weapon() {
            return Err(WcsError::NotAssigned(tube_no));
        }

        let kind = tube.status().weapon_kind;
        tube.clear();
        let _ = self.events_tx.send(WcsEvent::AssignmentChanged {
            tube_no,
            kind,
            assigned: false,
        });
        info!(tube_no, %kind, "weapon unassigned");
        Ok(())
    }

    pub fn is_assigned(&self, tube_no: u16) -> bool {
        self.check_tube_no(tube_no)
            .ok()
            .and_then(|idx| self.tubes.read().get(idx).map(LaunchTube::has_weapon))
            .unwrap_or(false)
    }

    /// Forward a state-change request to the tube's weapon. Blocking
    /// requests block the caller, never a coordinator lock.
    pub fn control(
        &self,
        tube_no: u16,
        target_state: ControlState,
        token: CancelToken,
    ) -> WcsResult<()> {
        let weapon = self.weapon_for(tube_no)?;
        weapon.request_state_change(target_state, token)
    }

    /// Issue the same request to every assigned tube, accumulating
    /// per-tube failures.
    pub fn request_all_state_change(&self, target_state: ControlState) -> WcsResult<()> {
        let mut failures = Vec::new();
        for (tube_no, weapon) in self.assigned_weapons() {
            if let Err(err) = weapon.request_state_change(target_state, CancelToken::new()) {
                failures.push((tube_no, err));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(WcsError::PartialFailure(failures))
        }
    }

    /// Drive every assigned tube to a terminal non-launch state: ABORT
    /// with a pre-cancelled token for tubes mid-launch, OFF otherwise.
    /// Expected cancellations are absorbed; returns once every tube has
    /// been issued its terminal request.
    pub fn emergency_stop(&self) -> WcsResult<()> {
        warn!("emergency stop initiated");
        let mut failures = Vec::new();

        for (tube_no, weapon) in self.assigned_weapons() {
            let state = weapon.current_state();
            let outcome = if state == ControlState::Launch {
                weapon.request_state_change(ControlState::Abort, CancelToken::cancelled())
            } else if state == ControlState::Off {
                Ok(())
            } else {
                weapon.cancel_current();
                weapon.request_state_change(ControlState::Off, CancelToken::new())
            };

            match outcome {
                Ok(()) | Err(WcsError::Cancelled) | Err(WcsError::Aborted) => {}
                // The weapon may have entered LAUNCH since the state read.
                Err(WcsError::InvalidTransition { .. })
                    if weapon.current_state() == ControlState::Launch =>
                {
                    if let Err(err) = weapon
                        .request_state_change(ControlState::Abort, CancelToken::cancelled())
                    {
                        if !matches!(err, WcsError::Aborted | WcsError::Cancelled) {
                            failures.push((tube_no, err));
                        }
                    }
                }
                Err(err) => failures.push((tube_no, err)),
            }
        }

        if failures.is_empty() {
            info!("emergency stop complete");
            Ok(())
        } else {
            Err(WcsError::PartialFailure(failures))
        }
    }

    // --- Environment updates: cache locally, then fan out ---

    pub fn update_own_ship(&self, nav: OwnShipNav) {
        self.env.write().own_ship = nav;
        let tubes = self.tubes.read();
        for tube in tubes.iter().filter(|t| t.has_weapon()) {
            tube.update_own_ship(&nav);
        }
    }

    pub fn update_target(&self, track: TargetTrack) {
        self.env.write().targets.insert(track.system_target_id, track);
        let tubes = self.tubes.read();
        for tube in tubes.iter().filter(|t| t.has_weapon()) {
            tube.update_target(&track);
        }
    }

    pub fn set_axis_center(&self, center: GeoPoint) {
        self.env.write().axis_center = center;
        let tubes = self.tubes.read();
        for tube in tubes.iter().filter(|t| t.has_weapon()) {
            tube.set_axis_center(center);
        }
    }

    pub fn update_waypoints(&self, tube_no: u16, waypoints: Vec<GeodeticPosition>) -> WcsResult<()> {
        let idx = self.check_tube_no(tube_no)?;
        let tubes = self.tubes.read();
        let tube = tubes.get(idx).ok_or(WcsError::InvalidTube(tube_no))?;
        tube.update_waypoints(waypoints)
    }

    /// Periodic replan sweep over all assigned tubes. A missile without a
    /// track yet is expected to fail with NoTarget; that is not an error
    /// at this level.
    pub fn calculate_all_engagement_plans(&self) {
        let tubes = self.tubes.read();
        for tube in tubes.iter().filter(|t| t.has_weapon()) {
            let _ = tube.calculate_plan();
        }
    }

    pub fn calculate_engagement_plan(&self, tube_no: u16) -> WcsResult<()> {
        let idx = self.check_tube_no(tube_no)?;
        let tubes = self.tubes.read();
        tubes
            .get(idx)
            .ok_or(WcsError::InvalidTube(tube_no))?
            .calculate_plan()
    }

    /// Periodic drive: deliver pending events, then tick every assigned
    /// tube.
    pub fn tick(&self) {
        self.pump_events();
        let tubes = self.tubes.read();
        for tube in tubes.iter().filter(|t| t.has_weapon()) {
            tube.tick();
        }
    }

    /// Drain the event channel: mirror launch-status commits into the
    /// engagement managers and forward everything outward, in commit
    /// order.
    fn pump_events(&self) {
        loop {
            let event = {
                let rx = self.events_rx.lock();
                match rx.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                }
            };

            if let WcsEvent::LaunchStatusChanged { tube_no, launched } = &event {
                let tubes = self.tubes.read();
                if let Some(tube) = tubes.get((*tube_no as usize).saturating_sub(1)) {
                    tube.set_launched(*launched);
                }
            }

            if let Some(callback) = self.callback.read().as_ref() {
                callback(&event);
            }
        }
    }

    /// Queue an event for the outward surface.
    pub fn report(&self, event: WcsEvent) {
        let _ = self.events_tx.send(event);
    }

    // --- Status queries ---

    pub fn get_status(&self, tube_no: u16) -> WcsResult<LaunchTubeStatus> {
        let idx = self.check_tube_no(tube_no)?;
        let tubes = self.tubes.read();
        Ok(tubes
            .get(idx)
            .map(LaunchTube::status)
            .unwrap_or_else(|| LaunchTubeStatus::empty(tube_no)))
    }

    pub fn all_statuses(&self) -> Vec<LaunchTubeStatus> {
        self.tubes.read().iter().map(LaunchTube::status).collect()
    }

    pub fn engagement_result(&self, tube_no: u16) -> WcsResult<EngagementPlanResult> {
        let idx = self.check_tube_no(tube_no)?;
        let tubes = self.tubes.read();
        tubes
            .get(idx)
            .map(LaunchTube::engagement_result)
            .ok_or(WcsError::InvalidTube(tube_no))
    }

    pub fn all_engagement_results(&self) -> Vec<EngagementPlanResult> {
        self.tubes
            .read()
            .iter()
            .filter(|t| t.has_weapon())
            .map(LaunchTube::engagement_result)
            .collect()
    }

    pub fn assigned_count(&self) -> usize {
        self.tubes.read().iter().filter(|t| t.has_weapon()).count()
    }

    /// Tubes currently ready to launch.
    pub fn ready_count(&self) -> usize {
        self.tubes
            .read()
            .iter()
            .filter(|t| t.status().control_state == ControlState::Rtl)
            .count()
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        let tubes = self.all_statuses();
        let assigned_tubes = tubes.iter().filter(|t| t.has_weapon).count();
        let ready_tubes = tubes
            .iter()
            .filter(|t| t.control_state == ControlState::Rtl)
            .count();
        SystemSnapshot {
            tubes,
            assigned_tubes,
            ready_tubes,
        }
    }

    fn weapon_for(&self, tube_no: u16) -> WcsResult<Arc<Weapon>> {
        let idx = self.check_tube_no(tube_no)?;
        let tubes = self.tubes.read();
        tubes
            .get(idx)
            .and_then(|tube| tube.weapon().cloned())
            .ok_or(WcsError::NotAssigned(tube_no))
    }

    fn assigned_weapons(&self) -> Vec<(u16, Arc<Weapon>)> {
        self.tubes
            .read()
            .iter()
            .filter_map(|tube| tube.weapon().map(|w| (tube.tube_no(), Arc::clone(w))))
            .collect()
    }
}
