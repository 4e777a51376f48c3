//! The weapon-control service: composition facade over the coordinator,
//! the target registry and the mine drop-plan store. The command thread
//! feeds `handle`; the periodic threads drive `tick` and `replan`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use wcs_core::commands::WcsCommand;
use wcs_core::config::WcsConfig;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::events::WcsEvent;
use wcs_core::state::SystemSnapshot;
use wcs_store::{MinePlanStore, TargetRegistry};

use crate::cancel::CancelToken;
use crate::coordinator::{EventCallback, LaunchTubeCoordinator};
use crate::kinds::WeaponFactory;

pub struct WeaponControlService {
    coordinator: LaunchTubeCoordinator,
    targets: Arc<TargetRegistry>,
    plans: Arc<MinePlanStore>,
    selected_plan: Mutex<Option<(u32, u32)>>,
}

impl WeaponControlService {
    pub fn new(
        config: WcsConfig,
        plans: Arc<MinePlanStore>,
        targets: Arc<TargetRegistry>,
    ) -> Self {
        let factory = WeaponFactory::new(config.clone(), Arc::clone(&plans));
        Self {
            coordinator: LaunchTubeCoordinator::new(config, factory),
            targets,
            plans,
            selected_plan: Mutex::new(None),
        }
    }

    pub fn initialize(&self) -> WcsResult<()> {
        self.plans.initialize()?;
        self.coordinator.initialize()?;
        info!("weapon control service initialized");
        Ok(())
    }

    pub fn shutdown(&self) {
        self.coordinator.shutdown();
        info!("weapon control service shut down");
    }

    pub fn coordinator(&self) -> &LaunchTubeCoordinator {
        &self.coordinator
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    pub fn plans(&self) -> &MinePlanStore {
        &self.plans
    }

    pub fn set_event_callback(&self, callback: EventCallback) {
        self.coordinator.set_event_callback(callback);
    }

    /// Dispatch one inbound command.
    pub fn handle(&self, command: WcsCommand) -> WcsResult<()> {
        match command {
            WcsCommand::AssignWeapon(info) => self.coordinator.assign(info),
            WcsCommand::UnassignWeapon { tube_no } => self.coordinator.unassign(tube_no),
            WcsCommand::ControlWeapon {
                tube_no,
                target_state,
            } => self
                .coordinator
                .control(tube_no, target_state, CancelToken::new()),
            WcsCommand::UpdateWaypoints { tube_no, waypoints } => {
                self.coordinator.update_waypoints(tube_no, waypoints)
            }
            WcsCommand::UpdateOwnShip(nav) => {
                self.coordinator.update_own_ship(nav);
                Ok(())
            }
            WcsCommand::UpdateTargetTrack(track) => {
                self.targets.update(track);
                self.coordinator.update_target(track);
                Ok(())
            }
            WcsCommand::SetAxisCenter(center) => {
                self.coordinator.set_axis_center(center);
                Ok(())
            }
            WcsCommand::MineDropPlanRequest { list_no } => {
                if !self.plans.is_valid_list_no(list_no) {
                    return Err(WcsError::InvalidPlan(format!("list {list_no} out of range")));
                }
                self.coordinator.report(WcsEvent::PlanListReport {
                    list_no,
                    plans: self.plans.get_list(list_no),
                });
                Ok(())
            }
            WcsCommand::EditedPlanList { list_no, plans } => self.plans.save_list(list_no, &plans),
            WcsCommand::SelectedPlan { list_no, plan_no } => {
                self.plans.get_plan(list_no, plan_no)?;
                *self.selected_plan.lock() = Some((list_no, plan_no));
                info!(list_no, plan_no, "drop plan selected");
                Ok(())
            }
            WcsCommand::EmergencyStop => self.coordinator.emergency_stop(),
            WcsCommand::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    pub fn selected_plan(&self) -> Option<(u32, u32)> {
        *self.selected_plan.lock()
    }

    /// Fast periodic update.
    pub fn tick(&self) {
        self.coordinator.tick();
    }

    /// Slow periodic replan sweep.
    pub fn replan(&self) {
        self.coordinator.calculate_all_engagement_plans();
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        self.coordinator.snapshot()
    }
}
