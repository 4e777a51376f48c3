//! Control-loop threads.
//!
//! Three periodic loops (tick, replan, status report) plus a command
//! dispatcher. State-change commands can block for seconds, so the
//! dispatcher hands them to short-lived worker threads and never stalls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::{info, warn};

use wcs_core::commands::WcsCommand;
use wcs_core::config::WcsConfig;
use wcs_launch::WeaponControlService;

pub struct RuntimeHandle {
    stop: Arc<AtomicBool>,
    command_tx: mpsc::Sender<WcsCommand>,
    handles: Vec<JoinHandle<()>>,
}

impl RuntimeHandle {
    /// Queue a command for the dispatcher.
    pub fn submit(&self, command: WcsCommand) {
        let _ = self.command_tx.send(command);
    }

    /// Stop every loop and join.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        drop(self.command_tx);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

/// Spawn the tick, replan, status and command threads.
pub fn spawn_runtime(service: Arc<WeaponControlService>, config: &WcsConfig) -> RuntimeHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let (command_tx, command_rx) = mpsc::channel::<WcsCommand>();
    let mut handles = Vec::new();

    // Fast update loop, drift-compensated.
    {
        let service = Arc::clone(&service);
        let stop = Arc::clone(&stop);
        let interval = config.system.update_interval();
        handles.push(
            std::thread::Builder::new()
                .name("wcs-tick".into())
                .spawn(move || {
                    let mut next_tick = Instant::now();
                    while !stop.load(Ordering::SeqCst) {
                        service.tick();

                        next_tick += interval;
                        let now = Instant::now();
                        if next_tick > now {
                            std::thread::sleep(next_tick - now);
                        } else if now - next_tick > interval * 2 {
                            // Too far behind; reset instead of spiraling.
                            next_tick = now;
                        }
                    }
                })
                .expect("failed to spawn tick thread"),
        );
    }

    // Engagement replan loop.
    {
        let service = Arc::clone(&service);
        let stop = Arc::clone(&stop);
        let interval = config.system.engagement_plan_interval();
        handles.push(
            std::thread::Builder::new()
                .name("wcs-replan".into())
                .spawn(move || {
                    while !stop.load(Ordering::SeqCst) {
                        service.replan();
                        std::thread::sleep(interval);
                    }
                })
                .expect("failed to spawn replan thread"),
        );
    }

    // Aggregated status report loop.
    {
        let service = Arc::clone(&service);
        let stop = Arc::clone(&stop);
        let interval = config.system.status_report_interval();
        handles.push(
            std::thread::Builder::new()
                .name("wcs-status".into())
                .spawn(move || {
                    while !stop.load(Ordering::SeqCst) {
                        let snapshot = service.snapshot();
                        info!(
                            assigned = snapshot.assigned_tubes,
                            ready = snapshot.ready_tubes,
                            "tube status"
                        );
                        std::thread::sleep(interval);
                    }
                })
                .expect("failed to spawn status thread"),
        );
    }

    // Command dispatcher. Blocking requests go to worker threads.
    {
        let service = Arc::clone(&service);
        let stop = Arc::clone(&stop);
        handles.push(
            std::thread::Builder::new()
                .name("wcs-command".into())
                .spawn(move || {
                    while let Ok(command) = command_rx.recv() {
                        if stop.load(Ordering::SeqCst) {
                            break;
                        }
                        dispatch(&service, command);
                    }
                })
                .expect("failed to spawn command thread"),
        );
    }

    RuntimeHandle {
        stop,
        command_tx,
        handles,
    }
}

fn dispatch(service: &Arc<WeaponControlService>, command: WcsCommand) {
    match command {
        blocking @ (WcsCommand::ControlWeapon { .. } | WcsCommand::EmergencyStop) => {
            let service = Arc::clone(service);
            let spawned = std::thread::Builder::new()
                .name("wcs-control".into())
                .spawn(move || {
                    if let Err(err) = service.handle(blocking) {
                        warn!(%err, "control command failed");
                    }
                });
            if let Err(err) = spawned {
                warn!(%err, "failed to spawn control worker");
            }
        }
        command => {
            if let Err(err) = service.handle(command) {
                warn!(%err, "command failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wcs_core::constants::TARGET_MAX_AGE;
    use wcs_core::enums::WeaponKind;
    use wcs_core::types::{AssignmentInfo, GeodeticPosition};
    use wcs_store::{MinePlanStore, TargetRegistry};

    fn test_service(tag: &str) -> (Arc<WeaponControlService>, WcsConfig) {
        let dir = std::env::temp_dir().join(format!("wcs_app_runtime_{tag}"));
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = WcsConfig::default();
        config.system.update_interval_ms = 10;
        config.system.engagement_plan_interval_ms = 20;
        config.system.status_report_interval_ms = 20;
        config.weapon.default_launch_delay_s = 0.05;
        config.paths.mine_data_path = dir.clone();

        let plans = Arc::new(MinePlanStore::new(dir, 15, 15));
        let targets = Arc::new(TargetRegistry::new(TARGET_MAX_AGE));
        let service = Arc::new(WeaponControlService::new(config.clone(), plans, targets));
        service.initialize().unwrap();
        (service, config)
    }

    #[test]
    fn runtime_drives_assignment_through_commands() {
        let (service, config) = test_service("drive");
        let runtime = spawn_runtime(Arc::clone(&service), &config);

        runtime.submit(WcsCommand::AssignWeapon(AssignmentInfo {
            tube_no: 1,
            weapon_kind: WeaponKind::Alm,
            direct_target_position: Some(GeodeticPosition::new(37.5, 127.0, 0.0)),
            ..Default::default()
        }));

        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if service.coordinator().is_assigned(1) {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(service.coordinator().is_assigned(1));

        // The replan loop validates the plan without further commands.
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if service
                .coordinator()
                .get_status(1)
                .unwrap()
                .engagement_plan_valid
            {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(service.coordinator().get_status(1).unwrap().engagement_plan_valid);

        runtime.shutdown();
    }

    #[test]
    fn runtime_shutdown_joins_cleanly() {
        let (service, config) = test_service("shutdown");
        let runtime = spawn_runtime(service, &config);
        std::thread::sleep(Duration::from_millis(50));
        runtime.shutdown();
    }
}
