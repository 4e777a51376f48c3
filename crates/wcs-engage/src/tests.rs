//! Tests for trajectory computation and both engagement manager variants.

use std::sync::Arc;
use std::time::Duration;

use wcs_core::enums::WeaponKind;
use wcs_core::errors::WcsError;
use wcs_core::types::{GeoPoint, GeodeticPosition, MinePlan, OwnShipNav, TargetTrack};
use wcs_store::MinePlanStore;

use crate::engagement::Engagement;
use crate::mine::MineEngagement;
use crate::missile::MissileEngagement;
use crate::trajectory::{self, TrajectoryInput};

fn pos(lat: f64, lon: f64) -> GeodeticPosition {
    GeodeticPosition::new(lat, lon, 0.0)
}

fn nav_at(lat: f64, lon: f64) -> OwnShipNav {
    OwnShipNav {
        position: pos(lat, lon),
        course_deg: 0.0,
        speed_mps: 5.0,
    }
}

fn compute(
    kind: WeaponKind,
    launch: GeodeticPosition,
    target: GeodeticPosition,
    waypoints: &[GeodeticPosition],
) -> trajectory::TrajectoryPlan {
    trajectory::compute(&TrajectoryInput {
        kind,
        launch,
        target,
        waypoints,
        speed_mps: 300.0,
        axis_center: GeoPoint::default(),
    })
}

// ---- Trajectory ----

#[test]
fn trajectory_endpoints_and_bounds() {
    let launch = pos(35.0, 129.0);
    let target = pos(35.5, 129.5);
    let waypoints = [pos(35.2, 129.1), pos(35.4, 129.3)];

    let plan = compute(WeaponKind::Alm, launch, target, &waypoints);
    assert_eq!(*plan.points.first().unwrap(), launch);
    assert_eq!(*plan.points.last().unwrap(), target);
    assert!(plan.points.len() <= 128);
    assert!(plan.total_time_s > 0.0);
    assert_eq!(plan.turning_points, waypoints.to_vec());
    assert_eq!(plan.waypoint_eta_s.len(), 2);
    assert!(plan.waypoint_eta_s[0] < plan.waypoint_eta_s[1]);
    assert!(plan.waypoint_eta_s[1] < plan.total_time_s);
}

#[test]
fn trajectory_with_max_waypoints_stays_in_budget() {
    let waypoints: Vec<_> = (0..8).map(|i| pos(35.0 + 0.05 * i as f64, 129.0)).collect();
    let plan = compute(WeaponKind::Asm, pos(34.9, 129.0), pos(35.5, 129.0), &waypoints);
    assert!(plan.points.len() <= 128);
    assert_eq!(plan.waypoint_eta_s.len(), 8);
}

#[test]
fn mine_trajectory_has_no_turning_points() {
    let plan = compute(WeaponKind::MMine, pos(35.0, 129.0), pos(35.1, 129.1), &[pos(35.05, 129.05)]);
    assert!(plan.turning_points.is_empty());
}

#[test]
fn position_interpolation_clamps_and_progresses() {
    let launch = pos(35.0, 129.0);
    let target = pos(35.2, 129.0);
    let plan = compute(WeaponKind::Aam, launch, target, &[]);

    assert_eq!(plan.position_at(0.0), launch);
    assert_eq!(plan.position_at(plan.total_time_s * 2.0), target);

    let mid = plan.position_at(plan.total_time_s / 2.0);
    assert!((mid.lat_deg - 35.1).abs() < 0.01, "got {}", mid.lat_deg);
}

#[test]
fn zero_length_path_still_has_positive_time() {
    let p = pos(35.0, 129.0);
    let plan = compute(WeaponKind::Alm, p, p, &[]);
    assert!(plan.total_time_s > 0.0);
}

// ---- Missile manager ----

#[test]
fn missile_without_target_reports_no_target() {
    let mut m = MissileEngagement::new(WeaponKind::Alm, 300.0);
    assert_eq!(m.calculate_plan(), Err(WcsError::NoTarget));
    assert!(!m.has_valid_target());
}

#[test]
fn direct_target_position_makes_plan_valid() {
    let mut eng = Engagement::Missile(MissileEngagement::new(WeaponKind::Alm, 300.0));
    eng.initialize(1, WeaponKind::Alm);
    eng.update_own_ship(&nav_at(35.0, 129.0));

    eng.as_missile_mut()
        .unwrap()
        .set_target_position(pos(37.5, 127.0))
        .unwrap();

    assert!(eng.is_plan_valid());
    let result = eng.result();
    assert_eq!(result.trajectory.first(), Some(&pos(35.0, 129.0)));
    assert_eq!(result.trajectory.last(), Some(&pos(37.5, 127.0)));
    assert!(result.total_time_s > 0.0);
}

#[test]
fn system_target_needs_matching_track() {
    let mut eng = Engagement::Missile(MissileEngagement::new(WeaponKind::Asm, 400.0));
    eng.initialize(2, WeaponKind::Asm);
    eng.update_own_ship(&nav_at(35.0, 129.0));

    eng.as_missile_mut().unwrap().set_system_target(42).unwrap();
    assert_eq!(eng.calculate_plan(), Err(WcsError::NoTarget));
    assert!(!eng.is_plan_valid());

    // A track for a different target changes nothing.
    eng.update_target_info(&TargetTrack {
        system_target_id: 99,
        position: pos(36.0, 128.0),
        course_deg: 0.0,
        speed_mps: 8.0,
    });
    assert!(!eng.is_plan_valid());

    // The matching track validates the target and recomputes.
    eng.update_target_info(&TargetTrack {
        system_target_id: 42,
        position: pos(36.0, 128.0),
        course_deg: 0.0,
        speed_mps: 8.0,
    });
    assert!(eng.is_plan_valid());
    assert_eq!(eng.result().target_position, pos(36.0, 128.0));
}

#[test]
fn waypoint_overflow_leaves_prior_plan_unchanged() {
    let mut m = MissileEngagement::new(WeaponKind::Alm, 300.0);
    m.set_target_position(pos(35.5, 129.5)).unwrap();
    m.update_waypoints(vec![pos(35.2, 129.2)]).unwrap();
    let before = m.waypoints().to_vec();

    let err = m.update_waypoints(vec![pos(35.1, 129.1); 9]).unwrap_err();
    assert_eq!(err, WcsError::TooManyWaypoints(9));
    assert_eq!(m.waypoints(), before.as_slice());
}

#[test]
fn zero_system_target_rejected() {
    let mut m = MissileEngagement::new(WeaponKind::Aam, 350.0);
    assert_eq!(m.set_system_target(0), Err(WcsError::NoTarget));
}

// ---- Mine manager ----

fn mine_store(tag: &str) -> Arc<MinePlanStore> {
    let dir = std::env::temp_dir().join(format!("wcs_engage_mine_{tag}"));
    let _ = std::fs::remove_dir_all(&dir);
    let store = MinePlanStore::new(&dir, 15, 15);
    store.initialize().unwrap();
    Arc::new(store)
}

fn seeded_plan() -> MinePlan {
    MinePlan {
        plan_no: 7,
        launch_position: pos(35.0, 129.0),
        drop_position: GeodeticPosition::new(35.1, 129.1, 40.0),
        waypoints: vec![pos(35.05, 129.05)],
    }
}

#[test]
fn mine_adopts_drop_plan_geometry() {
    let store = mine_store("adopt");
    store.add_plan(3, seeded_plan()).unwrap();

    let mut eng = Engagement::Mine(MineEngagement::new(5.0, store));
    eng.initialize(4, WeaponKind::MMine);
    eng.as_mine_mut().unwrap().set_drop_plan(3, 7).unwrap();

    assert!(eng.is_plan_valid());
    let result = eng.result();
    assert_eq!(result.trajectory.first(), Some(&pos(35.0, 129.0)));
    assert_eq!(
        result.trajectory.last(),
        Some(&GeodeticPosition::new(35.1, 129.1, 40.0))
    );
    assert_eq!(result.waypoints.len(), 1);
}

#[test]
fn missing_drop_plan_is_invalid_plan() {
    let store = mine_store("missing");
    let mut mine = MineEngagement::new(5.0, store);
    assert!(matches!(
        mine.set_drop_plan(3, 99),
        Err(WcsError::InvalidPlan(_))
    ));
}

#[test]
fn mine_waypoint_edits_persist_to_store() {
    let store = mine_store("persist");
    store.add_plan(2, seeded_plan()).unwrap();

    let mut mine = MineEngagement::new(5.0, Arc::clone(&store));
    mine.set_drop_plan(2, 7).unwrap();

    let new_wps = vec![pos(35.02, 129.02), pos(35.06, 129.06)];
    mine.update_drop_plan_waypoints(new_wps.clone()).unwrap();

    assert_eq!(store.get_plan(2, 7).unwrap().waypoints, new_wps);
    assert_eq!(mine.drop_plan().unwrap().waypoints, new_wps);

    // Overflow is rejected before anything is written.
    let err = mine
        .update_drop_plan_waypoints(vec![pos(35.0, 129.0); 9])
        .unwrap_err();
    assert_eq!(err, WcsError::TooManyWaypoints(9));
    assert_eq!(store.get_plan(2, 7).unwrap().waypoints, new_wps);
}

#[test]
fn mine_without_plan_is_invalid_but_calculable() {
    let store = mine_store("noplan");
    let mut eng = Engagement::Mine(MineEngagement::new(5.0, store));
    eng.initialize(5, WeaponKind::MMine);
    assert!(eng.calculate_plan().is_ok());
    assert!(!eng.is_plan_valid());
}

// ---- Post-launch tracking ----

#[test]
fn tick_after_launch_advances_flight_state() {
    let mut eng = Engagement::Missile(MissileEngagement::new(WeaponKind::Asm, 400.0));
    eng.initialize(1, WeaponKind::Asm);
    eng.update_own_ship(&nav_at(35.0, 129.0));
    eng.as_missile_mut()
        .unwrap()
        .set_target_position(pos(35.2, 129.2))
        .unwrap();

    let total = eng.result().total_time_s;
    eng.set_launched(true);
    std::thread::sleep(Duration::from_millis(30));
    eng.tick();

    let result = eng.result();
    assert!(result.time_to_target_s < total);
    assert!(result.current_position.lat_deg > 35.0);
}

#[test]
fn current_position_clamps_to_target_after_total_time() {
    let mut m = MissileEngagement::new(WeaponKind::Alm, 300.0);
    m.set_target_position(pos(35.3, 129.3)).unwrap();
    let eng = Engagement::Missile(m);
    assert_eq!(eng.current_position(1.0e9), pos(35.3, 129.3));
}
