//! Fundamental geodetic and domain types.

use serde::{Deserialize, Serialize};

use crate::constants::{EARTH_RADIUS_M, MAX_WAYPOINTS};
use crate::enums::WeaponKind;
use crate::errors::{WcsError, WcsResult};

/// 2-D geodetic point (degrees). Used for the trajectory axis center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

/// 3-D geodetic position. Depth is positive down in meters; a negative
/// depth encodes altitude above the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub depth_m: f64,
}

impl GeodeticPosition {
    pub fn new(lat_deg: f64, lon_deg: f64, depth_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            depth_m,
        }
    }

    /// Great-circle surface distance to another position (haversine).
    pub fn distance_m(&self, other: &GeodeticPosition) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlat = (other.lat_deg - self.lat_deg).to_radians();
        let dlon = (other.lon_deg - self.lon_deg).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Initial bearing toward another position, degrees in [0, 360).
    pub fn bearing_deg_to(&self, other: &GeodeticPosition) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlon = (other.lon_deg - self.lon_deg).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    /// Linear interpolation toward another position. Adequate over the
    /// segment lengths produced by trajectory sampling.
    pub fn lerp(&self, other: &GeodeticPosition, t: f64) -> GeodeticPosition {
        GeodeticPosition {
            lat_deg: self.lat_deg + (other.lat_deg - self.lat_deg) * t,
            lon_deg: self.lon_deg + (other.lon_deg - self.lon_deg) * t,
            depth_m: self.depth_m + (other.depth_m - self.depth_m) * t,
        }
    }

    /// True when latitude, longitude and depth are within the ranges the
    /// plan store accepts.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lon_deg)
            && (crate::constants::MIN_POSITION_DEPTH_M..=crate::constants::MAX_POSITION_DEPTH_M)
                .contains(&self.depth_m)
    }
}

/// Own-ship navigation state as delivered by the navigation source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnShipNav {
    pub position: GeodeticPosition,
    pub course_deg: f64,
    pub speed_mps: f64,
}

/// A system-target track report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetTrack {
    pub system_target_id: u32,
    pub position: GeodeticPosition,
    pub course_deg: f64,
    pub speed_mps: f64,
}

/// A pre-planned mine drop mission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinePlan {
    pub plan_no: u32,
    pub launch_position: GeodeticPosition,
    pub drop_position: GeodeticPosition,
    pub waypoints: Vec<GeodeticPosition>,
}

/// Immutable description of one tube assignment.
///
/// Missiles carry exactly one targeting source (system target id or direct
/// position); mines carry a drop-plan reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentInfo {
    pub tube_no: u16,
    pub weapon_kind: WeaponKind,
    pub system_target_id: Option<u32>,
    pub direct_target_position: Option<GeodeticPosition>,
    pub drop_plan_list: Option<u32>,
    pub drop_plan_no: Option<u32>,
}

impl AssignmentInfo {
    /// Check the targeting invariant for the assigned kind.
    pub fn validate(&self) -> WcsResult<()> {
        match self.weapon_kind {
            WeaponKind::Alm | WeaponKind::Asm | WeaponKind::Aam => {
                let has_id = self.system_target_id.is_some_and(|id| id != 0);
                let has_pos = self.direct_target_position.is_some();
                if has_id == has_pos {
                    return Err(WcsError::NoTarget);
                }
            }
            WeaponKind::MMine => {
                let list = self.drop_plan_list.unwrap_or(0);
                let plan = self.drop_plan_no.unwrap_or(0);
                if list == 0 || plan == 0 {
                    return Err(WcsError::InvalidPlan(format!(
                        "mine assignment requires drop plan list and number, got {list}/{plan}"
                    )));
                }
            }
            WeaponKind::Wgt | WeaponKind::Na => {
                return Err(WcsError::UnsupportedKind(self.weapon_kind));
            }
        }
        Ok(())
    }
}

/// Validate a waypoint list against the count cap and position ranges.
pub fn validate_waypoints(waypoints: &[GeodeticPosition]) -> WcsResult<()> {
    if waypoints.len() > MAX_WAYPOINTS {
        return Err(WcsError::TooManyWaypoints(waypoints.len()));
    }
    for wp in waypoints {
        if !wp.is_valid() {
            return Err(WcsError::InvalidPlan(format!(
                "waypoint out of range: {:.4}, {:.4}, {:.1}",
                wp.lat_deg, wp.lon_deg, wp.depth_m
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // Busan to Ulsan is roughly 50 km.
        let busan = GeodeticPosition::new(35.1796, 129.0756, 0.0);
        let ulsan = GeodeticPosition::new(35.5384, 129.3114, 0.0);
        let d = busan.distance_m(&ulsan);
        assert!((45_000.0..55_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_symmetric_and_zero_on_self() {
        let a = GeodeticPosition::new(37.5, 127.0, 0.0);
        let b = GeodeticPosition::new(36.0, 126.0, 0.0);
        assert!((a.distance_m(&b) - b.distance_m(&a)).abs() < 1e-6);
        assert!(a.distance_m(&a) < 1e-6);
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = GeodeticPosition::new(10.0, 20.0, 0.0);
        let b = GeodeticPosition::new(12.0, 24.0, 100.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.lat_deg - 11.0).abs() < 1e-12);
        assert!((mid.depth_m - 50.0).abs() < 1e-12);
    }

    #[test]
    fn position_validation_boundaries() {
        assert!(GeodeticPosition::new(90.0, 180.0, 10_000.0).is_valid());
        assert!(GeodeticPosition::new(-90.0, -180.0, -1000.0).is_valid());
        assert!(!GeodeticPosition::new(90.01, 0.0, 0.0).is_valid());
        assert!(!GeodeticPosition::new(0.0, -180.01, 0.0).is_valid());
        assert!(!GeodeticPosition::new(0.0, 0.0, 10_000.5).is_valid());
    }

    #[test]
    fn missile_assignment_needs_exactly_one_target_source() {
        let mut info = AssignmentInfo {
            tube_no: 1,
            weapon_kind: WeaponKind::Asm,
            system_target_id: Some(42),
            ..Default::default()
        };
        assert!(info.validate().is_ok());

        info.direct_target_position = Some(GeodeticPosition::new(35.0, 129.0, 0.0));
        assert!(matches!(info.validate(), Err(WcsError::NoTarget)));

        info.system_target_id = None;
        assert!(info.validate().is_ok());

        info.direct_target_position = None;
        assert!(matches!(info.validate(), Err(WcsError::NoTarget)));

        // A zero id does not count as a targeting source.
        info.system_target_id = Some(0);
        assert!(matches!(info.validate(), Err(WcsError::NoTarget)));
    }

    #[test]
    fn mine_assignment_needs_plan_reference() {
        let info = AssignmentInfo {
            tube_no: 2,
            weapon_kind: WeaponKind::MMine,
            drop_plan_list: Some(3),
            drop_plan_no: Some(7),
            ..Default::default()
        };
        assert!(info.validate().is_ok());

        let missing = AssignmentInfo {
            tube_no: 2,
            weapon_kind: WeaponKind::MMine,
            drop_plan_list: Some(3),
            ..Default::default()
        };
        assert!(missing.validate().is_err());
    }

    #[test]
    fn waypoint_count_cap() {
        let wp = GeodeticPosition::new(35.0, 129.0, 0.0);
        assert!(validate_waypoints(&vec![wp; 8]).is_ok());
        assert!(matches!(
            validate_waypoints(&vec![wp; 9]),
            Err(WcsError::TooManyWaypoints(9))
        ));
    }
}
