//! Inbound commands delivered through the message interface.
//!
//! The wire transport is a collaborator; these shapes are the contract.

use serde::{Deserialize, Serialize};

use crate::enums::ControlState;
use crate::types::{AssignmentInfo, GeoPoint, GeodeticPosition, MinePlan, OwnShipNav, TargetTrack};

/// All commands the core accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WcsCommand {
    /// Assign a weapon to a tube.
    AssignWeapon(AssignmentInfo),
    /// Release a tube.
    UnassignWeapon { tube_no: u16 },
    /// Request a control-state change. Only OFF, ON, LAUNCH and ABORT are
    /// valid externally.
    ControlWeapon {
        tube_no: u16,
        target_state: ControlState,
    },
    /// Replace the waypoint list of an assigned weapon (max 8).
    UpdateWaypoints {
        tube_no: u16,
        waypoints: Vec<GeodeticPosition>,
    },
    /// Own-ship navigation update.
    UpdateOwnShip(OwnShipNav),
    /// System-target track report.
    UpdateTargetTrack(TargetTrack),
    /// Set the trajectory axis center.
    SetAxisCenter(GeoPoint),
    /// Request the contents of a mine drop-plan list.
    MineDropPlanRequest { list_no: u32 },
    /// Replace a drop-plan list with an edited copy.
    EditedPlanList { list_no: u32, plans: Vec<MinePlan> },
    /// Record the operator-selected drop plan.
    SelectedPlan { list_no: u32, plan_no: u32 },
    /// Drive every assigned tube to a terminal non-launch state.
    EmergencyStop,
    /// Shut the system down.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::WeaponKind;

    #[test]
    fn command_json_roundtrip() {
        let cmd = WcsCommand::AssignWeapon(AssignmentInfo {
            tube_no: 1,
            weapon_kind: WeaponKind::Alm,
            direct_target_position: Some(GeodeticPosition::new(37.5, 127.0, 0.0)),
            ..Default::default()
        });
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"AssignWeapon\""));
        let back: WcsCommand = serde_json::from_str(&json).unwrap();
        match back {
            WcsCommand::AssignWeapon(info) => {
                assert_eq!(info.tube_no, 1);
                assert_eq!(info.weapon_kind, WeaponKind::Alm);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn control_command_parses_from_operator_json() {
        let json = r#"{"type":"ControlWeapon","tube_no":2,"target_state":"Launch"}"#;
        let cmd: WcsCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd,
            WcsCommand::ControlWeapon {
                tube_no: 2,
                target_state: ControlState::Launch
            }
        ));
    }
}
