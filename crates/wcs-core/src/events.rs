//! Events emitted by the core for the outward reporting surface.

use serde::{Deserialize, Serialize};

use crate::enums::{ControlState, WeaponKind};
use crate::state::EngagementPlanResult;
use crate::types::MinePlan;

/// Per-tube and store-level reports. Delivered in state-commit order for
/// any given tube.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WcsEvent {
    /// A weapon control-state transition committed.
    StateChanged {
        tube_no: u16,
        old: ControlState,
        new: ControlState,
    },
    /// A weapon's launched flag changed.
    LaunchStatusChanged { tube_no: u16, launched: bool },
    /// The engagement plan for a tube changed materially.
    EngagementPlanUpdated {
        tube_no: u16,
        result: EngagementPlanResult,
    },
    /// A tube was assigned or released.
    AssignmentChanged {
        tube_no: u16,
        kind: WeaponKind,
        assigned: bool,
    },
    /// Response to a drop-plan list request.
    PlanListReport { list_no: u32, plans: Vec<MinePlan> },
}
