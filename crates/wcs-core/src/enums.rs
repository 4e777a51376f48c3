//! Enumeration types used throughout the weapon control system.

use serde::{Deserialize, Serialize};

/// Weapon family assignable to a launch tube.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Land-attack missile.
    Alm,
    /// Anti-ship missile.
    Asm,
    /// Anti-air missile.
    Aam,
    /// Self-propelled mine, driven by a pre-planned drop mission.
    MMine,
    /// Recognized but unsupported placeholder kind.
    Wgt,
    /// No weapon assigned.
    #[default]
    Na,
}

impl WeaponKind {
    /// True for the guided-missile kinds (ALM/ASM/AAM).
    pub fn is_missile(self) -> bool {
        matches!(self, WeaponKind::Alm | WeaponKind::Asm | WeaponKind::Aam)
    }

    pub fn is_mine(self) -> bool {
        self == WeaponKind::MMine
    }
}

impl std::fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WeaponKind::Alm => "ALM",
            WeaponKind::Asm => "ASM",
            WeaponKind::Aam => "AAM",
            WeaponKind::MMine => "MINE",
            WeaponKind::Wgt => "WGT",
            WeaponKind::Na => "NA",
        };
        f.write_str(name)
    }
}

/// Weapon control state.
///
/// POC, RTL and POST_LAUNCH are internal: external control commands may
/// only request OFF, ON, LAUNCH or ABORT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlState {
    #[default]
    Off,
    /// Power-on check, transient sub-state of ON entry.
    Poc,
    On,
    /// Ready to launch: fire solution valid, awaiting LAUNCH.
    Rtl,
    Launch,
    PostLaunch,
    Abort,
}

impl ControlState {
    /// Stable numeric encoding for lock-free atomic storage.
    pub fn as_u8(self) -> u8 {
        match self {
            ControlState::Off => 0,
            ControlState::Poc => 1,
            ControlState::On => 2,
            ControlState::Rtl => 3,
            ControlState::Launch => 4,
            ControlState::PostLaunch => 5,
            ControlState::Abort => 6,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ControlState::Poc,
            2 => ControlState::On,
            3 => ControlState::Rtl,
            4 => ControlState::Launch,
            5 => ControlState::PostLaunch,
            6 => ControlState::Abort,
            _ => ControlState::Off,
        }
    }
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ControlState::Off => "OFF",
            ControlState::Poc => "POC",
            ControlState::On => "ON",
            ControlState::Rtl => "RTL",
            ControlState::Launch => "LAUNCH",
            ControlState::PostLaunch => "POST_LAUNCH",
            ControlState::Abort => "ABORT",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_state_u8_roundtrip() {
        for state in [
            ControlState::Off,
            ControlState::Poc,
            ControlState::On,
            ControlState::Rtl,
            ControlState::Launch,
            ControlState::PostLaunch,
            ControlState::Abort,
        ] {
            assert_eq!(ControlState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn weapon_kind_families() {
        assert!(WeaponKind::Alm.is_missile());
        assert!(WeaponKind::Aam.is_missile());
        assert!(!WeaponKind::MMine.is_missile());
        assert!(WeaponKind::MMine.is_mine());
        assert!(!WeaponKind::Na.is_missile());
    }
}
