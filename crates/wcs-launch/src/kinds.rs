//! Per-kind weapon specifications and the factory that builds the
//! (weapon, engagement manager) pair for an assignment.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use wcs_core::config::WcsConfig;
use wcs_core::constants::{AAM_MAX_RANGE_KM, AAM_SPEED_MPS};
use wcs_core::enums::WeaponKind;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::events::WcsEvent;
use wcs_engage::{Engagement, MineEngagement, MissileEngagement};
use wcs_store::MinePlanStore;

use crate::weapon::{LaunchStep, Weapon};

/// Static performance figures for one weapon kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponSpec {
    pub name: &'static str,
    pub max_range_km: f64,
    pub speed_mps: f64,
    /// Power-on check delay, seconds.
    pub launch_delay_s: f64,
}

/// Resolve the spec for a kind, `None` for unsupported kinds.
pub fn weapon_spec(kind: WeaponKind, config: &WcsConfig) -> Option<WeaponSpec> {
    let w = &config.weapon;
    match kind {
        WeaponKind::Alm => Some(WeaponSpec {
            name: "ALM",
            max_range_km: w.alm_max_range_km,
            speed_mps: w.alm_speed_mps,
            launch_delay_s: w.default_launch_delay_s,
        }),
        WeaponKind::Asm => Some(WeaponSpec {
            name: "ASM",
            max_range_km: w.asm_max_range_km,
            speed_mps: w.asm_speed_mps,
            launch_delay_s: w.default_launch_delay_s,
        }),
        WeaponKind::Aam => Some(WeaponSpec {
            name: "AAM",
            max_range_km: AAM_MAX_RANGE_KM,
            speed_mps: AAM_SPEED_MPS,
            launch_delay_s: w.default_launch_delay_s,
        }),
        WeaponKind::MMine => Some(WeaponSpec {
            name: "MINE",
            max_range_km: 30.0,
            speed_mps: w.mine_speed_mps,
            launch_delay_s: w.default_launch_delay_s,
        }),
        WeaponKind::Wgt | WeaponKind::Na => None,
    }
}

/// The ordered launch sequence for a kind. Three one-second steps.
pub fn launch_steps(kind: WeaponKind) -> Vec<LaunchStep> {
    ["power-on check", "system verification", "launch sequence"]
        .into_iter()
        .map(|phase| LaunchStep {
            description: format!("{kind} {phase}"),
            duration: Duration::from_secs_f64(1.0),
        })
        .collect()
}

/// Builds matched (weapon, engagement manager) pairs, keyed on kind.
pub struct WeaponFactory {
    config: WcsConfig,
    plan_store: Arc<MinePlanStore>,
}

impl WeaponFactory {
    pub fn new(config: WcsConfig, plan_store: Arc<MinePlanStore>) -> Self {
        Self { config, plan_store }
    }

    pub fn config(&self) -> &WcsConfig {
        &self.config
    }

    pub fn supports(&self, kind: WeaponKind) -> bool {
        weapon_spec(kind, &self.config).is_some()
    }

    pub fn build(
        &self,
        tube_no: u16,
        kind: WeaponKind,
        events: mpsc::Sender<WcsEvent>,
    ) -> WcsResult<(Weapon, Engagement)> {
        let spec = weapon_spec(kind, &self.config).ok_or(WcsError::UnsupportedKind(kind))?;

        let engagement = match kind {
            WeaponKind::MMine => {
                Engagement::Mine(MineEngagement::new(spec.speed_mps, Arc::clone(&self.plan_store)))
            }
            _ => Engagement::Missile(MissileEngagement::new(kind, spec.speed_mps)),
        };

        let weapon = Weapon::new(kind, tube_no, spec, launch_steps(kind), events);
        Ok((weapon, engagement))
    }
}
