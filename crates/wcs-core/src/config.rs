//! Typed configuration, loaded from an INI-style file.
//!
//! The value is passed through the composition root; there is no global.
//! Unknown keys are ignored and missing or malformed values fall back to
//! their defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{WcsError, WcsResult};

/// `[System]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSection {
    pub max_launch_tubes: u16,
    pub update_interval_ms: u64,
    pub engagement_plan_interval_ms: u64,
    pub status_report_interval_ms: u64,
}

impl Default for SystemSection {
    fn default() -> Self {
        Self {
            max_launch_tubes: 6,
            update_interval_ms: 100,
            engagement_plan_interval_ms: 1000,
            status_report_interval_ms: 1000,
        }
    }
}

impl SystemSection {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn engagement_plan_interval(&self) -> Duration {
        Duration::from_millis(self.engagement_plan_interval_ms)
    }

    pub fn status_report_interval(&self) -> Duration {
        Duration::from_millis(self.status_report_interval_ms)
    }
}

/// `[Paths]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    pub mine_data_path: PathBuf,
    pub log_path: PathBuf,
    pub config_path: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            mine_data_path: PathBuf::from("data/mine_plans"),
            log_path: PathBuf::from("logs"),
            config_path: PathBuf::from("config"),
        }
    }
}

/// `[MineDropPlan]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinePlanSection {
    pub max_plan_lists: u32,
    pub max_plans_per_list: u32,
}

impl Default for MinePlanSection {
    fn default() -> Self {
        Self {
            max_plan_lists: 15,
            max_plans_per_list: 15,
        }
    }
}

/// `[Weapon]` section. AAM performance is fixed in `constants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSection {
    /// Power-on check delay in seconds.
    pub default_launch_delay_s: f64,
    pub alm_max_range_km: f64,
    pub alm_speed_mps: f64,
    pub asm_max_range_km: f64,
    pub asm_speed_mps: f64,
    pub mine_speed_mps: f64,
}

impl Default for WeaponSection {
    fn default() -> Self {
        Self {
            default_launch_delay_s: 3.0,
            alm_max_range_km: 50.0,
            alm_speed_mps: 300.0,
            asm_max_range_km: 100.0,
            asm_speed_mps: 400.0,
            mine_speed_mps: 5.0,
        }
    }
}

/// Complete system configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcsConfig {
    pub system: SystemSection,
    pub paths: PathsSection,
    pub mine_plan: MinePlanSection,
    pub weapon: WeaponSection,
}

impl WcsConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> WcsResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| WcsError::Config(format!("cannot read {}: {e}", path.display())))?;
        Ok(Self::from_ini_str(&text))
    }

    /// Parse INI text. `;` and `#` start comments.
    pub fn from_ini_str(text: &str) -> Self {
        let map = parse_ini(text);
        let mut cfg = Self::default();

        read(&map, "System.MaxLaunchTubes", &mut cfg.system.max_launch_tubes);
        read(&map, "System.UpdateIntervalMs", &mut cfg.system.update_interval_ms);
        read(
            &map,
            "System.EngagementPlanIntervalMs",
            &mut cfg.system.engagement_plan_interval_ms,
        );
        read(
            &map,
            "System.StatusReportIntervalMs",
            &mut cfg.system.status_report_interval_ms,
        );

        if let Some(v) = map.get("Paths.MineDataPath") {
            cfg.paths.mine_data_path = PathBuf::from(v);
        }
        if let Some(v) = map.get("Paths.LogPath") {
            cfg.paths.log_path = PathBuf::from(v);
        }
        if let Some(v) = map.get("Paths.ConfigPath") {
            cfg.paths.config_path = PathBuf::from(v);
        }

        read(&map, "MineDropPlan.MaxPlanLists", &mut cfg.mine_plan.max_plan_lists);
        read(
            &map,
            "MineDropPlan.MaxPlansPerList",
            &mut cfg.mine_plan.max_plans_per_list,
        );

        read(
            &map,
            "Weapon.DefaultLaunchDelay",
            &mut cfg.weapon.default_launch_delay_s,
        );
        read(&map, "Weapon.ALMMaxRange", &mut cfg.weapon.alm_max_range_km);
        read(&map, "Weapon.ALMSpeed", &mut cfg.weapon.alm_speed_mps);
        read(&map, "Weapon.ASMMaxRange", &mut cfg.weapon.asm_max_range_km);
        read(&map, "Weapon.ASMSpeed", &mut cfg.weapon.asm_speed_mps);
        read(&map, "Weapon.MineSpeed", &mut cfg.weapon.mine_speed_mps);

        cfg
    }
}

/// Overwrite `slot` when the key is present and parses.
fn read<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, slot: &mut T) {
    if let Some(parsed) = map.get(key).and_then(|v| v.parse().ok()) {
        *slot = parsed;
    }
}

/// Flatten INI text into `Section.Key` -> value.
fn parse_ini(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut section = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            let full = if section.is_empty() {
                key.to_string()
            } else {
                format!("{section}.{key}")
            };
            map.insert(full, value.to_string());
        }
    }

    map
}
