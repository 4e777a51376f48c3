//! Persistent, bounded catalog of pre-planned mine drop missions.
//!
//! One JSON file per plan list under the configured data directory.
//! Writes go to the file first and only then update the cache; reads are
//! served from the cache under a shared lock.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use wcs_core::constants::MAX_WAYPOINTS;
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::types::MinePlan;

/// On-disk layout of one plan list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlanListFile {
    list_no: u32,
    plans: Vec<MinePlan>,
}

pub struct MinePlanStore {
    data_dir: PathBuf,
    max_lists: u32,
    max_per_list: u32,
    cache: RwLock<HashMap<u32, Vec<MinePlan>>>,
}

impl MinePlanStore {
    pub fn new(data_dir: impl Into<PathBuf>, max_lists: u32, max_per_list: u32) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_lists,
            max_per_list,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create the data directory and eagerly load every list. A list whose
    /// file is missing or unreadable is created empty.
    pub fn initialize(&self) -> WcsResult<()> {
        fs::create_dir_all(&self.data_dir)?;

        for list_no in 1..=self.max_lists {
            if let Err(err) = self.load_list(list_no) {
                warn!(list_no, %err, "plan list unreadable, creating empty list");
                self.create_list(list_no)?;
            }
        }

        info!(dir = %self.data_dir.display(), lists = self.max_lists, "mine plan store initialized");
        Ok(())
    }

    pub fn is_valid_list_no(&self, list_no: u32) -> bool {
        (1..=self.max_lists).contains(&list_no)
    }

    fn list_path(&self, list_no: u32) -> PathBuf {
        self.data_dir.join(format!("plan_list_{list_no}.json"))
    }

    /// Load one list from disk into the cache.
    pub fn load_list(&self, list_no: u32) -> WcsResult<()> {
        if !self.is_valid_list_no(list_no) {
            return Err(WcsError::InvalidPlan(format!("list {list_no} out of range")));
        }

        let plans = read_list_file(&self.list_path(list_no))?;
        let mut cache = self.cache.write();
        cache.insert(list_no, plans);
        Ok(())
    }

    /// Validate and persist a full list, then refresh the cache.
    pub fn save_list(&self, list_no: u32, plans: &[MinePlan]) -> WcsResult<()> {
        if !self.is_valid_list_no(list_no) {
            return Err(WcsError::InvalidPlan(format!("list {list_no} out of range")));
        }
        if plans.len() > self.max_per_list as usize {
            return Err(WcsError::PlanListFull(list_no));
        }
        for plan in plans {
            self.validate_plan(plan)?;
        }

        let mut cache = self.cache.write();
        write_list_file(&self.list_path(list_no), list_no, plans)?;
        cache.insert(list_no, plans.to_vec());

        info!(list_no, count = plans.len(), "plan list saved");
        Ok(())
    }

    pub fn create_list(&self, list_no: u32) -> WcsResult<()> {
        self.save_list(list_no, &[])
    }

    pub fn delete_list(&self, list_no: u32) -> WcsResult<()> {
        if !self.is_valid_list_no(list_no) {
            return Err(WcsError::InvalidPlan(format!("list {list_no} out of range")));
        }

        let mut cache = self.cache.write();
        let path = self.list_path(list_no);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        cache.remove(&list_no);

        info!(list_no, "plan list deleted");
        Ok(())
    }

    pub fn get_list(&self, list_no: u32) -> Vec<MinePlan> {
        self.cache.read().get(&list_no).cloned().unwrap_or_default()
    }

    pub fn get_plan(&self, list_no: u32, plan_no: u32) -> WcsResult<MinePlan> {
        self.cache
            .read()
            .get(&list_no)
            .and_then(|plans| plans.iter().find(|p| p.plan_no == plan_no))
            .cloned()
            .ok_or_else(|| WcsError::InvalidPlan(format!("plan {plan_no} not found in list {list_no}")))
    }

    /// List numbers currently present, ascending.
    pub fn available_list_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.cache.read().keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    /// Add a new plan. Fails on duplicate plan number or a full list.
    pub fn add_plan(&self, list_no: u32, plan: MinePlan) -> WcsResult<()> {
        self.validate_plan(&plan)?;

        let mut plans = self.get_list(list_no);
        if plans.iter().any(|p| p.plan_no == plan.plan_no) {
            return Err(WcsError::DuplicatePlanNumber(plan.plan_no));
        }
        if plans.len() >= self.max_per_list as usize {
            return Err(WcsError::PlanListFull(list_no));
        }

        plans.push(plan);
        self.save_list(list_no, &plans)
    }

    /// Upsert a plan by its number.
    pub fn update_plan(&self, list_no: u32, plan: MinePlan) -> WcsResult<()> {
        self.validate_plan(&plan)?;

        let mut plans = self.get_list(list_no);
        match plans.iter_mut().find(|p| p.plan_no == plan.plan_no) {
            Some(existing) => *existing = plan,
            None => {
                if plans.len() >= self.max_per_list as usize {
                    return Err(WcsError::PlanListFull(list_no));
                }
                plans.push(plan);
            }
        }
        self.save_list(list_no, &plans)
    }

    pub fn remove_plan(&self, list_no: u32, plan_no: u32) -> WcsResult<()> {
        let mut plans = self.get_list(list_no);
        let before = plans.len();
        plans.retain(|p| p.plan_no != plan_no);
        if plans.len() == before {
            return Err(WcsError::InvalidPlan(format!(
                "plan {plan_no} not found in list {list_no}"
            )));
        }
        self.save_list(list_no, &plans)
    }

    /// A plan is valid when its number is nonzero, launch and drop
    /// positions are in range, and every waypoint (max 8) is in range.
    pub fn validate_plan(&self, plan: &MinePlan) -> WcsResult<()> {
        if plan.plan_no == 0 {
            return Err(WcsError::InvalidPlan("plan number 0 is reserved".into()));
        }
        if !plan.launch_position.is_valid() || !plan.drop_position.is_valid() {
            return Err(WcsError::InvalidPlan(format!(
                "plan {} has an out-of-range launch or drop position",
                plan.plan_no
            )));
        }
        if plan.waypoints.len() > MAX_WAYPOINTS {
            return Err(WcsError::TooManyWaypoints(plan.waypoints.len()));
        }
        if plan.waypoints.iter().any(|wp| !wp.is_valid()) {
            return Err(WcsError::InvalidPlan(format!(
                "plan {} has an out-of-range waypoint",
                plan.plan_no
            )));
        }
        Ok(())
    }

    pub fn plan_count(&self, list_no: u32) -> usize {
        self.cache.read().get(&list_no).map_or(0, Vec::len)
    }

    pub fn list_count(&self) -> usize {
        self.cache.read().len()
    }
}

fn read_list_file(path: &Path) -> WcsResult<Vec<MinePlan>> {
    let json = fs::read_to_string(path)?;
    let file: PlanListFile =
        serde_json::from_str(&json).map_err(|e| WcsError::Io(format!("parse {}: {e}", path.display())))?;
    Ok(file.plans)
}

fn write_list_file(path: &Path, list_no: u32, plans: &[MinePlan]) -> WcsResult<()> {
    let file = PlanListFile {
        list_no,
        plans: plans.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| WcsError::Io(format!("serialize list {list_no}: {e}")))?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcs_core::types::GeodeticPosition;

    fn temp_store(tag: &str) -> MinePlanStore {
        let dir = std::env::temp_dir().join(format!("wcs_plan_store_{tag}"));
        let _ = fs::remove_dir_all(&dir);
        let store = MinePlanStore::new(&dir, 15, 15);
        store.initialize().unwrap();
        store
    }

    fn sample_plan(plan_no: u32) -> MinePlan {
        MinePlan {
            plan_no,
            launch_position: GeodeticPosition::new(35.0, 129.0, 0.0),
            drop_position: GeodeticPosition::new(35.1, 129.1, 40.0),
            waypoints: vec![GeodeticPosition::new(35.05, 129.05, 20.0)],
        }
    }

    #[test]
    fn initialize_creates_all_lists() {
        let store = temp_store("init");
        assert_eq!(store.list_count(), 15);
        assert_eq!(store.available_list_numbers(), (1..=15).collect::<Vec<_>>());
    }

    #[test]
    fn round_trip_survives_a_second_store_instance() {
        let dir = std::env::temp_dir().join("wcs_plan_store_roundtrip");
        let _ = fs::remove_dir_all(&dir);

        {
            let store = MinePlanStore::new(&dir, 15, 15);
            store.initialize().unwrap();
            store.add_plan(3, sample_plan(7)).unwrap();
        }

        // Fresh instance over the same directory, as after a restart.
        let store = MinePlanStore::new(&dir, 15, 15);
        store.initialize().unwrap();
        let plan = store.get_plan(3, 7).unwrap();
        assert_eq!(plan, sample_plan(7));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_plan_number_rejected() {
        let store = temp_store("dup");
        store.add_plan(1, sample_plan(5)).unwrap();
        assert_eq!(
            store.add_plan(1, sample_plan(5)),
            Err(WcsError::DuplicatePlanNumber(5))
        );
        assert_eq!(store.plan_count(1), 1);
    }

    #[test]
    fn full_list_rejected() {
        let store = temp_store("full");
        for n in 1..=15 {
            store.add_plan(2, sample_plan(n)).unwrap();
        }
        assert_eq!(
            store.add_plan(2, sample_plan(16)),
            Err(WcsError::PlanListFull(2))
        );
    }

    #[test]
    fn list_number_bounds() {
        let store = temp_store("bounds");
        assert!(store.save_list(0, &[]).is_err());
        assert!(store.save_list(16, &[]).is_err());
        assert!(store.save_list(15, &[]).is_ok());
    }

    #[test]
    fn plan_validation_rules() {
        let store = temp_store("validate");

        let mut plan = sample_plan(1);
        plan.plan_no = 0;
        assert!(store.validate_plan(&plan).is_err());

        let mut plan = sample_plan(1);
        plan.drop_position.lat_deg = 90.5;
        assert!(store.validate_plan(&plan).is_err());

        let mut plan = sample_plan(1);
        plan.waypoints = vec![GeodeticPosition::new(35.0, 129.0, 0.0); 9];
        assert_eq!(
            store.validate_plan(&plan),
            Err(WcsError::TooManyWaypoints(9))
        );

        let mut plan = sample_plan(1);
        plan.waypoints[0].depth_m = -1000.5;
        assert!(store.validate_plan(&plan).is_err());
    }

    #[test]
    fn update_plan_upserts() {
        let store = temp_store("upsert");
        store.update_plan(4, sample_plan(2)).unwrap();
        assert_eq!(store.plan_count(4), 1);

        let mut edited = sample_plan(2);
        edited.drop_position.lat_deg = 36.0;
        store.update_plan(4, edited.clone()).unwrap();
        assert_eq!(store.plan_count(4), 1);
        assert_eq!(store.get_plan(4, 2).unwrap(), edited);
    }

    #[test]
    fn remove_plan_and_delete_list() {
        let store = temp_store("remove");
        store.add_plan(6, sample_plan(1)).unwrap();
        store.remove_plan(6, 1).unwrap();
        assert!(store.get_plan(6, 1).is_err());
        assert!(store.remove_plan(6, 1).is_err());

        store.delete_list(6).unwrap();
        assert!(!store.available_list_numbers().contains(&6));
    }
}
