//! System-target track registry with age-based eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use wcs_core::constants::TARGET_SWEEP_INTERVAL;
use wcs_core::types::TargetTrack;

struct TargetEntry {
    track: TargetTrack,
    last_update_at: Instant,
}

/// Mapping from system-target id to the latest track report.
pub struct TargetRegistry {
    max_age: Duration,
    entries: RwLock<HashMap<u32, TargetEntry>>,
    last_sweep: Mutex<Instant>,
}

impl TargetRegistry {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entries: RwLock::new(HashMap::new()),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Insert or refresh a track, stamping the update time. Triggers a
    /// lazy eviction sweep at most once per sweep interval.
    pub fn update(&self, track: TargetTrack) {
        {
            let mut entries = self.entries.write();
            entries.insert(
                track.system_target_id,
                TargetEntry {
                    track,
                    last_update_at: Instant::now(),
                },
            );
        }

        let mut last_sweep = self.last_sweep.lock();
        if last_sweep.elapsed() >= TARGET_SWEEP_INTERVAL {
            *last_sweep = Instant::now();
            drop(last_sweep);
            self.clear_older_than(self.max_age);
        }
    }

    pub fn get(&self, system_target_id: u32) -> Option<TargetTrack> {
        self.entries
            .read()
            .get(&system_target_id)
            .map(|entry| entry.track)
    }

    pub fn all_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.entries.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry older than `max_age`.
    pub fn clear_older_than(&self, max_age: Duration) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.last_update_at.elapsed() <= max_age);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted stale target tracks");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcs_core::types::GeodeticPosition;

    fn track(id: u32) -> TargetTrack {
        TargetTrack {
            system_target_id: id,
            position: GeodeticPosition::new(36.0, 128.0, 0.0),
            course_deg: 90.0,
            speed_mps: 10.0,
        }
    }

    #[test]
    fn update_and_get() {
        let registry = TargetRegistry::new(Duration::from_secs(300));
        assert!(registry.get(42).is_none());

        registry.update(track(42));
        let got = registry.get(42).unwrap();
        assert_eq!(got.system_target_id, 42);
        assert_eq!(got.course_deg, 90.0);
    }

    #[test]
    fn refresh_replaces_entry() {
        let registry = TargetRegistry::new(Duration::from_secs(300));
        registry.update(track(7));
        let mut updated = track(7);
        updated.speed_mps = 25.0;
        registry.update(updated);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(7).unwrap().speed_mps, 25.0);
    }

    #[test]
    fn eviction_removes_only_stale_entries() {
        let registry = TargetRegistry::new(Duration::from_millis(50));
        registry.update(track(1));
        std::thread::sleep(Duration::from_millis(80));
        registry.update(track(2));

        registry.clear_older_than(Duration::from_millis(50));
        assert!(registry.get(1).is_none());
        assert!(registry.get(2).is_some());
        assert_eq!(registry.all_ids(), vec![2]);
    }
}
