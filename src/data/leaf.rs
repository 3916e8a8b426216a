use serde::Deserialize;

use super::store::JsonStore;
use crate::error::Result;
use crate::snapshot::LeafState;

pub const LEAF_SUMMARY_FILE: &str = "leaf-summary.json";

const NOT_CHARGING: &str = "NOT_CHARGING";

/// `leaf-summary.json` as written by the vehicle status poller.
#[derive(Debug, Clone, Deserialize)]
pub struct LeafSummary {
    pub is_connected: bool,
    pub charging_status: String,
    pub cruising_range_ac_off_miles: f64,
    pub cruising_range_ac_on_miles: f64,
}

impl From<LeafSummary> for LeafState {
    fn from(summary: LeafSummary) -> Self {
        Self {
            is_plugged_in: summary.is_connected,
            is_charging: summary.charging_status != NOT_CHARGING,
            cruising_range_ac_off: summary.cruising_range_ac_off_miles,
            cruising_range_ac_on: summary.cruising_range_ac_on_miles,
        }
    }
}

/// The vehicle state is mandatory: a missing summary fails the snapshot.
pub fn load(store: &JsonStore) -> Result<LeafState> {
    let summary: LeafSummary = store.read(LEAF_SUMMARY_FILE)?;
    Ok(summary.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use crate::snapshot::LeafIcon;
    use tempfile::TempDir;

    fn write_summary(dir: &TempDir, connected: bool, status: &str) {
        let json = serde_json::json!({
            "update_date": "2026-10-19 07:30:00",
            "is_connected": connected,
            "charging_status": status,
            "cruising_range_ac_off_miles": 112.4,
            "cruising_range_ac_on_miles": 98.0,
        });
        std::fs::write(dir.path().join(LEAF_SUMMARY_FILE), json.to_string()).unwrap();
    }

    #[test]
    fn test_load_maps_summary() {
        let dir = TempDir::new().unwrap();
        write_summary(&dir, true, "NORMAL_CHARGING");

        let leaf = load(&JsonStore::new(dir.path())).unwrap();
        assert!(leaf.is_plugged_in);
        assert!(leaf.is_charging);
        assert_eq!(leaf.cruising_range_ac_off, 112.4);
        assert_eq!(leaf.cruising_range_ac_on, 98.0);
        assert_eq!(leaf.icon(), LeafIcon::Charging);
    }

    #[test]
    fn test_not_charging_status() {
        let dir = TempDir::new().unwrap();
        write_summary(&dir, true, "NOT_CHARGING");

        let leaf = load(&JsonStore::new(dir.path())).unwrap();
        assert!(!leaf.is_charging);
        assert_eq!(leaf.icon(), LeafIcon::PluggedIn);
    }

    #[test]
    fn test_missing_summary_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = load(&JsonStore::new(dir.path())).unwrap_err();
        assert!(matches!(err, DashError::DataUnavailable { .. }));
    }
}
