use std::collections::BTreeMap;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::store::JsonStore;
use crate::error::Result;
use crate::snapshot::TemperatureReading;

pub const TEMPERATURES_FILE: &str = "temperatures.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Temperatures {
    #[serde(default)]
    pub temperatures: BTreeMap<String, StoredReading>,
}

/// One sensor's latest report, in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub reported_at: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
}

impl StoredReading {
    /// One decimal place, as displayed.
    pub fn for_display(&self) -> TemperatureReading {
        TemperatureReading {
            temperature: round_tenths(self.temperature),
            humidity: round_tenths(self.humidity),
        }
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `None` when the file or the sensor is missing.
pub fn reading(store: &JsonStore, sensor: &str) -> Result<Option<StoredReading>> {
    let temperatures: Option<Temperatures> = store.read_optional(TEMPERATURES_FILE)?;
    Ok(temperatures.and_then(|mut t| t.temperatures.remove(sensor)))
}

pub fn record(
    store: &JsonStore,
    sensor: &str,
    temperature: f64,
    humidity: f64,
) -> Result<StoredReading> {
    let stored = StoredReading {
        reported_at: Utc::now().naive_utc().trunc_subsecs(0),
        temperature,
        humidity,
    };

    store.update(TEMPERATURES_FILE, |temperatures: &mut Temperatures| {
        temperatures
            .temperatures
            .insert(sensor.to_string(), stored.clone());
        Ok(())
    })?;

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_then_read() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(reading(&store, "pistat-0").unwrap().is_none());

        let stored = record(&store, "pistat-0", 21.26, 48.04).unwrap();
        record(&store, "pistat-1", 18.0, 60.0).unwrap();

        let read = reading(&store, "pistat-0").unwrap().unwrap();
        assert_eq!(read, stored);
        assert_eq!(
            read.for_display(),
            TemperatureReading {
                temperature: 21.3,
                humidity: 48.0,
            }
        );
        assert!(reading(&store, "pistat-2").unwrap().is_none());
    }

    #[test]
    fn test_reads_fractional_timestamps() {
        let dir = TempDir::new().unwrap();
        let json = r#"{"temperatures": {"pistat-0": {
            "reported_at": "2026-10-19T07:30:12.345678",
            "temperature": 19.5,
            "humidity": 55.0
        }}}"#;
        std::fs::write(dir.path().join(TEMPERATURES_FILE), json).unwrap();

        let read = reading(&JsonStore::new(dir.path()), "pistat-0")
            .unwrap()
            .unwrap();
        assert_eq!(read.temperature, 19.5);
    }
}
