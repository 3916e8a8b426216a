//! Decides whether the image rendered from a cached snapshot can still stand
//! in for one rendered from the current snapshot.
//!
//! The numeric checks are one-directional: they only fire when the cached
//! value exceeds the current one by more than the tolerance. A rise in range,
//! temperature or humidity never invalidates a cached image on its own.

use std::fmt;

use chrono::Duration;

use crate::snapshot::DashboardSnapshot;

pub const DEFAULT_MAX_AGE_MINUTES: i64 = 30;
pub const RANGE_TOLERANCE_MILES: f64 = 3.0;
pub const TEMPERATURE_TOLERANCE_C: f64 = 0.5;
pub const HUMIDITY_TOLERANCE_PERCENT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeReason {
    NotCached,
    Stale { age: Duration },
    ChargingChanged,
    PluggedInChanged,
    RangeDropped { cached: f64, current: f64 },
    MessageChanged,
    TemperatureReadingChanged,
    TemperatureDropped { cached: f64, current: f64 },
    HumidityDropped { cached: f64, current: f64 },
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeReason::NotCached => write!(f, "no cached snapshot"),
            ChangeReason::Stale { age } => {
                write!(f, "cached snapshot is {} minutes old", age.num_minutes())
            }
            ChangeReason::ChargingChanged => write!(f, "is_charging has changed"),
            ChangeReason::PluggedInChanged => write!(f, "is_plugged_in has changed"),
            ChangeReason::RangeDropped { cached, current } => {
                write!(f, "cruising range dropped from {cached} to {current} miles")
            }
            ChangeReason::MessageChanged => write!(f, "message has changed"),
            ChangeReason::TemperatureReadingChanged => {
                write!(f, "temperature reading appeared or disappeared")
            }
            ChangeReason::TemperatureDropped { cached, current } => {
                write!(f, "temperature dropped from {cached} to {current}")
            }
            ChangeReason::HumidityDropped { cached, current } => {
                write!(f, "humidity dropped from {cached} to {current}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Reusable,
    Regenerate(ChangeReason),
}

impl Verdict {
    pub fn is_reusable(&self) -> bool {
        matches!(self, Verdict::Reusable)
    }
}

#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    max_age: Duration,
    range_tolerance: f64,
    temperature_tolerance: f64,
    humidity_tolerance: f64,
}

impl FreshnessPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Checks run in a fixed order and the first failure wins.
    pub fn evaluate(
        &self,
        cached: Option<&DashboardSnapshot>,
        current: &DashboardSnapshot,
    ) -> Verdict {
        let Some(cached) = cached else {
            return Verdict::Regenerate(ChangeReason::NotCached);
        };

        match self.significant_change(cached, current) {
            Some(reason) => Verdict::Regenerate(reason),
            None => Verdict::Reusable,
        }
    }

    fn significant_change(
        &self,
        cached: &DashboardSnapshot,
        current: &DashboardSnapshot,
    ) -> Option<ChangeReason> {
        let age = current.generated_at - cached.generated_at;
        if age > self.max_age {
            return Some(ChangeReason::Stale { age });
        }

        if cached.leaf.is_charging != current.leaf.is_charging {
            return Some(ChangeReason::ChargingChanged);
        }
        if cached.leaf.is_plugged_in != current.leaf.is_plugged_in {
            return Some(ChangeReason::PluggedInChanged);
        }
        let (cached_range, current_range) = (
            cached.leaf.cruising_range_ac_off,
            current.leaf.cruising_range_ac_off,
        );
        if cached_range - current_range > self.range_tolerance {
            return Some(ChangeReason::RangeDropped {
                cached: cached_range,
                current: current_range,
            });
        }

        if cached.message != current.message {
            return Some(ChangeReason::MessageChanged);
        }

        match (&cached.temperature_reading, &current.temperature_reading) {
            (Some(cached), Some(current)) => {
                if cached.temperature - current.temperature > self.temperature_tolerance {
                    return Some(ChangeReason::TemperatureDropped {
                        cached: cached.temperature,
                        current: current.temperature,
                    });
                }
                if cached.humidity - current.humidity > self.humidity_tolerance {
                    return Some(ChangeReason::HumidityDropped {
                        cached: cached.humidity,
                        current: current.humidity,
                    });
                }
            }
            (None, None) => {}
            _ => return Some(ChangeReason::TemperatureReadingChanged),
        }

        None
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::minutes(DEFAULT_MAX_AGE_MINUTES),
            range_tolerance: RANGE_TOLERANCE_MILES,
            temperature_tolerance: TEMPERATURE_TOLERANCE_C,
            humidity_tolerance: HUMIDITY_TOLERANCE_PERCENT,
        }
    }
}
