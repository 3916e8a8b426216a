use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub const ACTION_REFRESH: &str = "refresh";

/// Which vehicle icon the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafIcon {
    NotPluggedIn,
    PluggedIn,
    Charging,
}

impl LeafIcon {
    pub fn for_state(is_plugged_in: bool, is_charging: bool) -> Self {
        match (is_plugged_in, is_charging) {
            (true, true) => LeafIcon::Charging,
            (true, false) => LeafIcon::PluggedIn,
            (false, _) => LeafIcon::NotPluggedIn,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            LeafIcon::NotPluggedIn => "not_plugged_in.png",
            LeafIcon::PluggedIn => "plugged_in.png",
            LeafIcon::Charging => "charging.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafState {
    pub is_plugged_in: bool,
    pub is_charging: bool,
    /// Miles
    pub cruising_range_ac_off: f64,
    /// Miles
    pub cruising_range_ac_on: f64,
}

impl LeafState {
    pub fn icon(&self) -> LeafIcon {
        LeafIcon::for_state(self.is_plugged_in, self.is_charging)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub time: String,
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub icon_path: String,
    #[serde(default)]
    pub wind_speed_mph: Option<f64>,
    #[serde(default)]
    pub wind_gust_mph: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: WeatherPoint,
    #[serde(default)]
    pub forecast: Vec<WeatherPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureReading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub id: SmolStr,
    pub display_name: SmolStr,
}

impl Action {
    pub fn refresh() -> Self {
        Self {
            id: SmolStr::new(ACTION_REFRESH),
            display_name: SmolStr::new("Refresh"),
        }
    }
}

/// The state of the world at one instant, as shown on the dashboard.
///
/// Snapshots are never modified once assembled; the freshness cache hands
/// out shared references to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub leaf: LeafState,
    pub message: String,
    pub date_string: String,
    pub weather: Option<WeatherReport>,
    pub temperature_reading: Option<TemperatureReading>,
    pub actions: Vec<Action>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn action_ids(&self) -> Vec<SmolStr> {
        self.actions.iter().map(|action| action.id.clone()).collect()
    }
}
