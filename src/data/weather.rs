use super::store::JsonStore;
use crate::error::Result;
use crate::snapshot::{WeatherPoint, WeatherReport};

pub const WEATHER_SUMMARY_FILE: &str = "weather-summary.json";

/// Forecast entries shown next to the current conditions.
pub const FORECAST_ENTRIES: usize = 2;

pub fn load(store: &JsonStore) -> Result<Option<WeatherReport>> {
    store.read_optional(WEATHER_SUMMARY_FILE)
}

impl WeatherPoint {
    /// Whole degrees and whole mph, as displayed.
    pub fn rounded(&self) -> Self {
        Self {
            temperature: self.temperature.round(),
            feels_like: self.feels_like.round(),
            wind_speed_mph: self.wind_speed_mph.map(f64::round),
            wind_gust_mph: self.wind_gust_mph.map(f64::round),
            humidity: self.humidity.map(f64::round),
            ..self.clone()
        }
    }
}

impl WeatherReport {
    pub fn for_display(&self) -> Self {
        Self {
            current: self.current.rounded(),
            forecast: self
                .forecast
                .iter()
                .take(FORECAST_ENTRIES)
                .map(WeatherPoint::rounded)
                .collect(),
        }
    }
}
