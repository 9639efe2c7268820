use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::Error;

pub const DEFAULT_LOCATION: &str = "Tuguegarao";
pub const DEFAULT_FORECAST_DAYS: u8 = 3;

/// WeatherAPI.com serves at most 14 forecast days.
pub const MAX_FORECAST_DAYS: u8 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub location: String,
    pub days: u8,
}

impl ForecastRequest {
    /// Rejects an empty location or a horizon outside 1..=[`MAX_FORECAST_DAYS`].
    pub fn validate(&self) -> Result<(), Error> {
        if self.location.trim().is_empty() {
            return Err(Error::Configuration("location must not be empty".to_string()));
        }
        if !(1..=MAX_FORECAST_DAYS).contains(&self.days) {
            return Err(Error::Configuration(format!(
                "forecast_days must be between 1 and {MAX_FORECAST_DAYS}, got {}",
                self.days
            )));
        }
        Ok(())
    }
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self { location: DEFAULT_LOCATION.to_string(), days: DEFAULT_FORECAST_DAYS }
    }
}

/// Laundry-relevant summary of a single forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDaySummary {
    pub date: NaiveDate,
    pub avg_temp_c: f64,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub avg_humidity: f64,
    pub daily_chance_of_rain: RainChance,
    pub max_wind_kph: f64,
    pub total_precip_mm: f64,
    pub condition: String,
}

/// Chance of rain for a day. Serialized as a plain number, or `"N/A"` when the
/// provider did not report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainChance {
    Percent(u8),
    Unknown,
}

const UNKNOWN_SENTINEL: &str = "N/A";

impl RainChance {
    pub(crate) fn from_reported(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => RainChance::Percent(v.round().clamp(0.0, 100.0) as u8),
            _ => RainChance::Unknown,
        }
    }
}

impl fmt::Display for RainChance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainChance::Percent(p) => write!(f, "{p}%"),
            RainChance::Unknown => f.write_str(UNKNOWN_SENTINEL),
        }
    }
}

impl Serialize for RainChance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RainChance::Percent(p) => serializer.serialize_u8(*p),
            RainChance::Unknown => serializer.serialize_str(UNKNOWN_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for RainChance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(n) => Ok(RainChance::from_reported(Some(n))),
            Wire::Text(s) if s == UNKNOWN_SENTINEL => Ok(RainChance::Unknown),
            Wire::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a percentage or \"{UNKNOWN_SENTINEL}\", got \"{s}\""
            ))),
        }
    }
}
