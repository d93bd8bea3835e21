//! Weather snapshot model shared by the analysis and reporting layers
//!
//! One [`WeatherSnapshot`] is built per poll from the decoded API responses.
//! Slots that the upstream did not populate stay `None` so the evaluator can
//! treat them as "no observation" rather than an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One wind observation extracted from a snapshot slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindReading {
    /// Wind speed, non-negative, in the unit below
    pub speed: f64,
    /// Compass direction the wind blows from (e.g. "NW", or "unknown")
    pub direction: String,
    /// Display unit, "kph" for Weather Unlocked data
    pub unit: String,
}

impl WindReading {
    /// Build a kph reading, the unit all Weather Unlocked wind data arrives in
    #[must_use]
    pub fn kph(speed: f64, direction: impl Into<String>) -> Self {
        Self {
            speed,
            direction: direction.into(),
            unit: "kph".to_string(),
        }
    }
}

/// One intraday forecast timeframe (Weather Unlocked reports eight per day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTimeframe {
    /// Calendar date of the timeframe, if the upstream supplied one
    pub date: Option<NaiveDate>,
    /// Short time-of-day label such as "7am"
    pub time_label: String,
    /// Wind reading for this timeframe
    pub wind: Option<WindReading>,
}

/// One forecast day with its intraday timeframes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Calendar date of the day, if the upstream supplied one
    pub date: Option<NaiveDate>,
    /// Day-level wind reading (daily maximum)
    pub wind: Option<WindReading>,
    /// Intraday timeframes in upstream order
    pub timeframes: Vec<ForecastTimeframe>,
}

/// Everything one poll observed: current conditions plus the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Current conditions wind, absent when the upstream omitted it
    pub current: Option<WindReading>,
    /// Forecast days in upstream order
    pub days: Vec<ForecastDay>,
}
