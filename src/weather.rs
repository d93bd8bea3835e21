//! Weather Unlocked client and the snapshot supplier seam

use crate::config::WeatherConfig;
use crate::error::WindWatchError;
use crate::models::WeatherSnapshot;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Supplies one decoded weather snapshot per poll.
///
/// The scheduler only ever sees this seam, so tests drive it with canned
/// snapshots instead of a live API.
#[async_trait]
pub trait WeatherSupplier: Send + Sync {
    async fn fetch_snapshot(&self) -> crate::Result<WeatherSnapshot>;
}

/// HTTP client for the Weather Unlocked local-weather API
pub struct WeatherUnlockedClient {
    client: reqwest::Client,
    api_base: String,
    app_id: String,
    app_key: String,
    postcode: String,
}

impl WeatherUnlockedClient {
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .map_err(|e| WindWatchError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            app_id: config.app_id.clone(),
            app_key: config.app_key.clone(),
            postcode: config.postcode.clone(),
        })
    }

    /// Endpoint for one resource kind ("current" or "forecast").
    ///
    /// The postcode is sent without whitespace, lowercased, the way the
    /// Weather Unlocked path expects UK postcodes.
    fn endpoint(&self, kind: &str) -> String {
        let postcode: String = self
            .postcode
            .split_whitespace()
            .collect::<String>()
            .to_lowercase();
        format!(
            "{}/{}/uk.{}?app_id={}&app_key={}",
            self.api_base,
            kind,
            urlencoding::encode(&postcode),
            self.app_id,
            self.app_key
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, kind: &str) -> crate::Result<T> {
        let response = self
            .client
            .get(self.endpoint(kind))
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl WeatherSupplier for WeatherUnlockedClient {
    async fn fetch_snapshot(&self) -> crate::Result<WeatherSnapshot> {
        tracing::debug!(postcode = %self.postcode, "fetching weather snapshot");
        let current: weather_unlocked::CurrentResponse = self.get_json("current").await?;
        let forecast: weather_unlocked::ForecastResponse = self.get_json("forecast").await?;
        Ok(weather_unlocked::to_snapshot(&current, &forecast))
    }
}

/// Weather Unlocked API response structures and conversion utilities
mod weather_unlocked {
    use crate::conditions::SLOT_DATE_FORMAT;
    use crate::models::{ForecastDay, ForecastTimeframe, WeatherSnapshot, WindReading};
    use chrono::NaiveDate;
    use serde::Deserialize;

    /// Current conditions response
    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        #[serde(rename = "windspd_kmh")]
        pub wind_speed_kmh: Option<f64>,
        #[serde(rename = "winddir_compass")]
        pub wind_direction: Option<String>,
    }

    /// Seven-day forecast response
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        #[serde(rename = "Days", default)]
        pub days: Vec<DayResponse>,
    }

    /// One forecast day
    #[derive(Debug, Deserialize)]
    pub struct DayResponse {
        pub date: Option<String>,
        #[serde(rename = "windspd_max_kmh")]
        pub wind_speed_max_kmh: Option<f64>,
        #[serde(rename = "Timeframes", default)]
        pub timeframes: Vec<TimeframeResponse>,
    }

    /// One three-hourly timeframe inside a forecast day
    #[derive(Debug, Deserialize)]
    pub struct TimeframeResponse {
        pub date: Option<String>,
        pub time: Option<i32>,
        #[serde(rename = "windspd_kmh")]
        pub wind_speed_kmh: Option<f64>,
        #[serde(rename = "winddir_compass")]
        pub wind_direction: Option<String>,
    }

    /// Convert the raw responses into the internal snapshot model.
    ///
    /// Anything the upstream omitted or that fails to parse becomes `None`
    /// rather than an error; the evaluator treats those slots as unobserved.
    pub fn to_snapshot(
        current: &CurrentResponse,
        forecast: &ForecastResponse,
    ) -> WeatherSnapshot {
        let current = current.wind_speed_kmh.map(|speed| {
            WindReading::kph(speed, direction_or_unknown(current.wind_direction.as_deref()))
        });

        let days = forecast
            .days
            .iter()
            .map(|day| {
                let timeframes: Vec<ForecastTimeframe> = day
                    .timeframes
                    .iter()
                    .map(|timeframe| ForecastTimeframe {
                        date: timeframe.date.as_deref().and_then(parse_slot_date),
                        time_label: timeframe.time.map_or_else(String::new, time_label),
                        wind: timeframe.wind_speed_kmh.map(|speed| {
                            WindReading::kph(
                                speed,
                                direction_or_unknown(timeframe.wind_direction.as_deref()),
                            )
                        }),
                    })
                    .collect();

                // The day-level record carries no direction of its own, so
                // borrow the first timeframe's, the way the feed is documented
                let day_direction = timeframes
                    .iter()
                    .find_map(|timeframe| timeframe.wind.as_ref())
                    .map_or_else(|| "unknown".to_string(), |wind| wind.direction.clone());

                ForecastDay {
                    date: day.date.as_deref().and_then(parse_slot_date),
                    wind: day
                        .wind_speed_max_kmh
                        .map(|speed| WindReading::kph(speed, day_direction)),
                    timeframes,
                }
            })
            .collect();

        WeatherSnapshot { current, days }
    }

    fn direction_or_unknown(direction: Option<&str>) -> String {
        match direction {
            Some(direction) if !direction.is_empty() => direction.to_string(),
            _ => "unknown".to_string(),
        }
    }

    fn parse_slot_date(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, SLOT_DATE_FORMAT).ok()
    }

    /// Render the feed's integer clock (0, 300, ... 2100) as "12am", "3am", ...
    fn time_label(time: i32) -> String {
        let hour = (time / 100).rem_euclid(24);
        match hour {
            0 => "12am".to_string(),
            12 => "12pm".to_string(),
            1..=11 => format!("{hour}am"),
            _ => format!("{}pm", hour - 12),
        }
    }

}
