//! Configuration management for the `WindWatch` service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::WindWatchError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `WindWatch` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindWatchConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Outbound email configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Alerting thresholds
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Polling configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather Unlocked API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Weather Unlocked API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Weather Unlocked application id
    #[serde(default)]
    pub app_id: String,
    /// Weather Unlocked application key
    #[serde(default)]
    pub app_key: String,
    /// UK postcode to monitor, e.g. "AB1 2CD"
    #[serde(default)]
    pub postcode: String,
    /// Base URL of the public weather page linked from alerts
    #[serde(default = "default_site_url_base")]
    pub site_url_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// SMTP settings for outbound alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay hostname
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP username
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password or app password
    #[serde(default)]
    pub smtp_password: String,
    /// From address on alert emails
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Recipient of alert emails
    #[serde(default)]
    pub recipient: String,
}

/// Alerting thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Maximum acceptable wind speed in kph; readings above this alert
    #[serde(default = "default_maximum_wind_speed")]
    pub maximum_wind_speed_kph: f64,
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between polls
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// IANA time zone the daily reset is evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_api_base() -> String {
    "http://api.weatherunlocked.com/api".to_string()
}

fn default_site_url_base() -> String {
    "https://www.weatherunlocked.com/local-weather".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_from_address() -> String {
    "no-reply@windwatch.local".to_string()
}

fn default_maximum_wind_speed() -> f64 {
    30.0
}

fn default_interval_seconds() -> u64 {
    600
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            app_id: String::new(),
            app_key: String::new(),
            postcode: String::new(),
            site_url_base: default_site_url_base(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: default_from_address(),
            recipient: String::new(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            maximum_wind_speed_kph: default_maximum_wind_speed(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            timezone: default_timezone(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherConfig {
    /// Public weather page for the configured postcode, linked from alerts.
    ///
    /// Uses the outward half of the postcode, lowercased, matching the
    /// public site's URL scheme.
    #[must_use]
    pub fn weather_url(&self) -> String {
        let outcode = self
            .postcode
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        format!("{}/{}", self.site_url_base, outcode)
    }
}

impl SchedulerConfig {
    /// Parse the configured time zone identifier
    pub fn parsed_timezone(&self) -> crate::Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            WindWatchError::config(format!("Unknown time zone '{}'", self.timezone))
        })
    }
}

impl WindWatchConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WINDWATCH_ALERTS__MAXIMUM_WIND_SPEED_KPH
        builder = builder.add_source(
            Environment::with_prefix("WINDWATCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: WindWatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("windwatch").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API and SMTP credentials
    fn validate_credentials(&self) -> Result<()> {
        if self.weather.app_id.is_empty() || self.weather.app_key.is_empty() {
            return Err(WindWatchError::config(
                "Weather Unlocked app_id and app_key must both be set",
            )
            .into());
        }

        if self.weather.app_key.len() > 100 {
            return Err(WindWatchError::config(
                "Weather Unlocked app_key appears to be invalid (too long)",
            )
            .into());
        }

        if self.email.smtp_username.is_empty() || self.email.smtp_password.is_empty() {
            return Err(WindWatchError::config(
                "SMTP username and password must both be set",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.alerts.maximum_wind_speed_kph <= 0.0 {
            return Err(
                WindWatchError::config("Maximum wind speed must be positive").into(),
            );
        }

        if self.alerts.maximum_wind_speed_kph > 200.0 {
            return Err(WindWatchError::config(
                "Maximum wind speed cannot exceed 200 kph",
            )
            .into());
        }

        if self.scheduler.interval_seconds < 30 {
            return Err(WindWatchError::config(
                "Polling interval cannot be shorter than 30 seconds",
            )
            .into());
        }

        if self.scheduler.interval_seconds > 86_400 {
            return Err(WindWatchError::config(
                "Polling interval cannot exceed 86400 seconds (1 day)",
            )
            .into());
        }

        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(WindWatchError::config(
                "Weather API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        if self.weather.postcode.trim().is_empty() {
            return Err(WindWatchError::config("Postcode must be set").into());
        }

        if !self.email.recipient.contains('@') {
            return Err(WindWatchError::config(format!(
                "Recipient '{}' is not a valid email address",
                self.email.recipient
            ))
            .into());
        }

        if !self.weather.api_base.starts_with("http://")
            && !self.weather.api_base.starts_with("https://")
        {
            return Err(WindWatchError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        self.scheduler.parsed_timezone()?;

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WindWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WindWatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
