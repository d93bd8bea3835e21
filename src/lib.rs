//! `WindWatch` - wind speed monitoring and email alerting
//!
//! This library provides the core functionality for polling local weather,
//! tracking wind conditions per forecast slot, and deciding when a change in
//! the wind warrants an email alert.

pub mod analysis;
pub mod conditions;
pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod weather;

// Re-export core types for public API
pub use analysis::{AlertDecision, AlertEvaluator};
pub use conditions::{ConditionStore, Observation, SlotKey, TrackedCondition, TrackingPolicy};
pub use config::WindWatchConfig;
pub use email::{AlertSink, SmtpAlertSink};
pub use error::WindWatchError;
pub use models::{WeatherSnapshot, WindReading};
pub use report::{Report, ReportBuilder};
pub use scheduler::{Scheduler, TickOutcome};
pub use weather::{WeatherSupplier, WeatherUnlockedClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WindWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
