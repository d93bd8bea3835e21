//! Alert decision engine combining a wind reading with its tracked history

use crate::conditions::{ConditionStore, Observation, SlotKey, TrackingPolicy};
use crate::models::WindReading;

/// Outcome of evaluating one slot on one tick
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    /// Whether this reading should trigger an alert line
    pub should_alert: bool,
    /// Signed speed delta against the stored history, zero on first sight
    pub change: f64,
    /// The reading the decision was made for, absent for empty slots
    pub reading: Option<WindReading>,
}

impl AlertDecision {
    /// A decision that neither alerts nor reports a change
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            should_alert: false,
            change: 0.0,
            reading: None,
        }
    }
}

/// Pure decision function over readings, slot keys and the condition store.
///
/// The alert test is against the current reading's speed, independent of the
/// change computation: a reading over the maximum alerts whether or not the
/// stored history moved.
pub struct AlertEvaluator {
    maximum_wind_speed: f64,
}

impl AlertEvaluator {
    #[must_use]
    pub fn new(maximum_wind_speed: f64) -> Self {
        Self { maximum_wind_speed }
    }

    /// The configured maximum wind speed in kph
    #[must_use]
    pub fn maximum_wind_speed(&self) -> f64 {
        self.maximum_wind_speed
    }

    /// Evaluate one slot's reading against its history.
    ///
    /// An absent reading (a forecast day the upstream did not return) yields
    /// a quiet decision and leaves the store untouched.
    pub fn evaluate(
        &self,
        reading: Option<&WindReading>,
        key: SlotKey,
        store: &mut ConditionStore,
    ) -> AlertDecision {
        let Some(reading) = reading else {
            return AlertDecision::quiet();
        };

        let over_maximum = reading.speed > self.maximum_wind_speed;
        match store.upsert(key, reading.speed) {
            Observation::First => AlertDecision {
                should_alert: over_maximum,
                change: 0.0,
                reading: Some(reading.clone()),
            },
            Observation::Changed(change) => AlertDecision {
                should_alert: over_maximum,
                change,
                reading: Some(reading.clone()),
            },
            Observation::Unchanged => {
                // Under last-value tracking an unchanged reading stays silent
                // until the speed moves again; the envelope policy re-alerts
                // as long as the reading is over the maximum.
                let should_alert =
                    over_maximum && store.policy() == TrackingPolicy::Envelope;
                AlertDecision {
                    should_alert,
                    change: 0.0,
                    reading: Some(reading.clone()),
                }
            }
        }
    }
}
