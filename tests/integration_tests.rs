//! Integration tests for the WindWatch alert engine
//!
//! Drives the public scheduler API with canned snapshots and a recording
//! sink, the way the production composition wires a live API client and an
//! SMTP transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use windwatch::config::WindWatchConfig;
use windwatch::email::AlertSink;
use windwatch::models::{ForecastDay, ForecastTimeframe, WeatherSnapshot, WindReading};
use windwatch::report::Report;
use windwatch::scheduler::{Scheduler, TickOutcome};
use windwatch::weather::WeatherSupplier;
use windwatch::{ConditionStore, SlotKey, TrackingPolicy, WindWatchError};

/// Serves a scripted sequence of snapshots, one per tick
struct SequenceSupplier {
    snapshots: Mutex<VecDeque<WeatherSnapshot>>,
}

impl SequenceSupplier {
    fn new(snapshots: impl IntoIterator<Item = WeatherSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into_iter().collect()),
        }
    }
}

#[async_trait]
impl WeatherSupplier for SequenceSupplier {
    async fn fetch_snapshot(&self) -> windwatch::Result<WeatherSnapshot> {
        self.snapshots
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| WindWatchError::fetch("supplier exhausted"))
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Report>>,
}

// A shareable handle to a `RecordingSink`. The scheduler takes the sink by
// value, so the test wires in this clone while retaining the original for
// inspection. The trait is implemented on this local newtype rather than on
// `Arc<RecordingSink>` directly to satisfy the orphan rule from this crate.
#[derive(Clone)]
struct SharedSink(Arc<RecordingSink>);

#[async_trait]
impl AlertSink for SharedSink {
    async fn send(&self, report: &Report) -> windwatch::Result<()> {
        self.0.sent.lock().unwrap().push(report.clone());
        Ok(())
    }
}

fn config() -> WindWatchConfig {
    let mut config = WindWatchConfig::default();
    config.weather.postcode = "AB1 2CD".to_string();
    config.weather.site_url_base = "https://weather.example".to_string();
    config.alerts.maximum_wind_speed_kph = 30.0;
    config
}

fn current_only(speed: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        current: Some(WindReading::kph(speed, "NW")),
        days: Vec::new(),
    }
}

#[tokio::test]
async fn test_alert_then_silence_then_delta_realert() {
    let sink = Arc::new(RecordingSink::default());
    let scheduler = Scheduler::new(
        &config(),
        SequenceSupplier::new([
            current_only(35.0),
            current_only(35.0),
            current_only(40.0),
            current_only(28.0),
        ]),
        SharedSink(Arc::clone(&sink)),
    )
    .unwrap();

    // First sighting alerts with no change indicator
    assert_eq!(
        scheduler.tick().await.unwrap(),
        TickOutcome::Completed { reports_sent: 1 }
    );
    // Unchanged reading stays silent
    assert_eq!(
        scheduler.tick().await.unwrap(),
        TickOutcome::Completed { reports_sent: 0 }
    );
    // A move to 40 re-alerts and reports the delta
    assert_eq!(
        scheduler.tick().await.unwrap(),
        TickOutcome::Completed { reports_sent: 1 }
    );
    // Dropping back under the maximum alerts nobody
    assert_eq!(
        scheduler.tick().await.unwrap(),
        TickOutcome::Completed { reports_sent: 0 }
    );

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);

    assert!(sent[0].html.contains("35 kph from NW"));
    assert!(!sent[0].html.contains('\u{25b2}'));
    assert!(sent[0].high_priority);

    assert!(sent[1].html.contains("40 kph from NW"));
    assert!(sent[1].html.contains("(\u{25b2} 5 kph)"));
    assert!(sent[1].html.contains("https://weather.example/ab1"));
}

#[tokio::test]
async fn test_forecast_day_report_shape() {
    let date = NaiveDate::from_ymd_opt(2026, 1, 2);
    let snapshot = WeatherSnapshot {
        current: None,
        days: vec![
            ForecastDay {
                date,
                wind: Some(WindReading::kph(42.0, "WNW")),
                timeframes: vec![
                    ForecastTimeframe {
                        date,
                        time_label: "7am".to_string(),
                        wind: Some(WindReading::kph(31.0, "WNW")),
                    },
                    ForecastTimeframe {
                        date,
                        time_label: "4pm".to_string(),
                        wind: Some(WindReading::kph(18.0, "W")),
                    },
                ],
            },
            // A quiet second day produces no report
            ForecastDay {
                date: NaiveDate::from_ymd_opt(2026, 1, 3),
                wind: Some(WindReading::kph(12.0, "W")),
                timeframes: Vec::new(),
            },
        ],
    };

    let sink = Arc::new(RecordingSink::default());
    let scheduler = Scheduler::new(
        &config(),
        SequenceSupplier::new([snapshot]),
        SharedSink(Arc::clone(&sink)),
    )
    .unwrap();

    scheduler.tick().await.unwrap();

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);

    let report = &sent[0];
    assert!(report.subject.contains("Friday"));
    assert!(report.subject.contains("(Today)"));
    assert!(!report.high_priority);
    assert!(report.html.contains("Local Weather - AB1 2CD"));
    assert!(report.html.contains("<strong>42 kph from WNW</strong>"));
    assert!(report.html.contains("7am - 31 kph from WNW"));
    // Calm timeframes are not listed
    assert!(!report.html.contains("4pm"));
}

#[tokio::test]
async fn test_missing_slots_never_alert_or_error() {
    let snapshot = WeatherSnapshot {
        current: None,
        days: vec![ForecastDay {
            date: None,
            wind: None,
            timeframes: Vec::new(),
        }],
    };

    let sink = Arc::new(RecordingSink::default());
    let scheduler = Scheduler::new(
        &config(),
        SequenceSupplier::new([snapshot]),
        SharedSink(Arc::clone(&sink)),
    )
    .unwrap();

    assert_eq!(
        scheduler.tick().await.unwrap(),
        TickOutcome::Completed { reports_sent: 0 }
    );
    assert!(sink.sent.lock().unwrap().is_empty());
}

#[test]
fn test_store_lifecycle_across_a_date_rollover() {
    let jan2 = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    let jan3 = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();

    let mut store = ConditionStore::new(TrackingPolicy::LastValue, jan2);
    store.upsert(SlotKey::current(), 35.0);
    store.upsert(SlotKey::forecast_day(jan2), 40.0);
    store.upsert(SlotKey::forecast_day(jan3), 38.0);
    store.upsert(SlotKey::day_index(4), 22.0);

    assert!(store.maybe_reset(jan3));

    // Yesterday's slots are gone, tomorrow's history survives the night
    assert!(store.get(&SlotKey::current()).is_none());
    assert!(store.get(&SlotKey::forecast_day(jan2)).is_none());
    assert!(store.get(&SlotKey::forecast_day(jan3)).is_some());
    assert!(store.get(&SlotKey::day_index(4)).is_some());
}
