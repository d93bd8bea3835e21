//! Polling loop driving fetch, evaluate and report cycles
//!
//! One [`Scheduler`] instance owns the condition store for the lifetime of
//! the process. Every timer tick runs a full fetch-evaluate-report cycle
//! behind a single mutex, so at most one cycle is ever in flight; a tick
//! that fires while the previous one is still running is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::analysis::AlertEvaluator;
use crate::conditions::{ConditionStore, SLOT_DATE_FORMAT, SlotKey, TrackingPolicy};
use crate::config::WindWatchConfig;
use crate::email::AlertSink;
use crate::models::{ForecastDay, WeatherSnapshot};
use crate::report::{Report, ReportBuilder, TimeframeLine};
use crate::weather::WeatherSupplier;

/// What became of one timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A full cycle ran; carries the number of reports delivered
    Completed { reports_sent: usize },
    /// A previous tick still held the engine, so this one was dropped
    Skipped,
}

/// The polling engine: weather supplier in, alert emails out
pub struct Scheduler<S, K> {
    supplier: S,
    sink: K,
    evaluator: AlertEvaluator,
    reports: ReportBuilder,
    timezone: Tz,
    interval: Duration,
    state: Mutex<ConditionStore>,
}

impl<S: WeatherSupplier + 'static, K: AlertSink + 'static> Scheduler<S, K> {
    /// Build the engine from validated configuration.
    ///
    /// History uses last-value tracking: a reading that has not moved since
    /// the previous poll does not re-alert.
    pub fn new(config: &WindWatchConfig, supplier: S, sink: K) -> crate::Result<Self> {
        let timezone = config.scheduler.parsed_timezone()?;
        let today = Utc::now().with_timezone(&timezone).date_naive();

        Ok(Self {
            supplier,
            sink,
            evaluator: AlertEvaluator::new(config.alerts.maximum_wind_speed_kph),
            reports: ReportBuilder::new(
                config.weather.postcode.clone(),
                config.alerts.maximum_wind_speed_kph,
                config.weather.weather_url(),
            ),
            timezone,
            interval: Duration::from_secs(config.scheduler.interval_seconds),
            state: Mutex::new(ConditionStore::new(TrackingPolicy::LastValue, today)),
        })
    }

    /// Run the polling loop forever. The first tick fires immediately.
    pub async fn run(self: Arc<Self>) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_seconds = self.interval.as_secs(),
            "scheduler started"
        );

        loop {
            timer.tick().await;
            let engine = Arc::clone(&self);
            tokio::spawn(async move {
                match engine.tick().await {
                    Ok(TickOutcome::Completed { reports_sent }) => {
                        debug!(reports_sent, "tick complete");
                    }
                    Ok(TickOutcome::Skipped) => {}
                    Err(err) => error!("tick failed: {err}"),
                }
            });
        }
    }

    /// One full fetch-evaluate-report cycle.
    ///
    /// Returns [`TickOutcome::Skipped`] without doing any work when another
    /// tick already holds the engine.
    pub async fn tick(&self) -> crate::Result<TickOutcome> {
        let Ok(mut store) = self.state.try_lock() else {
            warn!("previous tick still in flight, skipping");
            return Ok(TickOutcome::Skipped);
        };

        // Fetch before touching the store so a failed poll leaves history intact
        let snapshot = self.supplier.fetch_snapshot().await?;

        let now = Utc::now().with_timezone(&self.timezone);
        if store.maybe_reset(now.date_naive()) {
            info!(date = %now.date_naive(), "new day, condition history reset");
        }

        let reports = self.evaluate_snapshot(&snapshot, &now, &mut store);

        let mut reports_sent = 0;
        for report in &reports {
            match self.sink.send(report).await {
                Ok(()) => reports_sent += 1,
                Err(err) => {
                    error!(subject = %report.subject, "failed to send alert: {err}");
                }
            }
        }

        Ok(TickOutcome::Completed { reports_sent })
    }

    fn evaluate_snapshot(
        &self,
        snapshot: &WeatherSnapshot,
        now: &DateTime<Tz>,
        store: &mut ConditionStore,
    ) -> Vec<Report> {
        let mut reports = Vec::new();

        let current =
            self.evaluator
                .evaluate(snapshot.current.as_ref(), SlotKey::current(), store);
        let time_label = now.format("%-I:%M%P").to_string();
        if let Some(report) = self.reports.current_conditions(&time_label, &current) {
            reports.push(report);
        }

        for (index, day) in snapshot.days.iter().enumerate() {
            if let Some(report) = self.evaluate_forecast_day(day, index, store) {
                reports.push(report);
            }
        }

        reports
    }

    fn evaluate_forecast_day(
        &self,
        day: &ForecastDay,
        index: usize,
        store: &mut ConditionStore,
    ) -> Option<Report> {
        let key = day
            .date
            .map_or_else(|| SlotKey::day_index(index), SlotKey::forecast_day);
        let decision = self.evaluator.evaluate(day.wind.as_ref(), key.clone(), store);
        if !decision.should_alert {
            return None;
        }

        // Only timeframes already at or over the maximum get a nested line
        // and a history entry of their own
        let maximum = self.evaluator.maximum_wind_speed();
        let timeframes: Vec<TimeframeLine> = day
            .timeframes
            .iter()
            .filter(|timeframe| {
                timeframe
                    .wind
                    .as_ref()
                    .is_some_and(|wind| wind.speed >= maximum)
            })
            .map(|timeframe| {
                let timeframe_key = timeframe.date.map_or_else(
                    || SlotKey::within(&key, &timeframe.time_label),
                    |date| SlotKey::timeframe(date, &timeframe.time_label),
                );
                TimeframeLine {
                    time_label: timeframe.time_label.clone(),
                    decision: self.evaluator.evaluate(
                        timeframe.wind.as_ref(),
                        timeframe_key,
                        store,
                    ),
                }
            })
            .collect();

        let (day_of_week, date_label) = day_labels(day, index, &key);
        let day_label = if index == 0 {
            "Today".to_string()
        } else {
            date_label.clone()
        };

        self.reports
            .forecast_day(&day_of_week, &day_label, &date_label, &decision, &timeframes)
    }
}

/// Weekday name and date line label for a forecast day; synthetic labels
/// when the upstream supplied no date
fn day_labels(day: &ForecastDay, index: usize, key: &SlotKey) -> (String, String) {
    match day.date {
        Some(date) => (
            date.format("%A").to_string(),
            date.format(SLOT_DATE_FORMAT).to_string(),
        ),
        None => (format!("Day {index}"), key.as_str().to_string()),
    }
}
