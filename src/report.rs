//! HTML alert report assembly
//!
//! Turns per-slot [`AlertDecision`]s into the email reports the service
//! sends: one report for current conditions, one per forecast day. A scope
//! that contains no alerting decision produces no report at all.

use crate::analysis::AlertDecision;
use crate::models::WindReading;

/// Subject prefix shared by every alert email
pub const ALERT_SUBJECT: &str = "\u{27b9} Wind Speed Notifications";

/// A fully rendered alert email for one reporting scope
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub subject: String,
    pub html: String,
    /// Current-conditions alerts are flagged urgent for mail clients
    pub high_priority: bool,
}

/// One nested timeframe line inside a forecast-day report.
///
/// Callers pass only timeframes whose raw speed meets the maximum; the line
/// is rendered whether or not the timeframe's own decision alerts.
#[derive(Debug, Clone)]
pub struct TimeframeLine {
    pub time_label: String,
    pub decision: AlertDecision,
}

/// Builds alert reports for a single configured location
pub struct ReportBuilder {
    postcode: String,
    maximum_wind_speed: f64,
    weather_url: String,
}

impl ReportBuilder {
    #[must_use]
    pub fn new(
        postcode: impl Into<String>,
        maximum_wind_speed: f64,
        weather_url: impl Into<String>,
    ) -> Self {
        Self {
            postcode: postcode.into(),
            maximum_wind_speed,
            weather_url: weather_url.into(),
        }
    }

    /// Report for the current-conditions scope, `None` unless it alerts
    #[must_use]
    pub fn current_conditions(
        &self,
        time_label: &str,
        decision: &AlertDecision,
    ) -> Option<Report> {
        if !decision.should_alert {
            return None;
        }
        let reading = decision.reading.as_ref()?;

        let mut html = self.header();
        html.push_str(&format!(
            "The current wind conditions exceed the stated maximum ({} kph):",
            format_speed(self.maximum_wind_speed)
        ));
        html.push_str(&format!(
            "<br />&nbsp; - {} - {}{}",
            time_label,
            format_conditions(reading, true),
            change_indicator(decision.change, &reading.unit)
        ));
        html.push_str(&self.footer());

        Some(Report {
            subject: format!("{ALERT_SUBJECT} - Alert"),
            html,
            high_priority: true,
        })
    }

    /// Report for one forecast day, `None` unless the day-level decision
    /// alerts. Timeframe lines are nested plain under the emboldened day
    /// line.
    #[must_use]
    pub fn forecast_day(
        &self,
        day_of_week: &str,
        day_label: &str,
        date_label: &str,
        decision: &AlertDecision,
        timeframes: &[TimeframeLine],
    ) -> Option<Report> {
        if !decision.should_alert {
            return None;
        }
        let reading = decision.reading.as_ref()?;

        let mut html = self.header();
        html.push_str(&format!(
            "The forecasted wind conditions for {} exceed the stated maximum ({} kph): ",
            day_of_week,
            format_speed(self.maximum_wind_speed)
        ));
        html.push_str(&format!(
            "<br /> &nbsp;- {} - {}{}",
            date_label,
            format_conditions(reading, true),
            change_indicator(decision.change, &reading.unit)
        ));
        for timeframe in timeframes {
            let Some(reading) = timeframe.decision.reading.as_ref() else {
                continue;
            };
            html.push_str(&format!(
                "<br />&nbsp;&nbsp;&nbsp; - {} - {}{}",
                timeframe.time_label,
                format_conditions(reading, false),
                change_indicator(timeframe.decision.change, &reading.unit)
            ));
        }
        html.push_str(&self.footer());

        Some(Report {
            subject: format!("{ALERT_SUBJECT} - {day_of_week} ({day_label})"),
            html,
            high_priority: false,
        })
    }

    fn header(&self) -> String {
        format!("<div><h3>Local Weather - {}</h3></div>", self.postcode)
    }

    fn footer(&self) -> String {
        format!(
            "<br /><br /><a href=\"{url}\">{url}</a>",
            url = self.weather_url
        )
    }
}

/// `35 kph from NW`, emboldened for primary lines
fn format_conditions(reading: &WindReading, embolden: bool) -> String {
    let body = format!(
        "{} {} from {}",
        format_speed(reading.speed),
        reading.unit,
        reading.direction
    );
    if embolden {
        format!("<strong>{body}</strong>")
    } else {
        body
    }
}

/// ` (▲ 5 kph)` / ` (▼ 10 kph)`, empty when nothing changed
fn change_indicator(change: f64, unit: &str) -> String {
    if change == 0.0 {
        return String::new();
    }
    let arrow = if change < 0.0 { "\u{25bc}" } else { "\u{25b2}" };
    format!(" ({} {} {})", arrow, format_speed(change.abs()), unit)
}

/// Render a speed without a trailing `.0` for whole numbers
fn format_speed(speed: f64) -> String {
    if speed.fract() == 0.0 {
        format!("{speed:.0}")
    } else {
        format!("{speed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alerting_decision(speed: f64, change: f64) -> AlertDecision {
        AlertDecision {
            should_alert: true,
            change,
            reading: Some(WindReading::kph(speed, "NW")),
        }
    }

    fn builder() -> ReportBuilder {
        ReportBuilder::new("AB1 2CD", 30.0, "https://weather.example/ab1")
    }

    #[test]
    fn test_current_conditions_line_format() {
        let report = builder()
            .current_conditions("7:05am", &alerting_decision(35.0, 5.0))
            .unwrap();

        assert!(report.html.contains("35 kph from NW"));
        assert!(report.html.contains("(\u{25b2} 5 kph)"));
        assert!(report.html.contains("7:05am"));
        assert!(report.html.contains("Local Weather - AB1 2CD"));
        assert!(report.html.contains("https://weather.example/ab1"));
        assert_eq!(report.subject, format!("{ALERT_SUBJECT} - Alert"));
        assert!(report.high_priority);
    }

    #[test]
    fn test_zero_change_omits_parenthetical() {
        let report = builder()
            .current_conditions("7:05am", &alerting_decision(35.0, 0.0))
            .unwrap();
        assert!(!report.html.contains('\u{25b2}'));
        assert!(!report.html.contains('\u{25bc}'));
        assert!(report.html.contains("<strong>35 kph from NW</strong><br />"));
    }

    #[test]
    fn test_quiet_scope_produces_no_report() {
        let decision = AlertDecision {
            should_alert: false,
            change: 0.0,
            reading: Some(WindReading::kph(10.0, "N")),
        };
        assert!(builder().current_conditions("7:05am", &decision).is_none());
        assert!(
            builder()
                .forecast_day("Friday", "Today", "02/01/2026", &decision, &[])
                .is_none()
        );
    }

    #[test]
    fn test_forecast_day_nests_timeframe_lines() {
        let timeframes = vec![
            TimeframeLine {
                time_label: "7am".to_string(),
                decision: alerting_decision(32.0, -2.0),
            },
            TimeframeLine {
                time_label: "10am".to_string(),
                decision: AlertDecision {
                    should_alert: false,
                    change: 0.0,
                    reading: Some(WindReading::kph(30.0, "W")),
                },
            },
        ];
        let report = builder()
            .forecast_day(
                "Friday",
                "02/01/2026",
                "02/01/2026",
                &alerting_decision(36.0, 4.0),
                &timeframes,
            )
            .unwrap();

        assert!(report.html.contains("<strong>36 kph from NW</strong>"));
        assert!(report.html.contains("7am - 32 kph from NW (\u{25bc} 2 kph)"));
        // Non-alerting timeframe lines still render, without emboldening
        assert!(report.html.contains("10am - 30 kph from W"));
        assert_eq!(
            report.subject,
            format!("{ALERT_SUBJECT} - Friday (02/01/2026)")
        );
        assert!(!report.high_priority);
    }

    #[rstest]
    #[case(5.0, " (\u{25b2} 5 kph)")]
    #[case(-10.0, " (\u{25bc} 10 kph)")]
    #[case(0.0, "")]
    #[case(2.5, " (\u{25b2} 2.5 kph)")]
    fn test_change_indicator(#[case] change: f64, #[case] expected: &str) {
        assert_eq!(change_indicator(change, "kph"), expected);
    }

    #[test]
    fn test_format_speed_trims_whole_numbers() {
        assert_eq!(format_speed(35.0), "35");
        assert_eq!(format_speed(30.6), "30.6");
    }
}
