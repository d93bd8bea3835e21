//! Per-slot wind condition history and the daily reset rule
//!
//! The [`ConditionStore`] is the stateful heart of the service: it remembers
//! what wind speed was last observed for every trackable slot (current
//! conditions, each forecast day, each intraday timeframe) so the evaluator
//! can report a meaningful delta instead of re-alerting on every poll.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Date format used inside slot keys, matching the Weather Unlocked forecast
pub const SLOT_DATE_FORMAT: &str = "%d/%m/%Y";

const CURRENT_SLOT: &str = "current";

/// Stable identifier for one trackable observation point.
///
/// Keys must be stable across polls within the same reporting period so
/// history lookups succeed, and distinct slots must never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey(String);

impl SlotKey {
    /// The current-conditions slot
    #[must_use]
    pub fn current() -> Self {
        Self(CURRENT_SLOT.to_string())
    }

    /// A forecast day keyed by its calendar date
    #[must_use]
    pub fn forecast_day(date: NaiveDate) -> Self {
        Self(date.format(SLOT_DATE_FORMAT).to_string())
    }

    /// An intraday timeframe keyed by its own date plus a time label
    #[must_use]
    pub fn timeframe(date: NaiveDate, time_label: &str) -> Self {
        Self(format!(
            "{} {}",
            date.format(SLOT_DATE_FORMAT),
            time_label
        ))
    }

    /// A timeframe nested under a parent slot that has no date of its own
    #[must_use]
    pub fn within(parent: &SlotKey, time_label: &str) -> Self {
        Self(format!("{} {}", parent.0, time_label))
    }

    /// Synthetic key for a daytime entry the upstream supplied without a date
    #[must_use]
    pub fn day_index(index: usize) -> Self {
        Self(format!("day{index}"))
    }

    /// Synthetic key for a nighttime entry the upstream supplied without a date
    #[must_use]
    pub fn night_index(index: usize) -> Self {
        Self(format!("night{index}"))
    }

    /// Whether this is the current-conditions slot
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.0 == CURRENT_SLOT
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Date component used by the reset pruning rule.
    ///
    /// Returns `None` for the current slot and for synthetic index keys;
    /// those are exempt from date comparison and survive every reset check.
    fn slot_date(&self) -> Option<NaiveDate> {
        let prefix = self.0.get(..10)?;
        NaiveDate::parse_from_str(prefix, SLOT_DATE_FORMAT).ok()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How per-slot history is kept between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPolicy {
    /// Keep a widening high/low envelope; deltas are measured against the
    /// bound the new reading crossed
    Envelope,
    /// Keep only the previous reading; deltas are new minus previous
    LastValue,
}

/// Recorded history for one slot
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedCondition {
    /// High/low envelope seeded from the first observation and widened since
    Envelope { high: f64, low: f64 },
    /// The most recent observed speed
    LastValue { speed: f64 },
}

impl TrackedCondition {
    fn seed(policy: TrackingPolicy, speed: f64) -> Self {
        match policy {
            TrackingPolicy::Envelope => Self::Envelope {
                high: speed,
                low: speed,
            },
            TrackingPolicy::LastValue => Self::LastValue { speed },
        }
    }

    fn observe(&mut self, speed: f64) -> Observation {
        match self {
            Self::Envelope { high, low } => {
                if speed > *high {
                    let change = speed - *high;
                    *high = speed;
                    Observation::Changed(change)
                } else if speed < *low {
                    let change = speed - *low;
                    *low = speed;
                    Observation::Changed(change)
                } else {
                    Observation::Unchanged
                }
            }
            Self::LastValue { speed: last } => {
                if speed == *last {
                    Observation::Unchanged
                } else {
                    let change = speed - *last;
                    *last = speed;
                    Observation::Changed(change)
                }
            }
        }
    }
}

/// Result of folding one reading into a slot's history
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// First reading for this slot since the last reset
    First,
    /// The reading moved the stored history; carries the signed delta
    Changed(f64),
    /// The reading sits inside the stored history
    Unchanged,
}

/// Mapping from [`SlotKey`] to tracked history, plus the reference execution
/// date the daily reset is evaluated against.
///
/// Invariant: a key exists iff at least one reading for that slot has been
/// observed since the last reset.
#[derive(Debug)]
pub struct ConditionStore {
    policy: TrackingPolicy,
    execution_date: NaiveDate,
    conditions: HashMap<SlotKey, TrackedCondition>,
}

impl ConditionStore {
    /// Create an empty store referenced to `today`
    #[must_use]
    pub fn new(policy: TrackingPolicy, today: NaiveDate) -> Self {
        Self {
            policy,
            execution_date: today,
            conditions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> TrackingPolicy {
        self.policy
    }

    /// The date recorded at the previous reset or construction
    #[must_use]
    pub fn execution_date(&self) -> NaiveDate {
        self.execution_date
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Lookup without side effects
    #[must_use]
    pub fn get(&self, key: &SlotKey) -> Option<&TrackedCondition> {
        self.conditions.get(key)
    }

    /// Run the daily reset if the wall-clock date has rolled over.
    ///
    /// Returns whether a reset happened.
    pub fn maybe_reset(&mut self, today: NaiveDate) -> bool {
        if today == self.execution_date {
            return false;
        }
        self.reset(today);
        true
    }

    /// Remove the current-conditions entry plus every entry whose slot date
    /// is strictly before `as_of`, and record `as_of` as the new reference
    /// date. Keys that carry no parseable date are retained.
    pub fn reset(&mut self, as_of: NaiveDate) {
        self.execution_date = as_of;
        self.conditions.retain(|key, _| {
            if key.is_current() {
                return false;
            }
            match key.slot_date() {
                Some(date) => date >= as_of,
                None => true,
            }
        });
    }

    /// Fold one observed speed into the slot's history.
    ///
    /// An absent key seeds fresh history and reports
    /// [`Observation::First`]; an existing key updates per the store policy.
    pub fn upsert(&mut self, key: SlotKey, speed: f64) -> Observation {
        match self.conditions.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(TrackedCondition::seed(self.policy, speed));
                Observation::First
            }
            Entry::Occupied(mut entry) => entry.get_mut().observe(speed),
        }
    }
}
