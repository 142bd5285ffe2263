use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use fakelog_core::{DEFAULT_MAX_ROWS, Outcome, Priority};

/// Default length of the timestamp window.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Bounded retry policy for batch construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Options for the generation engine.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Records requested per batch.
    pub count: usize,
    /// Hard cap on batch length.
    pub max_rows: usize,
    /// Start of the timestamp window.
    pub window_start: NaiveDateTime,
    /// Length of the timestamp window.
    pub window_length: TimeDelta,
    pub outcomes: Vec<Outcome>,
    pub priorities: Vec<Priority>,
    /// Probability mass assigned to `success`; the rest is split evenly.
    pub success_weight: Option<f64>,
    /// Explicit per-outcome weights. Mutually exclusive with `success_weight`.
    pub outcome_weights: Option<BTreeMap<Outcome, f64>>,
    pub retry: RetryPolicy,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_MAX_ROWS,
            max_rows: DEFAULT_MAX_ROWS,
            window_start: default_window_start(),
            window_length: TimeDelta::days(DEFAULT_WINDOW_DAYS),
            outcomes: Outcome::ALL.to_vec(),
            priorities: Priority::ALL.to_vec(),
            success_weight: None,
            outcome_weights: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// `2025-01-01 08:00:00`.
pub fn default_window_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .unwrap_or_default()
}
