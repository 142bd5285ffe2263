use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use fakelog_core::{Outcome, Priority};

/// One value per outcome category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerOutcome<T> {
    pub failure: T,
    pub timeout: T,
    pub cancelled: T,
    pub success: T,
}

impl<T: Copy> PerOutcome<T> {
    pub fn from_fn(mut f: impl FnMut(Outcome) -> T) -> Self {
        Self {
            failure: f(Outcome::Failure),
            timeout: f(Outcome::Timeout),
            cancelled: f(Outcome::Cancelled),
            success: f(Outcome::Success),
        }
    }

    pub fn get(&self, outcome: Outcome) -> T {
        match outcome {
            Outcome::Failure => self.failure,
            Outcome::Timeout => self.timeout,
            Outcome::Cancelled => self.cancelled,
            Outcome::Success => self.success,
        }
    }

    pub fn get_mut(&mut self, outcome: Outcome) -> &mut T {
        match outcome {
            Outcome::Failure => &mut self.failure,
            Outcome::Timeout => &mut self.timeout,
            Outcome::Cancelled => &mut self.cancelled,
            Outcome::Success => &mut self.success,
        }
    }

    /// Values in report order: failure, timeout, cancelled, success.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, T)> + '_ {
        Outcome::REPORT_ORDER
            .into_iter()
            .map(move |outcome| (outcome, self.get(outcome)))
    }
}

/// One value per priority category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerPriority<T> {
    pub low: T,
    pub medium: T,
    pub high: T,
    pub critical: T,
}

impl<T: Copy> PerPriority<T> {
    pub fn get(&self, priority: Priority) -> T {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Critical => self.critical,
        }
    }

    pub fn get_mut(&mut self, priority: Priority) -> &mut T {
        match priority {
            Priority::Low => &mut self.low,
            Priority::Medium => &mut self.medium,
            Priority::High => &mut self.high,
            Priority::Critical => &mut self.critical,
        }
    }
}

/// Summary statistics of a single batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchProfile {
    pub rows: u64,
    pub outcome_counts: PerOutcome<u64>,
    /// Percent of rows per outcome (0-100); all zero for an empty batch.
    pub outcome_percentages: PerOutcome<f64>,
    pub priority_counts: PerPriority<u64>,
    pub duration_sum: f64,
    /// Zero for an empty batch.
    pub duration_mean: f64,
    pub outcomes_observed: BTreeSet<Outcome>,
    pub priorities_observed: BTreeSet<Priority>,
}

/// Categories observed on only one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetChange<T: Ord> {
    /// Present in the new batch only.
    pub added: BTreeSet<T>,
    /// Present in the old batch only.
    pub removed: BTreeSet<T>,
}

impl<T: Ord + Copy> SetChange<T> {
    pub fn between(old: &BTreeSet<T>, new: &BTreeSet<T>) -> Self {
        Self {
            added: new.difference(old).copied().collect(),
            removed: old.difference(new).copied().collect(),
        }
    }

    /// Union minus intersection.
    pub fn symmetric(&self) -> BTreeSet<T> {
        self.added.union(&self.removed).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Signed change of a count between two batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountChange {
    Unchanged,
    Changed(i64),
}

impl CountChange {
    pub fn between(old: u64, new: u64) -> Self {
        let delta = new as i64 - old as i64;
        if delta == 0 {
            CountChange::Unchanged
        } else {
            CountChange::Changed(delta)
        }
    }
}

impl fmt::Display for CountChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountChange::Unchanged => f.write_str("unchanged"),
            CountChange::Changed(delta) => write!(f, "{delta:+}"),
        }
    }
}

/// Per-category count comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryDelta<T> {
    pub category: T,
    pub old: u64,
    pub new: u64,
    pub change: CountChange,
}

/// Severity of a narrative observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationLevel {
    Info,
    Warning,
}

/// One human-readable finding of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    RowCount { old: u64, new: u64, delta: i64 },
    OutcomeSetChanged(SetChange<Outcome>),
    PrioritySetChanged(SetChange<Priority>),
    FailureTrend { old: u64, new: u64 },
    OutcomeCount(CategoryDelta<Outcome>),
}

impl Observation {
    pub fn level(&self) -> ObservationLevel {
        match self {
            Observation::OutcomeSetChanged(_) | Observation::PrioritySetChanged(_) => {
                ObservationLevel::Warning
            }
            Observation::FailureTrend { old, new } if new > old => ObservationLevel::Warning,
            _ => ObservationLevel::Info,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::RowCount { old, new, delta } => match delta.signum() {
                1 => write!(f, "row count increased from {old} to {new} ({delta:+})"),
                -1 => write!(f, "row count decreased from {old} to {new} ({delta:+})"),
                _ => write!(f, "row count unchanged at {new}"),
            },
            Observation::OutcomeSetChanged(change) => {
                write!(f, "outcome categories changed: ")?;
                write_set_change(f, change)
            }
            Observation::PrioritySetChanged(change) => {
                write!(f, "priority categories changed: ")?;
                write_set_change(f, change)
            }
            Observation::FailureTrend { old, new } => {
                if new > old {
                    write!(f, "failure count increased from {old} to {new}")
                } else if new < old {
                    write!(f, "failure count decreased from {old} to {new}")
                } else {
                    write!(f, "failure count unchanged at {new}")
                }
            }
            Observation::OutcomeCount(delta) => match delta.change {
                CountChange::Unchanged => {
                    write!(f, "{}: unchanged ({})", delta.category, delta.new)
                }
                CountChange::Changed(change) if change > 0 => write!(
                    f,
                    "{}: over by {} ({} -> {})",
                    delta.category, change, delta.old, delta.new
                ),
                CountChange::Changed(change) => write!(
                    f,
                    "{}: under by {} ({} -> {})",
                    delta.category,
                    change.unsigned_abs(),
                    delta.old,
                    delta.new
                ),
            },
        }
    }
}

fn write_set_change<T: Ord + fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    change: &SetChange<T>,
) -> fmt::Result {
    let join = |set: &BTreeSet<T>| {
        set.iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    write!(
        f,
        "added [{}], removed [{}]",
        join(&change.added),
        join(&change.removed)
    )
}

/// Typed result of comparing an old batch against a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub old: BatchProfile,
    pub new: BatchProfile,
    /// `new.rows - old.rows`.
    pub row_count_delta: i64,
    pub duration_sum_delta: f64,
    pub duration_mean_delta: f64,
    /// Percentage points, `new - old`, per outcome.
    pub percentage_deltas: PerOutcome<f64>,
    pub outcome_set_change: SetChange<Outcome>,
    pub priority_set_change: SetChange<Priority>,
    /// One entry per outcome observed in either batch, in report order.
    pub outcome_deltas: Vec<CategoryDelta<Outcome>>,
    /// One entry per priority observed in either batch.
    pub priority_deltas: Vec<CategoryDelta<Priority>>,
    pub observations: Vec<Observation>,
}
