use std::collections::BTreeSet;

use tracing::{info, warn};

use fakelog_core::{Batch, Outcome};

use crate::model::{
    BatchProfile, CategoryDelta, CountChange, DistributionReport, Observation, ObservationLevel,
    PerOutcome, SetChange,
};

/// Profile a single batch.
pub fn profile(batch: &Batch) -> BatchProfile {
    let mut profile = BatchProfile::default();
    for record in batch {
        profile.rows += 1;
        *profile.outcome_counts.get_mut(record.outcome) += 1;
        *profile.priority_counts.get_mut(record.priority) += 1;
        profile.duration_sum += record.duration;
        profile.outcomes_observed.insert(record.outcome);
        profile.priorities_observed.insert(record.priority);
    }

    let rows = profile.rows;
    let counts = profile.outcome_counts;
    profile.outcome_percentages =
        PerOutcome::from_fn(|outcome| percentage(counts.get(outcome), rows));
    profile.duration_mean = if rows == 0 {
        0.0
    } else {
        profile.duration_sum / rows as f64
    };
    profile
}

/// Compare an old batch against a new one.
///
/// Never fails: empty batches profile to zeros, and categories observed on
/// either side are always reported.
pub fn compare(old: &Batch, new: &Batch) -> DistributionReport {
    let old = profile(old);
    let new = profile(new);

    let row_count_delta = new.rows as i64 - old.rows as i64;
    let outcome_set_change = SetChange::between(&old.outcomes_observed, &new.outcomes_observed);
    let priority_set_change =
        SetChange::between(&old.priorities_observed, &new.priorities_observed);

    let outcome_union: BTreeSet<_> = old
        .outcomes_observed
        .union(&new.outcomes_observed)
        .copied()
        .collect();
    let outcome_deltas: Vec<_> = outcome_union
        .into_iter()
        .map(|outcome| {
            category_delta(
                outcome,
                old.outcome_counts.get(outcome),
                new.outcome_counts.get(outcome),
            )
        })
        .collect();

    let priority_union: BTreeSet<_> = old
        .priorities_observed
        .union(&new.priorities_observed)
        .copied()
        .collect();
    let priority_deltas: Vec<_> = priority_union
        .into_iter()
        .map(|priority| {
            category_delta(
                priority,
                old.priority_counts.get(priority),
                new.priority_counts.get(priority),
            )
        })
        .collect();

    let percentage_deltas = PerOutcome::from_fn(|outcome| {
        new.outcome_percentages.get(outcome) - old.outcome_percentages.get(outcome)
    });

    let mut observations = vec![Observation::RowCount {
        old: old.rows,
        new: new.rows,
        delta: row_count_delta,
    }];
    if !outcome_set_change.is_empty() {
        observations.push(Observation::OutcomeSetChanged(outcome_set_change.clone()));
    }
    if !priority_set_change.is_empty() {
        observations.push(Observation::PrioritySetChanged(priority_set_change.clone()));
    }
    observations.push(Observation::FailureTrend {
        old: old.outcome_counts.get(Outcome::Failure),
        new: new.outcome_counts.get(Outcome::Failure),
    });
    observations.extend(outcome_deltas.iter().copied().map(Observation::OutcomeCount));

    DistributionReport {
        row_count_delta,
        duration_sum_delta: new.duration_sum - old.duration_sum,
        duration_mean_delta: new.duration_mean - old.duration_mean,
        percentage_deltas,
        outcome_set_change,
        priority_set_change,
        outcome_deltas,
        priority_deltas,
        observations,
        old,
        new,
    }
}

/// Emit one log event per observation at its level.
pub fn log_observations(report: &DistributionReport) {
    for observation in &report.observations {
        match observation.level() {
            ObservationLevel::Info => info!(event = "comparison", "{observation}"),
            ObservationLevel::Warning => warn!(event = "comparison", "{observation}"),
        }
    }
    info!(
        event = "comparison",
        old_duration_mean = report.old.duration_mean,
        new_duration_mean = report.new.duration_mean,
        old_duration_sum = report.old.duration_sum,
        new_duration_sum = report.new.duration_sum,
        "duration aggregates"
    );
}

fn percentage(count: u64, rows: u64) -> f64 {
    if rows == 0 {
        0.0
    } else {
        count as f64 / rows as f64 * 100.0
    }
}

fn category_delta<T>(category: T, old: u64, new: u64) -> CategoryDelta<T> {
    CategoryDelta {
        category,
        old,
        new,
        change: CountChange::between(old, new),
    }
}
