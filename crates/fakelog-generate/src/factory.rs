use std::collections::HashSet;
use std::hash::Hash;

use chrono::{NaiveDateTime, TimeDelta};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, RngCore};

use fakelog_core::{DURATION_MAX, DURATION_MIN, Outcome, Priority, Record};

use crate::errors::GenerationError;
use crate::weights::OutcomeWeights;

/// Anything that can produce records one at a time.
///
/// Batch construction is generic over this seam so retry behavior can be
/// exercised with sources that fail on purpose.
pub trait RecordSource {
    fn next_record(&mut self, rng: &mut dyn RngCore) -> Result<Record, GenerationError>;
}

/// Stateless record producer over a validated time window and vocabularies.
#[derive(Debug, Clone)]
pub struct RecordFactory {
    window_start: NaiveDateTime,
    window_secs: i64,
    outcomes: Vec<Outcome>,
    priorities: Vec<Priority>,
    outcome_index: Option<WeightedIndex<f64>>,
}

impl RecordFactory {
    pub fn new(
        window_start: NaiveDateTime,
        window_length: TimeDelta,
        outcomes: &[Outcome],
        priorities: &[Priority],
        weights: Option<&OutcomeWeights>,
    ) -> Result<Self, GenerationError> {
        validate_vocabulary("outcome", outcomes)?;
        validate_vocabulary("priority", priorities)?;

        let window_secs = window_length.num_seconds();
        if window_secs < 0 {
            return Err(GenerationError::InvalidConfiguration(format!(
                "window length must not be negative, got {window_secs}s"
            )));
        }
        if window_start.checked_add_signed(window_length).is_none() {
            return Err(GenerationError::InvalidConfiguration(
                "timestamp window overflows the calendar".to_string(),
            ));
        }

        let outcome_index = match weights {
            Some(weights) => {
                let aligned = weights.aligned(outcomes)?;
                let index = WeightedIndex::new(aligned).map_err(|err| {
                    GenerationError::InvalidConfiguration(format!("outcome weights: {err}"))
                })?;
                Some(index)
            }
            None => None,
        };

        Ok(Self {
            window_start,
            window_secs,
            outcomes: outcomes.to_vec(),
            priorities: priorities.to_vec(),
            outcome_index,
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Record {
        let offset = rng.random_range(0..=self.window_secs);
        let timestamp = self.window_start + TimeDelta::seconds(offset);
        let duration = round_duration(rng.random_range(DURATION_MIN..=DURATION_MAX));
        let outcome = match &self.outcome_index {
            Some(index) => self.outcomes[index.sample(rng)],
            None => self.outcomes[rng.random_range(0..self.outcomes.len())],
        };
        let priority = self.priorities[rng.random_range(0..self.priorities.len())];

        Record {
            timestamp,
            duration,
            outcome,
            priority,
        }
    }
}

impl RecordSource for RecordFactory {
    fn next_record(&mut self, rng: &mut dyn RngCore) -> Result<Record, GenerationError> {
        Ok(self.generate(rng))
    }
}

/// Round a duration to two decimal places.
pub fn round_duration(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate_vocabulary<T: Copy + Eq + Hash + std::fmt::Display>(
    kind: &str,
    vocabulary: &[T],
) -> Result<(), GenerationError> {
    if vocabulary.is_empty() {
        return Err(GenerationError::InvalidConfiguration(format!(
            "{kind} vocabulary must not be empty"
        )));
    }
    let mut seen = HashSet::new();
    for value in vocabulary {
        if !seen.insert(*value) {
            return Err(GenerationError::InvalidConfiguration(format!(
                "{kind} vocabulary lists '{value}' more than once"
            )));
        }
    }
    Ok(())
}
