use std::collections::BTreeMap;

use fakelog_core::Outcome;

use crate::errors::GenerationError;

/// Non-negative weights over outcome categories.
///
/// Weights need not sum to one; sampling normalizes them.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeWeights {
    weights: BTreeMap<Outcome, f64>,
}

impl OutcomeWeights {
    pub fn new(
        weights: impl IntoIterator<Item = (Outcome, f64)>,
    ) -> Result<Self, GenerationError> {
        let mut map = BTreeMap::new();
        for (outcome, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GenerationError::InvalidConfiguration(format!(
                    "weight for '{outcome}' must be a non-negative number, got {weight}"
                )));
            }
            if map.insert(outcome, weight).is_some() {
                return Err(GenerationError::InvalidConfiguration(format!(
                    "duplicate weight for '{outcome}'"
                )));
            }
        }
        Ok(Self { weights: map })
    }

    /// Assign `success_weight` to `success` and split the remaining mass
    /// equally across the other outcomes of `vocabulary`.
    pub fn success_biased(
        success_weight: f64,
        vocabulary: &[Outcome],
    ) -> Result<Self, GenerationError> {
        if !(0.0..=1.0).contains(&success_weight) {
            return Err(GenerationError::InvalidConfiguration(format!(
                "success_weight must be within [0.0, 1.0], got {success_weight}"
            )));
        }
        if !vocabulary.contains(&Outcome::Success) {
            return Err(GenerationError::InvalidConfiguration(
                "success_weight requires 'success' in the outcome vocabulary".to_string(),
            ));
        }
        let others = vocabulary
            .iter()
            .filter(|outcome| **outcome != Outcome::Success)
            .count();
        let share = if others == 0 {
            0.0
        } else {
            (1.0 - success_weight) / others as f64
        };
        Self::new(vocabulary.iter().map(|outcome| {
            let weight = if *outcome == Outcome::Success {
                success_weight
            } else {
                share
            };
            (*outcome, weight)
        }))
    }

    pub fn get(&self, outcome: Outcome) -> Option<f64> {
        self.weights.get(&outcome).copied()
    }

    /// Weights in `vocabulary` order. Fails when the weights do not cover
    /// exactly the vocabulary, or when every weight is zero.
    pub fn aligned(&self, vocabulary: &[Outcome]) -> Result<Vec<f64>, GenerationError> {
        if self.weights.len() != vocabulary.len() {
            return Err(GenerationError::InvalidConfiguration(format!(
                "expected {} outcome weight(s), got {}",
                vocabulary.len(),
                self.weights.len()
            )));
        }
        let aligned = vocabulary
            .iter()
            .map(|outcome| {
                self.get(*outcome).ok_or_else(|| {
                    GenerationError::InvalidConfiguration(format!(
                        "missing weight for outcome '{outcome}'"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if aligned.iter().all(|weight| *weight == 0.0) {
            return Err(GenerationError::InvalidConfiguration(
                "outcome weights must not all be zero".to_string(),
            ));
        }
        Ok(aligned)
    }
}
