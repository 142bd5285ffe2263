use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use fakelog_core::Batch;

use crate::errors::GenerationError;
use crate::factory::{RecordFactory, RecordSource};
use crate::model::{GenerateOptions, RetryPolicy};
use crate::weights::OutcomeWeights;

/// Build the random source for a run; a fixed seed reproduces batches exactly.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

enum AttemptState {
    Attempting(u32),
    Succeeded(Batch),
    Terminal(GenerationError),
}

/// Runs whole-batch construction under a bounded retry policy.
///
/// The pause between attempts goes through `sleep`, so callers can swap the
/// real thread sleep for a recorder.
pub struct BatchGenerator<S = fn(Duration)> {
    policy: RetryPolicy,
    max_rows: usize,
    sleep: S,
}

impl BatchGenerator<fn(Duration)> {
    pub fn new(policy: RetryPolicy, max_rows: usize) -> Self {
        Self::with_sleep(policy, max_rows, std::thread::sleep as fn(Duration))
    }
}

impl<S: FnMut(Duration)> BatchGenerator<S> {
    pub fn with_sleep(policy: RetryPolicy, max_rows: usize, sleep: S) -> Self {
        Self {
            policy,
            max_rows,
            sleep,
        }
    }

    /// Produce `count` records, ordered by timestamp and capped at
    /// `min(count, max_rows)`.
    ///
    /// Any failure inside an attempt discards the partial batch and starts
    /// over. Configuration errors are returned immediately; any other error
    /// that survives every attempt is wrapped in [`GenerationError::Terminal`].
    pub fn generate<R: RecordSource + ?Sized>(
        &mut self,
        source: &mut R,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Batch, GenerationError> {
        if self.policy.max_attempts == 0 {
            return Err(GenerationError::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let mut state = AttemptState::Attempting(1);
        loop {
            state = match state {
                AttemptState::Attempting(attempt) => match self.attempt(source, count, rng) {
                    Ok(batch) => {
                        if attempt > 1 {
                            info!(attempt, rows = batch.len(), "batch generated after retry");
                        }
                        AttemptState::Succeeded(batch)
                    }
                    Err(err @ GenerationError::InvalidConfiguration(_)) => return Err(err),
                    Err(err) if attempt >= self.policy.max_attempts => {
                        AttemptState::Terminal(GenerationError::Terminal {
                            attempts: attempt,
                            source: Box::new(err),
                        })
                    }
                    Err(err) => {
                        warn!(
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            delay_ms = self.policy.retry_delay.as_millis() as u64,
                            error = %err,
                            "batch attempt failed; retrying"
                        );
                        (self.sleep)(self.policy.retry_delay);
                        AttemptState::Attempting(attempt + 1)
                    }
                },
                AttemptState::Succeeded(batch) => return Ok(batch),
                AttemptState::Terminal(err) => {
                    if let GenerationError::Terminal { attempts, source } = &err {
                        error!(
                            severity = "critical",
                            attempts = *attempts,
                            error = %source,
                            "batch generation exhausted retries"
                        );
                    }
                    return Err(err);
                }
            };
        }
    }

    fn attempt<R: RecordSource + ?Sized>(
        &mut self,
        source: &mut R,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Batch, GenerationError> {
        let mut records = Vec::with_capacity(count.min(self.max_rows));
        for _ in 0..count {
            records.push(source.next_record(rng)?);
        }
        Ok(Batch::from_records(records, count.min(self.max_rows)))
    }
}

/// Entry point for generating a batch from [`GenerateOptions`].
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Validate the options and build the record factory they describe.
    pub fn factory(&self) -> Result<RecordFactory, GenerationError> {
        let weights = resolve_weights(&self.options)?;
        RecordFactory::new(
            self.options.window_start,
            self.options.window_length,
            &self.options.outcomes,
            &self.options.priorities,
            weights.as_ref(),
        )
    }

    pub fn run(&self, rng: &mut dyn RngCore) -> Result<Batch, GenerationError> {
        self.run_with_sleep(rng, std::thread::sleep)
    }

    pub fn run_with_sleep(
        &self,
        rng: &mut dyn RngCore,
        sleep: impl FnMut(Duration),
    ) -> Result<Batch, GenerationError> {
        let mut factory = self.factory()?;
        self.run_source(&mut factory, rng, sleep)
    }

    /// Run the retry policy over a caller-supplied record source.
    ///
    /// The source replaces the factory built from the options; count, row cap
    /// and retry policy still come from the options.
    pub fn run_source<R: RecordSource + ?Sized>(
        &self,
        source: &mut R,
        rng: &mut dyn RngCore,
        sleep: impl FnMut(Duration),
    ) -> Result<Batch, GenerationError> {
        let start = Instant::now();
        info!(
            rows = self.options.count,
            window_start = %self.options.window_start,
            success_weight = self.options.success_weight,
            "generation started"
        );

        let mut generator =
            BatchGenerator::with_sleep(self.options.retry, self.options.max_rows, sleep);
        let batch = generator.generate(source, self.options.count, rng)?;

        info!(
            rows = batch.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );
        Ok(batch)
    }
}

fn resolve_weights(options: &GenerateOptions) -> Result<Option<OutcomeWeights>, GenerationError> {
    match (options.success_weight, &options.outcome_weights) {
        (Some(_), Some(_)) => Err(GenerationError::InvalidConfiguration(
            "success_weight and outcome_weights are mutually exclusive".to_string(),
        )),
        (Some(success_weight), None) => {
            OutcomeWeights::success_biased(success_weight, &options.outcomes).map(Some)
        }
        (None, Some(weights)) => {
            OutcomeWeights::new(weights.iter().map(|(outcome, weight)| (*outcome, *weight)))
                .map(Some)
        }
        (None, None) => Ok(None),
    }
}
