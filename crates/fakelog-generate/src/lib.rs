//! Synthetic record generation for fakelog.
//!
//! Builds timestamp-ordered batches of fake telemetry records from category
//! vocabularies and an optional outcome weighting, retries failed batch
//! construction under a bounded policy, and persists batches as JSON lines.

pub mod engine;
pub mod errors;
pub mod factory;
pub mod model;
pub mod output;
pub mod weights;

pub use engine::{BatchGenerator, GenerationEngine, seeded_rng};
pub use errors::GenerationError;
pub use factory::{RecordFactory, RecordSource, round_duration};
pub use model::{GenerateOptions, RetryPolicy};
pub use weights::OutcomeWeights;
