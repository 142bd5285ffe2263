//! Distribution comparison for fakelog batches.
//!
//! Profiles batches (counts, percentages, duration aggregates, observed
//! categories), diffs two profiles into a typed [`DistributionReport`], and
//! renders the result as narrative log lines and a markdown report.

pub mod compare;
pub mod engine;
pub mod errors;
pub mod model;
pub mod report;

pub use compare::{compare, log_observations, profile};
pub use engine::{CompareOptions, ComparisonEngine, ComparisonResult};
pub use errors::EvalError;
pub use model::{
    BatchProfile, CategoryDelta, CountChange, DistributionReport, Observation, ObservationLevel,
    PerOutcome, PerPriority, SetChange,
};
pub use report::render_report;
