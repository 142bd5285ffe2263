//! Core contracts for fakelog.
//!
//! This crate defines the synthetic record types, the fixed category
//! vocabularies, and the ordered batch shared by the generator, the
//! comparator, and the CLI.

pub mod batch;
pub mod error;
pub mod record;

pub use batch::{Batch, DEFAULT_MAX_ROWS};
pub use error::{CoreError, Result};
pub use record::{
    DURATION_MAX, DURATION_MIN, Outcome, Priority, Record, TIMESTAMP_FORMAT, parse_timestamp,
};
