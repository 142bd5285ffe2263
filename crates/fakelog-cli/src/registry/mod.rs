mod atomic;
mod logging;
mod metrics;

pub use atomic::write_bytes_atomic;
pub use logging::{LOG_FILE_NAME, init_logging};
pub use metrics::{METRICS_FILE_NAME, RunMetrics};

use thiserror::Error;

/// Registry-level errors for run artifacts, logs, and metrics.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
