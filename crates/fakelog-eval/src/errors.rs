use thiserror::Error;

use fakelog_generate::GenerationError;

/// Errors emitted by the comparison engine.
///
/// Comparing batches never fails; only loading inputs and writing artifacts do.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<GenerationError> for EvalError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Io(err) => EvalError::Io(err),
            GenerationError::Json(err) => EvalError::Json(err),
            other => EvalError::InvalidDataset(other.to_string()),
        }
    }
}
