use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("transient generation failure: {0}")]
    Transient(String),
    #[error("generation failed after {attempts} attempt(s)")]
    Terminal {
        attempts: u32,
        #[source]
        source: Box<GenerationError>,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationError::Terminal { .. })
    }
}
