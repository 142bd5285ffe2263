use thiserror::Error;

/// Core error type shared across fakelog crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A category name is not part of its fixed vocabulary.
    #[error("unknown {kind} '{value}'")]
    UnknownCategory { kind: &'static str, value: String },
    /// A timestamp does not match `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Convenience alias for results returned by fakelog crates.
pub type Result<T> = std::result::Result<T, CoreError>;
