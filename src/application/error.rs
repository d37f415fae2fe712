// Application-level errors
use crate::domain::error::StatusError;
use thiserror::Error;

/// Problems with a `from`/`to`/`interval` history query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("malformed timestamp '{0}', expected RFC 3339")]
    MalformedTime(String),

    #[error("malformed interval '{0}'")]
    MalformedInterval(String),

    #[error("range start must be before its end")]
    Inverted,

    #[error("interval must be greater than zero")]
    ZeroStep,

    #[error("interval '{0}' reaches past the supported calendar")]
    StepOutOfRange(String),

    #[error("range would produce {requested} samples, at most {max} allowed")]
    TooManySamples { requested: u64, max: u64 },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("sensor '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}
