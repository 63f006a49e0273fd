use crate::encode::EncodeError;
use crate::storage::WriteError;
use thiserror::Error;

/// What the host pipeline is told after a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The batch is durably written.
    Processed,
    /// Redeliver the same batch later.
    Retry,
    /// Do not try this batch again.
    Error,
}

impl FlushOutcome {
    /// Host return code: `0` error, `1` processed, `2` retry.
    pub fn code(self) -> i32 {
        match self {
            FlushOutcome::Error => 0,
            FlushOutcome::Processed => 1,
            FlushOutcome::Retry => 2,
        }
    }
}

impl std::fmt::Display for FlushOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushOutcome::Processed => write!(f, "processed"),
            FlushOutcome::Retry => write!(f, "retry"),
            FlushOutcome::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("failed to encode batch: {0}")]
    Encode(#[from] EncodeError),

    #[error("failed to write object '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: WriteError,
    },
}

impl FlushError {
    /// The one place failures are mapped onto what the host understands.
    pub fn outcome(&self) -> FlushOutcome {
        match self {
            FlushError::Encode(e) if e.is_transient() => FlushOutcome::Retry,
            FlushError::Encode(_) => FlushOutcome::Error,
            FlushError::Write { source, .. } if source.is_transient() => FlushOutcome::Retry,
            FlushError::Write { .. } => FlushOutcome::Error,
        }
    }
}
