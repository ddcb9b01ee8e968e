//! Error taxonomy for synchronization runs

use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that end a synchronization run.
///
/// Malformed source rows are deliberately absent: the normalizer coerces them
/// instead of failing.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("source unavailable: {message}")]
    SourceUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("destination unavailable: {message}")]
    DestinationUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("destination write failed: {message}")]
    DestinationWriteFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid transaction transition: cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },
}

impl SyncError {
    pub fn source_unavailable(
        message: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::SourceUnavailable {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    pub fn destination_unavailable(
        message: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::DestinationUnavailable {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    pub fn write_failure(
        message: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::DestinationWriteFailure {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// True when the run failed while applying batches (the transaction was rolled back)
    pub fn is_write_phase(&self) -> bool {
        matches!(self, SyncError::DestinationWriteFailure { .. })
    }
}
