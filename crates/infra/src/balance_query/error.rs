use thiserror::Error;

use super::executor::BatchError;

/// Failure of a batched balance read.
///
/// A failed batch yields no balances at all. `operation` names the datastore
/// operation; `position` is the request position when it can be determined.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BalanceQueryError {
    #[error("{operation}: backend unavailable: {reason}")]
    BackendUnavailable {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation}: row decode failed (position {position:?}): {reason}")]
    RowDecode {
        operation: &'static str,
        position: Option<usize>,
        reason: String,
    },

    #[error("{operation}: correlation mismatch (position {position:?}): {reason}")]
    CorrelationMismatch {
        operation: &'static str,
        position: Option<usize>,
        reason: String,
    },

    #[error("{operation}: deadline exceeded")]
    DeadlineExceeded { operation: &'static str },
}

impl BalanceQueryError {
    pub fn from_batch(operation: &'static str, err: BatchError) -> Self {
        match err {
            BatchError::Unavailable(reason) => Self::BackendUnavailable { operation, reason },
            BatchError::RowDecode(reason) => Self::RowDecode {
                operation,
                position: None,
                reason,
            },
            BatchError::DeadlineExceeded => Self::DeadlineExceeded { operation },
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::BackendUnavailable { operation, .. }
            | Self::RowDecode { operation, .. }
            | Self::CorrelationMismatch { operation, .. }
            | Self::DeadlineExceeded { operation } => operation,
        }
    }
}
