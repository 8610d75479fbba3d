use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use super::statement::StatementBatch;

/// One decoded result row of an aggregation statement.
///
/// Columns are kept in their storage types; range checks happen during
/// correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    /// Correlation token echoed back from the statement (request position).
    pub statement_index: i64,
    pub account_class: String,
    pub account_group: String,
    pub account_subgroup: String,
    pub account_id: String,
    pub current_version: i64,
    pub total_credit: i64,
    pub total_debit: i64,
}

/// Caller-supplied point in time after which a batch is abandoned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn has_elapsed(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Storage backend failure while executing a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Submission failed (connectivity, protocol, rejected statement).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A returned row could not be decoded into the expected column types.
    #[error("row decode failed: {0}")]
    RowDecode(String),

    /// The backend abandoned the batch because the deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Batched-execution primitive over the entry log.
///
/// Implementations must:
/// - execute every statement of the batch as one unit (no partial results)
/// - return at most one row per statement, in submission order
/// - echo each statement's correlation token in its row
/// - stop work on the backend when the deadline passes, where the backend allows it
#[async_trait::async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute_batch(
        &self,
        batch: &StatementBatch,
        deadline: Option<Deadline>,
    ) -> Result<Vec<BalanceRow>, BatchError>;
}

#[async_trait::async_trait]
impl<E> BatchExecutor for Arc<E>
where
    E: BatchExecutor + ?Sized,
{
    async fn execute_batch(
        &self,
        batch: &StatementBatch,
        deadline: Option<Deadline>,
    ) -> Result<Vec<BalanceRow>, BatchError> {
        (**self).execute_batch(batch, deadline).await
    }
}
