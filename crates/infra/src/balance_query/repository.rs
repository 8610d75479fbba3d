use tracing::{debug, instrument, Span};

use tally_core::{AccountBalance, AccountIdentity};
use tally_observability::datastore::{self, fields, GET_BATCH_ACCOUNT_BALANCE};

use super::correlator::correlate;
use super::error::BalanceQueryError;
use super::executor::{BatchExecutor, Deadline};
use super::statement::{build_statements, AGGREGATE_BALANCE_SQL};

/// Read-side repository computing account balances from the entry log.
///
/// Holds only a shared, read-only backend handle; one repository can serve
/// any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct BalanceRepository<E> {
    executor: E,
}

impl<E> BalanceRepository<E>
where
    E: BatchExecutor,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Balances for `accounts`, computed in one batched backend call.
    ///
    /// Accounts without entries are omitted; duplicates each get their own
    /// balance. The result follows request order. Dropping the future or
    /// passing `deadline` abandons the backend call. On any failure no
    /// balances are returned.
    #[instrument(
        name = "Repository.GetBatchAccountBalanceAggregated",
        skip(self, accounts, deadline),
        fields(
            operation = GET_BATCH_ACCOUNT_BALANCE,
            db.collection = datastore::ENTRIES_COLLECTION,
            db.statement = tracing::field::Empty,
            account_count = accounts.len(),
            row_count = tracing::field::Empty
        ),
        err
    )]
    pub async fn get_batch_account_balance(
        &self,
        accounts: &[AccountIdentity],
        deadline: Option<Deadline>,
    ) -> Result<Vec<AccountBalance>, BalanceQueryError> {
        if accounts.is_empty() {
            return Ok(vec![]);
        }

        let span = Span::current();
        span.record(fields::STATEMENT, AGGREGATE_BALANCE_SQL);

        let batch = build_statements(accounts);
        let submitted = self.executor.execute_batch(&batch, deadline);

        let rows = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline.instant(), submitted)
                .await
                .map_err(|_| BalanceQueryError::DeadlineExceeded {
                    operation: GET_BATCH_ACCOUNT_BALANCE,
                })?,
            None => submitted.await,
        }
        .map_err(|e| BalanceQueryError::from_batch(GET_BATCH_ACCOUNT_BALANCE, e))?;

        span.record(fields::ROW_COUNT, rows.len());
        debug!(accounts = accounts.len(), rows = rows.len(), "batch rows received");

        correlate(&batch, rows)
    }
}
