use std::collections::HashMap;
use std::sync::RwLock;

use tally_accounting::{aggregate_balance, LedgerEntry};
use tally_core::{AccountBalance, AccountIdentity, DomainError, Version};

use super::executor::{BalanceRow, BatchError, BatchExecutor, Deadline};
use super::statement::StatementBatch;

/// In-memory append-only entry log.
///
/// Intended for tests/dev. Not optimized for performance. Statements are
/// evaluated with the same aggregation the storage-side statement performs.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries (append-only).
    ///
    /// Versions must increase per account, both within the batch and relative
    /// to what is already stored. Nothing is appended if any entry is rejected.
    pub fn append(&self, entries: Vec<LedgerEntry>) -> Result<(), DomainError> {
        let mut log = self
            .entries
            .write()
            .map_err(|_| DomainError::invariant("lock poisoned"))?;

        let mut latest: HashMap<&AccountIdentity, Version> = HashMap::new();
        for e in log.iter() {
            let v = latest.entry(&e.account).or_default();
            *v = (*v).max(e.version);
        }

        for (idx, e) in entries.iter().enumerate() {
            let current = latest.get(&e.account).copied().unwrap_or_default();
            if e.version <= current {
                return Err(DomainError::invariant(format!(
                    "non-monotonic version for {} (index {idx}): current {current}, found {}",
                    e.account, e.version
                )));
            }
            latest.insert(&e.account, e.version);
        }

        drop(latest);
        log.extend(entries);
        Ok(())
    }

    /// Number of stored entries; fails like `append` once the lock is poisoned.
    pub fn len(&self) -> Result<usize, DomainError> {
        self.entries
            .read()
            .map(|log| log.len())
            .map_err(|_| DomainError::invariant("lock poisoned"))
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }

    fn to_row(position: usize, balance: AccountBalance) -> Result<BalanceRow, BatchError> {
        let to_i64 = |column: &str, value: u64| {
            i64::try_from(value)
                .map_err(|_| BatchError::Unavailable(format!("{column} out of range for account {}", balance.account)))
        };

        Ok(BalanceRow {
            statement_index: position as i64,
            account_class: balance.account.class().as_str().to_string(),
            account_group: balance.account.group().to_string(),
            account_subgroup: balance.account.subgroup().to_string(),
            account_id: balance.account.id().to_string(),
            current_version: to_i64("current_version", balance.version.as_u64())?,
            total_credit: to_i64("total_credit", balance.total_credit)?,
            total_debit: to_i64("total_debit", balance.total_debit)?,
        })
    }
}

#[async_trait::async_trait]
impl BatchExecutor for InMemoryLedger {
    async fn execute_batch(
        &self,
        batch: &StatementBatch,
        deadline: Option<Deadline>,
    ) -> Result<Vec<BalanceRow>, BatchError> {
        if deadline.is_some_and(|d| d.has_elapsed()) {
            return Err(BatchError::DeadlineExceeded);
        }

        // One read lock for the whole batch: every statement sees the same snapshot.
        let log = self
            .entries
            .read()
            .map_err(|_| BatchError::Unavailable("lock poisoned".to_string()))?;

        let mut rows = Vec::new();
        for statement in batch.statements() {
            let balance = aggregate_balance(log.iter(), statement.account())
                .map_err(|e| BatchError::Unavailable(format!("statement {} failed: {e}", statement.position())))?;
            if let Some(balance) = balance {
                rows.push(Self::to_row(statement.position(), balance)?);
            }
        }

        Ok(rows)
    }
}
