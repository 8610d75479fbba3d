//! In-process balance aggregation over ledger entries.
//!
//! Mirrors the storage-side statement: group by account, keep the highest
//! version, and sum amounts conditionally on the operation.

use thiserror::Error;

use tally_core::{AccountBalance, AccountIdentity, Version};

use crate::entry::{LedgerEntry, Operation};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("{operation} total overflowed for account {account}")]
    Overflow { account: String, operation: Operation },
}

/// Running aggregate for a single account.
///
/// The result does not depend on the order entries are applied in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceAccumulator {
    matched: usize,
    version: Version,
    total_credit: u64,
    total_debit: u64,
}

impl BalanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn apply(&mut self, entry: &LedgerEntry) -> Result<(), AggregationError> {
        let total = match entry.operation {
            Operation::Credit => &mut self.total_credit,
            Operation::Debit => &mut self.total_debit,
        };
        *total = total.checked_add(entry.amount).ok_or_else(|| AggregationError::Overflow {
            account: entry.account.to_string(),
            operation: entry.operation,
        })?;

        self.version = self.version.max(entry.version);
        self.matched += 1;
        Ok(())
    }

    /// `None` when no entry was applied: an account without entries has no
    /// balance row, which is not the same as a zero balance.
    pub fn finish(self, account: AccountIdentity) -> Option<AccountBalance> {
        if self.matched == 0 {
            return None;
        }
        Some(AccountBalance::new(account, self.version, self.total_credit, self.total_debit))
    }
}

/// Aggregate every entry of `log` that belongs to `account`.
pub fn aggregate_balance<'a, I>(
    log: I,
    account: &AccountIdentity,
) -> Result<Option<AccountBalance>, AggregationError>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut acc = BalanceAccumulator::new();
    for entry in log.into_iter().filter(|e| &e.account == account) {
        acc.apply(entry)?;
    }
    Ok(acc.finish(account.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tally_core::AccountClass;

    fn test_account(id: &str) -> AccountIdentity {
        AccountIdentity::new(AccountClass::Liability, "clients", "available", id)
    }

    #[test]
    fn sums_credits_and_debits_and_keeps_latest_version() {
        let account = test_account("1");
        let log = vec![
            LedgerEntry::credit(account.clone(), 100, Version::new(1)),
            LedgerEntry::debit(account.clone(), 30, Version::new(2)),
            LedgerEntry::credit(account.clone(), 50, Version::new(3)),
        ];

        let balance = aggregate_balance(&log, &account).unwrap().unwrap();
        assert_eq!(balance.total_credit, 150);
        assert_eq!(balance.total_debit, 30);
        assert_eq!(balance.version, Version::new(3));
    }

    #[test]
    fn ignores_other_accounts() {
        let account = test_account("1");
        let other = test_account("2");
        let log = vec![
            LedgerEntry::credit(other.clone(), 999, Version::new(9)),
            LedgerEntry::debit(account.clone(), 10, Version::new(1)),
        ];

        let balance = aggregate_balance(&log, &account).unwrap().unwrap();
        assert_eq!(balance.total_credit, 0);
        assert_eq!(balance.total_debit, 10);
        assert_eq!(balance.version, Version::new(1));
    }

    #[test]
    fn account_without_entries_has_no_balance() {
        let log = vec![LedgerEntry::credit(test_account("1"), 5, Version::new(1))];
        assert_eq!(aggregate_balance(&log, &test_account("2")).unwrap(), None);
    }

    #[test]
    fn zero_net_balance_is_still_a_balance() {
        let account = test_account("1");
        let log = vec![
            LedgerEntry::credit(account.clone(), 40, Version::new(1)),
            LedgerEntry::debit(account.clone(), 40, Version::new(2)),
        ];

        let balance = aggregate_balance(&log, &account).unwrap().unwrap();
        assert_eq!(balance.total_credit, balance.total_debit);
    }

    #[test]
    fn overflow_is_reported() {
        let account = test_account("1");
        let log = vec![
            LedgerEntry::credit(account.clone(), u64::MAX, Version::new(1)),
            LedgerEntry::credit(account.clone(), 1, Version::new(2)),
        ];

        let err = aggregate_balance(&log, &account).unwrap_err();
        assert!(matches!(err, AggregationError::Overflow { operation: Operation::Credit, .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the aggregate does not depend on the order entries appear in the log.
        #[test]
        fn aggregate_is_independent_of_log_order(
            movements in prop::collection::vec((any::<bool>(), 0u64..1_000_000u64), 1..40),
            seed in any::<u64>(),
        ) {
            let account = test_account("1");
            let log: Vec<LedgerEntry> = movements
                .iter()
                .enumerate()
                .map(|(idx, (is_credit, amount))| {
                    let op = if *is_credit { Operation::Credit } else { Operation::Debit };
                    LedgerEntry::new(account.clone(), op, *amount, Version::new(idx as u64 + 1))
                })
                .collect();

            // Deterministic shuffle driven by the generated seed.
            let mut shuffled = log.clone();
            let mut state = seed | 1;
            for i in (1..shuffled.len()).rev() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                shuffled.swap(i, (state % (i as u64 + 1)) as usize);
            }

            let expected_credit: u64 = movements.iter().filter(|(c, _)| *c).map(|(_, a)| a).sum();
            let expected_debit: u64 = movements.iter().filter(|(c, _)| !*c).map(|(_, a)| a).sum();

            let in_order = aggregate_balance(&log, &account).unwrap().unwrap();
            let reordered = aggregate_balance(&shuffled, &account).unwrap().unwrap();

            prop_assert_eq!(&in_order, &reordered);
            prop_assert_eq!(in_order.total_credit, expected_credit);
            prop_assert_eq!(in_order.total_debit, expected_debit);
            prop_assert_eq!(in_order.version, Version::new(movements.len() as u64));
        }
    }
}
