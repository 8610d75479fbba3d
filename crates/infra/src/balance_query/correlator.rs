//! Result correlation: response rows back to request positions.

use tally_core::{AccountBalance, Version};
use tally_observability::datastore::GET_BATCH_ACCOUNT_BALANCE;

use super::error::BalanceQueryError;
use super::executor::BalanceRow;
use super::statement::StatementBatch;

/// Map every row to the statement named by its correlation token.
///
/// Tokens must be strictly increasing (submission order, at most one row per
/// statement) and the row's key fields must equal the account of that
/// statement. The returned balances carry the requested identity, in row order.
/// Any violation fails the whole batch.
pub fn correlate(
    batch: &StatementBatch,
    rows: Vec<BalanceRow>,
) -> Result<Vec<AccountBalance>, BalanceQueryError> {
    let mut balances = Vec::with_capacity(rows.len());
    let mut last_position: Option<usize> = None;

    for row in rows {
        let position = usize::try_from(row.statement_index).map_err(|_| mismatch(
            None,
            format!("negative correlation token {}", row.statement_index),
        ))?;

        let statement = batch.get(position).ok_or_else(|| {
            mismatch(
                Some(position),
                format!("token {position} outside batch of {}", batch.len()),
            )
        })?;

        if let Some(last) = last_position.filter(|last| position <= *last) {
            return Err(mismatch(
                Some(position),
                format!("token {position} returned after token {last}"),
            ));
        }

        let account = statement.account();
        if !account.matches_key(
            &row.account_class,
            &row.account_group,
            &row.account_subgroup,
            &row.account_id,
        ) {
            return Err(mismatch(
                Some(position),
                format!(
                    "row key {}.{}.{}.{} does not match requested account {account}",
                    row.account_class, row.account_group, row.account_subgroup, row.account_id
                ),
            ));
        }

        let version = non_negative(position, "current_version", row.current_version)?;
        let total_credit = non_negative(position, "total_credit", row.total_credit)?;
        let total_debit = non_negative(position, "total_debit", row.total_debit)?;

        balances.push(AccountBalance::new(
            account.clone(),
            Version::new(version),
            total_credit,
            total_debit,
        ));
        last_position = Some(position);
    }

    Ok(balances)
}

fn mismatch(position: Option<usize>, reason: String) -> BalanceQueryError {
    BalanceQueryError::CorrelationMismatch {
        operation: GET_BATCH_ACCOUNT_BALANCE,
        position,
        reason,
    }
}

fn non_negative(position: usize, column: &str, value: i64) -> Result<u64, BalanceQueryError> {
    u64::try_from(value).map_err(|_| BalanceQueryError::RowDecode {
        operation: GET_BATCH_ACCOUNT_BALANCE,
        position: Some(position),
        reason: format!("{column} is negative ({value})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance_query::statement::build_statements;
    use proptest::prelude::*;
    use tally_core::{AccountClass, AccountIdentity};

    fn account(id: &str) -> AccountIdentity {
        AccountIdentity::new(AccountClass::Liability, "clients", "available", id)
    }

    fn row_for(position: i64, account: &AccountIdentity, version: i64, credit: i64, debit: i64) -> BalanceRow {
        BalanceRow {
            statement_index: position,
            account_class: account.class().as_str().to_string(),
            account_group: account.group().to_string(),
            account_subgroup: account.subgroup().to_string(),
            account_id: account.id().to_string(),
            current_version: version,
            total_credit: credit,
            total_debit: debit,
        }
    }

    #[test]
    fn missing_rows_do_not_shift_later_accounts() {
        let accounts = vec![account("a"), account("empty"), account("c")];
        let batch = build_statements(&accounts);

        // "empty" has no entries, so the backend emits no row for position 1.
        let rows = vec![
            row_for(0, &accounts[0], 4, 100, 0),
            row_for(2, &accounts[2], 9, 0, 70),
        ];

        let balances = correlate(&batch, rows).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].account, accounts[0]);
        assert_eq!(balances[0].total_credit, 100);
        assert_eq!(balances[1].account, accounts[2]);
        assert_eq!(balances[1].version, Version::new(9));
        assert_eq!(balances[1].total_debit, 70);
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let accounts = vec![account("a"), account("b")];
        let batch = build_statements(&accounts);

        // Row for "b" tagged with a's token.
        let rows = vec![row_for(0, &accounts[1], 1, 10, 0)];

        match correlate(&batch, rows).unwrap_err() {
            BalanceQueryError::CorrelationMismatch { position: Some(0), reason, .. } => {
                assert!(reason.contains("liability.clients.available.a"));
            }
            other => panic!("expected correlation mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_or_reordered_tokens_are_rejected() {
        let accounts = vec![account("a"), account("b")];
        let batch = build_statements(&accounts);

        let out_of_range = vec![row_for(5, &accounts[0], 1, 1, 0)];
        assert!(matches!(
            correlate(&batch, out_of_range),
            Err(BalanceQueryError::CorrelationMismatch { position: Some(5), .. })
        ));

        let reordered = vec![row_for(1, &accounts[1], 1, 1, 0), row_for(0, &accounts[0], 1, 1, 0)];
        assert!(matches!(
            correlate(&batch, reordered),
            Err(BalanceQueryError::CorrelationMismatch { position: Some(0), .. })
        ));

        let duplicated = vec![row_for(0, &accounts[0], 1, 1, 0), row_for(0, &accounts[0], 1, 1, 0)];
        assert!(correlate(&batch, duplicated).is_err());

        let negative = vec![row_for(-1, &accounts[0], 1, 1, 0)];
        assert!(matches!(
            correlate(&batch, negative),
            Err(BalanceQueryError::CorrelationMismatch { position: None, .. })
        ));
    }

    #[test]
    fn negative_totals_are_decode_errors() {
        let accounts = vec![account("a")];
        let batch = build_statements(&accounts);
        let rows = vec![row_for(0, &accounts[0], 1, -5, 0)];

        match correlate(&batch, rows).unwrap_err() {
            BalanceQueryError::RowDecode { position: Some(0), reason, .. } => {
                assert!(reason.contains("total_credit"));
            }
            other => panic!("expected row decode error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_requests_are_correlated_independently() {
        let accounts = vec![account("a"), account("a")];
        let batch = build_statements(&accounts);
        let rows = vec![row_for(0, &accounts[0], 2, 5, 1), row_for(1, &accounts[1], 2, 5, 1)];

        let balances = correlate(&batch, rows).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0], balances[1]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whichever positions have no row, every returned balance
        /// belongs to the account requested at its own position.
        #[test]
        fn sparse_rows_keep_their_requested_accounts(
            requests in prop::collection::vec(
                (0usize..6, any::<bool>(), 1i64..1_000, 0i64..1_000_000, 0i64..1_000_000),
                1..80,
            ),
        ) {
            // A small pool of ids makes duplicate requests common.
            let accounts: Vec<AccountIdentity> = requests
                .iter()
                .map(|(id, ..)| account(&format!("acc-{id}")))
                .collect();
            let batch = build_statements(&accounts);

            let kept: Vec<(usize, i64, i64, i64)> = requests
                .iter()
                .enumerate()
                .filter(|(_, (_, has_entries, ..))| *has_entries)
                .map(|(position, (_, _, version, credit, debit))| (position, *version, *credit, *debit))
                .collect();
            let rows = kept
                .iter()
                .map(|(position, version, credit, debit)| {
                    row_for(*position as i64, &accounts[*position], *version, *credit, *debit)
                })
                .collect();

            let balances = correlate(&batch, rows).unwrap();

            prop_assert_eq!(balances.len(), kept.len());
            for (balance, (position, version, credit, debit)) in balances.iter().zip(&kept) {
                prop_assert_eq!(&balance.account, &accounts[*position]);
                prop_assert_eq!(balance.version, Version::new(*version as u64));
                prop_assert_eq!(balance.total_credit, *credit as u64);
                prop_assert_eq!(balance.total_debit, *debit as u64);
            }
        }
    }
}
