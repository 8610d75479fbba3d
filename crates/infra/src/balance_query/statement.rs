//! Aggregation statement builder.
//!
//! Each statement is independent and parameterized by:
//!
//! | placeholder | value |
//! |---|---|
//! | `$1` | correlation token (request position) |
//! | `$2` | credit operation label |
//! | `$3` | debit operation label |
//! | `$4`..`$7` | account class, group, subgroup, id |
//!
//! When several statements are sent in one round trip their placeholders are
//! renumbered so that statement `k` of the round trip uses
//! `$(7k + 1)`..`$(7k + 7)`.

use tally_accounting::Operation;
use tally_core::AccountIdentity;

/// Number of bind parameters used by one aggregation statement.
pub const PARAMS_PER_STATEMENT: usize = 7;

/// Aggregation over the entry log for a single account.
pub const AGGREGATE_BALANCE_SQL: &str = r#"SELECT
    $1::int8 AS statement_index,
    account_class,
    account_group,
    account_subgroup,
    account_id,
    MAX(version)::int8 AS current_version,
    SUM(CASE operation WHEN $2 THEN amount ELSE 0 END)::int8 AS total_credit,
    SUM(CASE operation WHEN $3 THEN amount ELSE 0 END)::int8 AS total_debit
FROM entries
WHERE account_class = $4 AND account_group = $5 AND account_subgroup = $6 AND account_id = $7
GROUP BY account_class, account_group, account_subgroup, account_id"#;

/// Values bound to one statement, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementParams<'a> {
    pub statement_index: i64,
    pub credit_label: &'static str,
    pub debit_label: &'static str,
    pub account_class: &'static str,
    pub account_group: &'a str,
    pub account_subgroup: &'a str,
    pub account_id: &'a str,
}

/// One aggregation statement, tagged with the request position it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationStatement {
    position: usize,
    account: AccountIdentity,
}

impl AggregationStatement {
    pub fn new(position: usize, account: AccountIdentity) -> Self {
        Self { position, account }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn account(&self) -> &AccountIdentity {
        &self.account
    }

    pub fn params(&self) -> StatementParams<'_> {
        StatementParams {
            statement_index: self.position as i64,
            credit_label: Operation::Credit.as_str(),
            debit_label: Operation::Debit.as_str(),
            account_class: self.account.class().as_str(),
            account_group: self.account.group(),
            account_subgroup: self.account.subgroup(),
            account_id: self.account.id(),
        }
    }
}

/// Ordered statements for one batch; statement `i` answers request position `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBatch {
    statements: Vec<AggregationStatement>,
}

impl StatementBatch {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[AggregationStatement] {
        &self.statements
    }

    pub fn get(&self, position: usize) -> Option<&AggregationStatement> {
        self.statements.get(position)
    }

    /// Split into groups of at most `max` statements, preserving order.
    pub fn chunks(&self, max: usize) -> impl Iterator<Item = &[AggregationStatement]> {
        self.statements.chunks(max.max(1))
    }
}

/// Build one statement per requested account, preserving request order.
///
/// Duplicate accounts get their own statement. No validation happens here.
pub fn build_statements(accounts: &[AccountIdentity]) -> StatementBatch {
    StatementBatch {
        statements: accounts
            .iter()
            .cloned()
            .enumerate()
            .map(|(position, account)| AggregationStatement::new(position, account))
            .collect(),
    }
}

/// Render statements as a single SQL text sent in one round trip.
///
/// Rows come back ordered by correlation token.
pub fn render_round_trip_sql(statements: &[AggregationStatement]) -> String {
    if statements.len() == 1 {
        return AGGREGATE_BALANCE_SQL.to_string();
    }

    let mut sql = String::with_capacity(statements.len() * (AGGREGATE_BALANCE_SQL.len() + 16));
    for k in 0..statements.len() {
        if k > 0 {
            sql.push_str("\nUNION ALL\n");
        }
        sql.push('(');
        sql.push_str(&renumber_placeholders(AGGREGATE_BALANCE_SQL, k * PARAMS_PER_STATEMENT));
        sql.push(')');
    }
    sql.push_str("\nORDER BY statement_index");
    sql
}

/// Shift every `$n` placeholder in `template` by `offset`.
pub fn renumber_placeholders(template: &str, offset: usize) -> String {
    if offset == 0 {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }

        out.push('$');
        match digits.parse::<usize>() {
            Ok(n) => out.push_str(&(n + offset).to_string()),
            Err(_) => out.push_str(&digits),
        }
    }
    out
}

/// Distinct placeholder numbers used by `sql`, ascending.
pub fn placeholders(sql: &str) -> Vec<usize> {
    let mut found: Vec<usize> = sql
        .split('$')
        .skip(1)
        .filter_map(|rest| {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}
