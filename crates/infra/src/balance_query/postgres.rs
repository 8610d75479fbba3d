//! Postgres-backed batch executor.
//!
//! A batch is sent as one `UNION ALL` statement per round trip, with every
//! aggregation statement's placeholders renumbered. Batches larger than
//! `max_statements_per_round_trip` are split into several round trips inside
//! one repeatable-read, read-only transaction, so all of them see the same
//! snapshot.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | BatchError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (query canceled) | `57014` | `DeadlineExceeded` | `statement_timeout` derived from the deadline fired |
//! | Database (other) | Any other | `Unavailable` | Rejected statement, permission, missing table |
//! | ColumnDecode / ColumnNotFound / Decode | N/A | `RowDecode` | Row does not have the expected shape |
//! | PoolTimedOut / PoolClosed / Io / Tls / Protocol | N/A | `Unavailable` | Connectivity |
//!
//! ## Thread Safety
//!
//! `PostgresBatchExecutor` is `Send + Sync` and can be shared across tasks; the
//! pool is only read.

use std::sync::Arc;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, Span};

use crate::config::DatabaseConfig;

use super::executor::{BalanceRow, BatchError, BatchExecutor, Deadline};
use super::statement::{render_round_trip_sql, AggregationStatement, StatementBatch};

/// Upper bound imposed by the Postgres bind-parameter limit (65535 / 7).
pub const MAX_STATEMENTS_PER_ROUND_TRIP: usize = 9000;

/// Default number of statements sent per round trip.
pub const DEFAULT_STATEMENTS_PER_ROUND_TRIP: usize = 1000;

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

#[derive(Debug, Clone)]
pub struct PostgresBatchExecutor {
    pool: Arc<PgPool>,
    max_statements_per_round_trip: usize,
}

impl PostgresBatchExecutor {
    /// Create a new executor over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            max_statements_per_round_trip: DEFAULT_STATEMENTS_PER_ROUND_TRIP,
        }
    }

    /// Clamped to `1..=MAX_STATEMENTS_PER_ROUND_TRIP`.
    pub fn with_max_statements_per_round_trip(mut self, max: usize) -> Self {
        self.max_statements_per_round_trip = max.clamp(1, MAX_STATEMENTS_PER_ROUND_TRIP);
        self
    }

    pub fn max_statements_per_round_trip(&self) -> usize {
        self.max_statements_per_round_trip
    }

    /// Build a pool from configuration and wrap it.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, BatchError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool).with_max_statements_per_round_trip(config.max_statements_per_round_trip))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl BatchExecutor for PostgresBatchExecutor {
    #[instrument(
        skip(self, batch, deadline),
        fields(
            statement_count = batch.len(),
            round_trips = tracing::field::Empty,
            row_count = tracing::field::Empty
        ),
        err
    )]
    async fn execute_batch(
        &self,
        batch: &StatementBatch,
        deadline: Option<Deadline>,
    ) -> Result<Vec<BalanceRow>, BatchError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_read_only", e))?;

        // Propagate the caller's budget so the server stops work on abandoned batches.
        if let Some(deadline) = deadline {
            let remaining_ms = deadline.remaining().as_millis().max(1);
            sqlx::query("SELECT set_config('statement_timeout', $1, true)")
                .bind(remaining_ms.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("set_statement_timeout", e))?;
        }

        let mut rows = Vec::new();
        let mut round_trips = 0usize;
        for chunk in batch.chunks(self.max_statements_per_round_trip) {
            let fetched = fetch_round_trip(&mut tx, chunk).await?;
            debug!(statements = chunk.len(), rows = fetched.len(), "round trip completed");
            rows.extend(fetched);
            round_trips += 1;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let span = Span::current();
        span.record("round_trips", round_trips);
        span.record("row_count", rows.len());
        Ok(rows)
    }
}

async fn fetch_round_trip(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    statements: &[AggregationStatement],
) -> Result<Vec<BalanceRow>, BatchError> {
    let sql = render_round_trip_sql(statements);

    let mut query = sqlx::query(&sql);
    for statement in statements {
        let p = statement.params();
        query = query
            .bind(p.statement_index)
            .bind(p.credit_label)
            .bind(p.debit_label)
            .bind(p.account_class)
            .bind(p.account_group)
            .bind(p.account_subgroup)
            .bind(p.account_id);
    }

    let fetched = query
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("fetch_balances", e))?;

    fetched.iter().map(decode_row).collect()
}

fn decode_row(row: &PgRow) -> Result<BalanceRow, BatchError> {
    let decode = |e: sqlx::Error| BatchError::RowDecode(format!("failed to decode balance row: {e}"));

    Ok(BalanceRow {
        statement_index: row.try_get("statement_index").map_err(decode)?,
        account_class: row.try_get("account_class").map_err(decode)?,
        account_group: row.try_get("account_group").map_err(decode)?,
        account_subgroup: row.try_get("account_subgroup").map_err(decode)?,
        account_id: row.try_get("account_id").map_err(decode)?,
        current_version: row.try_get("current_version").map_err(decode)?,
        total_credit: row.try_get("total_credit").map_err(decode)?,
        total_debit: row.try_get("total_debit").map_err(decode)?,
    })
}

/// Map SQLx errors to BatchError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> BatchError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(QUERY_CANCELED) {
                return BatchError::DeadlineExceeded;
            }
            BatchError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            BatchError::RowDecode(format!("decode error in {}: {}", operation, err))
        }
        sqlx::Error::PoolClosed => {
            BatchError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            BatchError::Unavailable(format!("timed out acquiring a connection in {}", operation))
        }
        _ => BatchError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
