//! Batched account balance reads.
//!
//! One aggregation statement is built per requested account, the statements
//! are submitted to the storage backend as a single batch, and each returned
//! row is correlated back to the request position it was produced for.
//!
//! Rows are matched by the correlation token each statement carries (its
//! request position) and by the account key fields decoded from the row, never
//! by the index of the row in the response. An account without entries yields
//! no row, so the response may be shorter than the request.

pub mod correlator;
pub mod error;
pub mod executor;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod statement;

pub use correlator::correlate;
pub use error::BalanceQueryError;
pub use executor::{BalanceRow, BatchError, BatchExecutor, Deadline};
pub use in_memory::InMemoryLedger;
pub use postgres::PostgresBatchExecutor;
pub use repository::BalanceRepository;
pub use statement::{build_statements, AggregationStatement, StatementBatch};
