//! Accounting module (append-only entry log, balance aggregation).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod aggregation;
pub mod entry;

pub use aggregation::{aggregate_balance, AggregationError, BalanceAccumulator};
pub use entry::{LedgerEntry, Operation};
