//! Infrastructure layer: batched balance queries, storage backends, config.

pub mod balance_query;
pub mod config;
