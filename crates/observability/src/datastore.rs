//! Datastore segment conventions.
//!
//! Every storage call is wrapped in a span named `Repository.<Operation>` that
//! records the collection and the statement text, so external tracing can
//! attribute latency to a query.

/// Collection (table) holding the append-only entry log.
pub const ENTRIES_COLLECTION: &str = "entries";

/// Operation name reported for batched balance reads.
pub const GET_BATCH_ACCOUNT_BALANCE: &str = "Repository.GetBatchAccountBalanceAggregated";

/// Keys for span fields recorded after the span is opened.
///
/// Fields declared in `#[instrument(fields(...))]` must be written there as
/// literal identifiers; these constants name the ones later filled in with
/// `Span::record`.
pub mod fields {
    pub const STATEMENT: &str = "db.statement";
    pub const ROW_COUNT: &str = "row_count";
}
