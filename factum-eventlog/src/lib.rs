//! Event Log
//!
//! A single append-only `events` table with a monotonically increasing
//! sequence. Exposes three operations:
//!
//! - [`EventLog::append_unchecked`] — administrative writes (test setup,
//!   legacy-event migration); never used by the command handler runtime.
//! - [`EventLog::query_with_tags`] — typed reads with JSON-path filtering,
//!   every returned event annotated with the set of fact ids whose clause
//!   it satisfied.
//! - [`EventLog::append_with_conflict_check`] — the only mutating path a
//!   command handler uses: one atomic statement that inserts a batch of
//!   events only if no event matching `conflict_filter` has appeared since
//!   `last_seen_sequence`.
//!
//! [`PgEventLog`] is the production implementation (SQL text in
//! [`postgres`]); other implementations (e.g. the in-memory log in
//! `factum-testkit`) exist for testing and must preserve the same
//! filter semantics via [`factum_filter::Clause::matches`].

mod error;
pub mod postgres;
pub mod schema;
mod types;

pub use error::EventLogError;
pub use postgres::PgEventLog;
pub use schema::SCHEMA_SQL;
pub use types::{AppendOutcome, StoredEvent, StoredEventInput, TaggedEvent};

use async_trait::async_trait;
use factum_filter::FactId;

/// A clause tagged with the [`FactId`] of the Fact that contributed it, as
/// produced by `factum_filter::union` and consumed by [`EventLog::query_with_tags`]
/// and [`EventLog::append_with_conflict_check`].
pub type TaggedClause = (FactId, factum_filter::Clause);

/// Persist and query a single global, append-only event log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Insert `events` as one batch, assigning each a sequence number.
    /// Returns the assigned sequences in insertion order. Never invoked by
    /// the command handler runtime — this is the administrative write path:
    /// test scaffolding and migration of legacy events.
    async fn append_unchecked(
        &self,
        events: &[StoredEventInput],
    ) -> Result<Vec<i64>, EventLogError>;

    /// Every event matching at least one of `filters`, tagged with the set
    /// of fact ids whose clause it satisfied, ordered by ascending
    /// sequence; and the maximum sequence number among matching events (0
    /// if none).
    async fn query_with_tags(
        &self,
        filters: &[TaggedClause],
    ) -> Result<(Vec<TaggedEvent>, i64), EventLogError>;

    /// Insert `events` as one batch **iff** no event matching
    /// `conflict_filter` has a sequence number greater than
    /// `last_seen_sequence`. Atomic: either every event in the batch is
    /// inserted, or none are.
    async fn append_with_conflict_check(
        &self,
        events: &[StoredEventInput],
        conflict_filter: &[TaggedClause],
        last_seen_sequence: i64,
    ) -> Result<AppendOutcome, EventLogError>;
}

#[async_trait]
impl<L: EventLog + ?Sized> EventLog for std::sync::Arc<L> {
    async fn append_unchecked(
        &self,
        events: &[StoredEventInput],
    ) -> Result<Vec<i64>, EventLogError> {
        (**self).append_unchecked(events).await
    }

    async fn query_with_tags(
        &self,
        filters: &[TaggedClause],
    ) -> Result<(Vec<TaggedEvent>, i64), EventLogError> {
        (**self).query_with_tags(filters).await
    }

    async fn append_with_conflict_check(
        &self,
        events: &[StoredEventInput],
        conflict_filter: &[TaggedClause],
        last_seen_sequence: i64,
    ) -> Result<AppendOutcome, EventLogError> {
        (**self).append_with_conflict_check(events, conflict_filter, last_seen_sequence).await
    }
}
