use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use factum_filter::FactId;
use serde_json::Value;

/// An event as it is persisted: the store-assigned identity plus the
/// caller's `(event_type, payload, metadata)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Monotonic, store-assigned, gap-free-within-a-transaction sequence.
    pub sequence_number: i64,
    /// Server wall-clock timestamp at insert time.
    pub occurred_at: DateTime<Utc>,
    /// Short string tag from a closed per-domain set.
    pub event_type: String,
    /// Domain-defined JSON payload; the core never inspects it.
    pub payload: Value,
    /// String→string metadata (correlation id, source, session, user, ...).
    pub metadata: BTreeMap<String, String>,
}

/// One event to be written: the caller's half of [`StoredEvent`], before a
/// sequence number or timestamp is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEventInput {
    pub event_type: String,
    pub payload: Value,
    pub metadata: BTreeMap<String, String>,
}

/// A [`StoredEvent`] as returned by [`crate::EventLog::query_with_tags`],
/// annotated with the set of Facts whose filter clause it satisfied.
#[derive(Debug, Clone)]
pub struct TaggedEvent {
    pub event: StoredEvent,
    pub fact_ids: Vec<FactId>,
}

impl TaggedEvent {
    /// Does this event's tag set include `fact_id`?
    pub fn tagged_for(&self, fact_id: FactId) -> bool {
        self.fact_ids.contains(&fact_id)
    }
}

/// The result of [`crate::EventLog::append_with_conflict_check`].
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The batch was inserted; sequence numbers in insertion order.
    Success(Vec<i64>),
    /// No rows were inserted: `conflict_count` events matching the
    /// conflict filter already exist with `sequence_number >
    /// last_seen_sequence`.
    Conflict(u64),
}
