use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use factum_eventlog::{AppendOutcome, EventLog, EventLogError, StoredEvent, StoredEventInput, TaggedClause, TaggedEvent};
use factum_filter::FactId;

/// An `EventLog` over a process-local `Vec<StoredEvent>`, guarded by a
/// single mutex so conflict-check-then-append is atomic the same way the
/// Postgres implementation's single CTE statement is.
pub struct InMemoryEventLog {
    events: Mutex<Vec<StoredEvent>>,
    next_sequence: AtomicI64,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()), next_sequence: AtomicI64::new(1) }
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn snapshot(&self) -> Vec<StoredEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push_all(&self, events: &mut Vec<StoredEvent>, inputs: &[StoredEventInput]) -> Vec<i64> {
        let mut sequences = Vec::with_capacity(inputs.len());
        for input in inputs {
            let sequence_number = self.next_sequence.fetch_add(1, Ordering::SeqCst);
            events.push(StoredEvent {
                sequence_number,
                occurred_at: Utc::now(),
                event_type: input.event_type.clone(),
                payload: input.payload.clone(),
                metadata: input.metadata.clone(),
            });
            sequences.push(sequence_number);
        }
        sequences
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

fn tags_for(filters: &[TaggedClause], event_type: &str, payload: &Value) -> Vec<FactId> {
    let mut ids: Vec<FactId> = filters
        .iter()
        .filter(|(_, clause)| clause.matches(event_type, payload))
        .map(|(id, _)| *id)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

fn matches_any(filters: &[TaggedClause], event_type: &str, payload: &Value) -> bool {
    filters.iter().any(|(_, clause)| clause.matches(event_type, payload))
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append_unchecked(&self, events: &[StoredEventInput]) -> Result<Vec<i64>, EventLogError> {
        let mut guard = self.events.lock().unwrap();
        Ok(self.push_all(&mut guard, events))
    }

    async fn query_with_tags(&self, filters: &[TaggedClause]) -> Result<(Vec<TaggedEvent>, i64), EventLogError> {
        let guard = self.events.lock().unwrap();
        let mut tagged = Vec::new();
        let mut max_sequence = 0;

        for event in guard.iter() {
            let fact_ids = tags_for(filters, &event.event_type, &event.payload);
            if !fact_ids.is_empty() {
                max_sequence = max_sequence.max(event.sequence_number);
                tagged.push(TaggedEvent { event: event.clone(), fact_ids });
            }
        }

        Ok((tagged, max_sequence))
    }

    async fn append_with_conflict_check(
        &self,
        events: &[StoredEventInput],
        conflict_filter: &[TaggedClause],
        last_seen_sequence: i64,
    ) -> Result<AppendOutcome, EventLogError> {
        let mut guard = self.events.lock().unwrap();

        let conflict_count = guard
            .iter()
            .filter(|e| e.sequence_number > last_seen_sequence)
            .filter(|e| matches_any(conflict_filter, &e.event_type, &e.payload))
            .count() as u64;

        if conflict_count > 0 {
            return Ok(AppendOutcome::Conflict(conflict_count));
        }

        Ok(AppendOutcome::Success(self.push_all(&mut guard, events)))
    }
}

/// Build a [`StoredEventInput`] tersely for test seeding (mirrors the
/// builder-style seeding helpers tests reach for when populating a log
/// before exercising a command handler).
pub fn event_input(event_type: &str, payload: Value) -> StoredEventInput {
    StoredEventInput { event_type: event_type.to_string(), payload, metadata: BTreeMap::new() }
}

/// Seed `log` with a batch of events in one `?`-friendly call, for test
/// setup code that would rather bail out with context than unwrap.
pub async fn seed(log: &InMemoryEventLog, events: Vec<StoredEventInput>) -> anyhow::Result<Vec<i64>> {
    let sequences = log.append_unchecked(&events).await?;
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use factum_filter::{attr_int, EventFilter};

    fn tagged(id: u64, filter: EventFilter) -> Vec<TaggedClause> {
        factum_filter::union(vec![(FactId::from_raw(id), filter)])
    }

    #[tokio::test]
    async fn append_unchecked_assigns_increasing_sequences() {
        let log = InMemoryEventLog::new();
        let sequences = log
            .append_unchecked(&[event_input("A", serde_json::json!({})), event_input("B", serde_json::json!({}))])
            .await
            .unwrap();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[tokio::test]
    async fn seed_bails_via_question_mark_on_failure() -> anyhow::Result<()> {
        let log = InMemoryEventLog::new();
        let sequences = seed(&log, vec![event_input("A", serde_json::json!({})), event_input("B", serde_json::json!({}))]).await?;
        assert_eq!(sequences, vec![1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn query_with_tags_isolates_matching_events_only() {
        let log = InMemoryEventLog::new();
        log.append_unchecked(&[event_input("A", serde_json::json!({"k": 1})), event_input("A", serde_json::json!({"k": 2}))])
            .await
            .unwrap();

        let filters = tagged(1, EventFilter::empty().for_type("A", vec![attr_int("k", 1)]));
        let (tagged_events, max_sequence) = log.query_with_tags(&filters).await.unwrap();

        assert_eq!(tagged_events.len(), 1);
        assert_eq!(tagged_events[0].event.sequence_number, 1);
        assert_eq!(max_sequence, 1);
    }

    #[tokio::test]
    async fn conflict_blocks_append_and_preserves_log() {
        let log = InMemoryEventLog::new();
        log.append_unchecked(&[event_input("A", serde_json::json!({"k": 1}))]).await.unwrap();

        let filters = tagged(1, EventFilter::empty().for_type("A", vec![]));
        let outcome = log
            .append_with_conflict_check(&[event_input("B", serde_json::json!({}))], &filters, 0)
            .await
            .unwrap();

        assert_eq!(outcome, AppendOutcome::Conflict(1));
        assert_eq!(log.event_count(), 1);
    }

    #[tokio::test]
    async fn no_conflict_appends_successfully() {
        let log = InMemoryEventLog::new();
        log.append_unchecked(&[event_input("A", serde_json::json!({"k": 1}))]).await.unwrap();

        let filters = tagged(1, EventFilter::empty().for_type("A", vec![attr_int("k", 99)]));
        let outcome = log
            .append_with_conflict_check(&[event_input("B", serde_json::json!({}))], &filters, 0)
            .await
            .unwrap();

        assert_eq!(outcome, AppendOutcome::Success(vec![2]));
    }
}
