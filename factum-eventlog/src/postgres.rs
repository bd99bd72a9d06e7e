//! PostgreSQL-backed [`crate::EventLog`].
//!
//! Every operation is a single SQL statement built from CTEs — conflict
//! detection and insertion happen inside the database in one round trip, so
//! there is no window between "check" and "write" for another connection to
//! race through.
//!
//! Filters cross the wire as a `jsonb` array of `{event_type, filter,
//! params, fact_id}` objects (see [`factum_filter::WireClause`]) and are
//! evaluated with `jsonb_path_exists`, which requires the GIN index this
//! crate's [`crate::schema::SCHEMA_SQL`] creates over `payload`.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};

use factum_filter::FactId;

use crate::error::EventLogError;
use crate::types::{AppendOutcome, StoredEvent, StoredEventInput, TaggedEvent};
use crate::TaggedClause;

/// An [`crate::EventLog`] backed by a single Postgres `events` table.
#[derive(Clone)]
pub struct PgEventLog {
    pool: PgPool,
}

impl PgEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Compile tagged clauses to the `jsonb` array bound as the `filters`
/// parameter of every query below.
fn filters_to_json(filters: &[TaggedClause]) -> Value {
    Value::Array(
        filters
            .iter()
            .map(|(fact_id, clause)| {
                serde_json::to_value(clause.to_wire(Some(*fact_id)))
                    .expect("WireClause serialization is infallible")
            })
            .collect(),
    )
}

/// Compile a batch of events to the `jsonb` array bound as the `events`
/// parameter of the append statements.
fn events_to_json(events: &[StoredEventInput]) -> Value {
    Value::Array(
        events
            .iter()
            .map(|e| {
                serde_json::json!({
                    "event_type": e.event_type,
                    "payload": e.payload,
                    "metadata": e.metadata,
                })
            })
            .collect(),
    )
}

/// Parse the `text[]` of `"fact-<n>"` tags Postgres hands back for a row
/// into the [`FactId`]s it names. Malformed tags (there should be none —
/// every tag comes from [`FactId::to_string`] by way of [`filters_to_json`])
/// are silently dropped rather than failing the whole query.
fn parse_fact_ids(tags: Vec<String>) -> Vec<FactId> {
    tags.iter().filter_map(|t| FactId::from_str(t).ok()).collect()
}

#[async_trait]
impl crate::EventLog for PgEventLog {
    async fn append_unchecked(&self, events: &[StoredEventInput]) -> Result<Vec<i64>, EventLogError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            WITH to_insert AS (
                SELECT
                    (elem ->> 'event_type')                     AS event_type,
                    (elem -> 'payload')                         AS payload,
                    COALESCE(elem -> 'metadata', '{}'::jsonb)   AS metadata,
                    ordinality
                FROM jsonb_array_elements($1::jsonb) WITH ORDINALITY AS t(elem, ordinality)
            )
            INSERT INTO events (event_type, payload, metadata)
            SELECT event_type, payload, metadata
            FROM to_insert
            ORDER BY ordinality
            RETURNING sequence_number
            "#,
        )
        .bind(events_to_json(events))
        .fetch_all(&self.pool)
        .await?;

        let sequences: Vec<i64> = rows.iter().map(|r| r.get::<i64, _>("sequence_number")).collect();

        if sequences.len() != events.len() {
            return Err(EventLogError::RowMismatch { expected: events.len(), actual: sequences.len() });
        }

        Ok(sequences)
    }

    async fn query_with_tags(&self, filters: &[TaggedClause]) -> Result<(Vec<TaggedEvent>, i64), EventLogError> {
        if filters.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let rows = sqlx::query(
            r#"
            WITH filters AS (
                SELECT
                    (f ->> 'event_type')       AS event_type,
                    (f ->> 'filter')::jsonpath AS path,
                    (f -> 'params')            AS params,
                    (f ->> 'fact_id')          AS fact_id
                FROM jsonb_array_elements($1::jsonb) AS t(f)
            ),
            matches AS (
                SELECT DISTINCT e.sequence_number, filters.fact_id
                FROM events e
                JOIN filters ON e.event_type = filters.event_type
                WHERE jsonb_path_exists(e.payload, filters.path, COALESCE(filters.params, '{}'::jsonb))
            ),
            tagged AS (
                SELECT
                    sequence_number,
                    array_agg(DISTINCT fact_id) FILTER (WHERE fact_id IS NOT NULL) AS fact_ids
                FROM matches
                GROUP BY sequence_number
            )
            SELECT
                e.sequence_number,
                e.occurred_at,
                e.event_type,
                e.payload,
                e.metadata,
                tagged.fact_ids,
                (SELECT COALESCE(MAX(sequence_number), 0) FROM matches) AS max_sequence
            FROM events e
            JOIN tagged ON tagged.sequence_number = e.sequence_number
            ORDER BY e.sequence_number ASC
            "#,
        )
        .bind(filters_to_json(filters))
        .fetch_all(&self.pool)
        .await?;

        let max_sequence = rows.first().map(|r| r.get::<i64, _>("max_sequence")).unwrap_or(0);

        let mut tagged_events = Vec::with_capacity(rows.len());
        for row in rows {
            tagged_events.push(row_to_tagged_event(&row)?);
        }

        Ok((tagged_events, max_sequence))
    }

    async fn append_with_conflict_check(
        &self,
        events: &[StoredEventInput],
        conflict_filter: &[TaggedClause],
        last_seen_sequence: i64,
    ) -> Result<AppendOutcome, EventLogError> {
        let row = sqlx::query(
            r#"
            WITH filters AS (
                SELECT
                    (f ->> 'event_type')       AS event_type,
                    (f ->> 'filter')::jsonpath AS path,
                    (f -> 'params')            AS params
                FROM jsonb_array_elements($2::jsonb) AS t(f)
            ),
            conflict_count AS (
                SELECT COUNT(DISTINCT e.sequence_number) AS cnt
                FROM events e
                JOIN filters ON e.event_type = filters.event_type
                WHERE e.sequence_number > $3
                  AND jsonb_path_exists(e.payload, filters.path, COALESCE(filters.params, '{}'::jsonb))
            ),
            to_insert AS (
                SELECT
                    (elem ->> 'event_type')                   AS event_type,
                    (elem -> 'payload')                       AS payload,
                    COALESCE(elem -> 'metadata', '{}'::jsonb) AS metadata,
                    ordinality
                FROM jsonb_array_elements($1::jsonb) WITH ORDINALITY AS t(elem, ordinality)
                WHERE (SELECT cnt FROM conflict_count) = 0
            ),
            inserted AS (
                INSERT INTO events (event_type, payload, metadata)
                SELECT event_type, payload, metadata
                FROM to_insert
                ORDER BY ordinality
                RETURNING sequence_number
            )
            SELECT
                (SELECT cnt FROM conflict_count)                                    AS conflict_count,
                COALESCE((SELECT array_agg(sequence_number) FROM inserted), '{}')   AS inserted_sequences
            "#,
        )
        .bind(events_to_json(events))
        .bind(filters_to_json(conflict_filter))
        .bind(last_seen_sequence)
        .fetch_one(&self.pool)
        .await?;

        let conflict_count: i64 = row.get("conflict_count");
        if conflict_count > 0 {
            return Ok(AppendOutcome::Conflict(conflict_count as u64));
        }

        let inserted: Vec<i64> = row.get("inserted_sequences");
        if inserted.len() != events.len() {
            return Err(EventLogError::RowMismatch { expected: events.len(), actual: inserted.len() });
        }

        Ok(AppendOutcome::Success(inserted))
    }
}

fn row_to_tagged_event(row: &sqlx::postgres::PgRow) -> Result<TaggedEvent, EventLogError> {
    let sequence_number: i64 = row.get("sequence_number");
    let occurred_at: DateTime<Utc> = row.get("occurred_at");
    let event_type: String = row.get("event_type");
    let payload: Value = row.get("payload");
    let metadata_json: Value = row.get("metadata");
    let fact_id_tags: Vec<String> = row.try_get("fact_ids").unwrap_or_default();

    let metadata: BTreeMap<String, String> = serde_json::from_value(metadata_json)?;

    Ok(TaggedEvent {
        event: StoredEvent { sequence_number, occurred_at, event_type, payload, metadata },
        fact_ids: parse_fact_ids(fact_id_tags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use factum_filter::{attr_int, EventFilter};

    #[test]
    fn filters_to_json_compiles_every_clause_tagged() {
        let filters = factum_filter::union(vec![(
            FactId::from_raw(7),
            EventFilter::empty().for_type("Order", vec![attr_int("qty", 5)]),
        )]);

        let json = filters_to_json(&filters);
        let arr = json.as_array().expect("array");
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["event_type"], "Order");
        assert_eq!(arr[0]["fact_id"], "fact-7");
    }

    #[test]
    fn events_to_json_preserves_order_and_shape() {
        let events = vec![
            StoredEventInput { event_type: "A".into(), payload: serde_json::json!({"x": 1}), metadata: BTreeMap::new() },
            StoredEventInput { event_type: "B".into(), payload: serde_json::json!({"x": 2}), metadata: BTreeMap::new() },
        ];
        let json = events_to_json(&events);
        let arr = json.as_array().expect("array");
        assert_eq!(arr[0]["event_type"], "A");
        assert_eq!(arr[1]["event_type"], "B");
    }

    #[test]
    fn parse_fact_ids_skips_malformed_tags() {
        let ids = parse_fact_ids(vec!["fact-1".to_string(), "garbage".to_string(), "fact-2".to_string()]);
        assert_eq!(ids, vec![FactId::from_raw(1), FactId::from_raw(2)]);
    }
}
