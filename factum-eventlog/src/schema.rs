//! The `events` table DDL, as a constant the host embeds in its own
//! setup/migration tooling.
//!
//! This crate does not run migrations itself — schema migration tooling is
//! an external collaborator. Hosts typically run this once via whatever
//! migration mechanism they already have (`sqlx::migrate!`, a plain
//! `psql -f`, etc.).

/// `CREATE TABLE events (...)` plus the supporting indexes:
/// primary-key ordering on `sequence_number`, a GIN index over `payload`
/// for JSON-path predicate evaluation, and a secondary B-tree on
/// `event_type` for selective type filters.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    sequence_number BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    occurred_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    event_type      TEXT NOT NULL,
    payload         JSONB NOT NULL,
    metadata        JSONB NOT NULL DEFAULT '{}'::jsonb
);

CREATE INDEX IF NOT EXISTS events_payload_gin_idx ON events USING GIN (payload);
CREATE INDEX IF NOT EXISTS events_event_type_idx ON events (event_type);
"#;
