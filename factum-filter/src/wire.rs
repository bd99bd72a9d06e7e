use serde::Serialize;
use serde_json::{Map, Value};

use crate::fact_id::FactId;

/// The wire form of a [`crate::Clause`]: `event_type` plus a compiled
/// JSON-path expression and its bound parameters, with an optional
/// `fact_id` tag.
///
/// This is what actually crosses the process boundary to Postgres (as one
/// element of the `jsonb` filter array parameter) — clauses themselves
/// never serialize directly, since the JSON-path string is a derived,
/// compile-at-query-time artifact of the predicate list, not part of the
/// clause's own identity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireClause {
    pub event_type: String,
    pub filter: String,
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_id: Option<FactId>,
}
