//! Event Filter
//!
//! Declarative, composable descriptions of subsets of the event log.
//!
//! A filter is a disjunction of [`Clause`]s; a clause is an `event_type`
//! plus a conjunction of [`AttributePredicate`]s over the event payload. The
//! empty filter ([`EventFilter::empty`]) matches nothing.
//!
//! Filters never touch a database directly. [`Clause::to_wire`] compiles a
//! clause to the JSON-path + bound-params shape the storage layer sends to
//! Postgres; [`Clause::matches`] evaluates the same predicate model directly
//! against a `serde_json::Value`, so an in-memory event log (see
//! `factum-testkit`) can apply identical semantics without a jsonpath
//! engine.

mod clause;
mod fact_id;
mod predicate;
mod wire;

pub use clause::Clause;
pub use fact_id::{FactId, ParseFactIdError};
pub use predicate::{attr_bool, attr_float, attr_int, attr_string, AttributePredicate, PredicateValue};
pub use wire::WireClause;

use serde_json::Value;

/// Reserved for future clause-construction failures (e.g. path validation).
/// Currently uninhabited — no constructor in this crate can fail yet, but
/// keeping the type in the public API means adding validation later is not
/// a breaking change.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {}

/// A declarative subset of the event log: a disjunction of [`Clause`]s.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    clauses: Vec<Clause>,
}

impl EventFilter {
    /// The filter that matches nothing.
    pub fn empty() -> Self {
        Self { clauses: Vec::new() }
    }

    /// Add one clause matching `event_type` with all of `predicates`
    /// conjoined. Calling this multiple times (same or different type)
    /// adds disjoint clauses — an event matches the filter if it matches
    /// *any* clause.
    pub fn for_type(mut self, event_type: impl Into<String>, predicates: Vec<AttributePredicate>) -> Self {
        self.clauses.push(Clause::new(event_type, predicates));
        self
    }

    /// The clauses that make up this filter, in declaration order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True iff this filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Does `event_type`/`payload` match at least one clause?
    pub fn matches(&self, event_type: &str, payload: &Value) -> bool {
        self.clauses.iter().any(|c| c.matches(event_type, payload))
    }

    /// Tag every clause of this filter with `fact_id`, consuming self.
    pub fn tagged(self, fact_id: FactId) -> Vec<(FactId, Clause)> {
        self.clauses.into_iter().map(|c| (fact_id, c)).collect()
    }
}

/// Union of several Facts' filters, each clause tagged with its owning
/// Fact's id. Duplicate clauses (from distinct facts or the same fact) are
/// **not** de-duplicated — the per-event tag set produced by the event log
/// is what lets the composer recover, for each event, the set of facts it
/// satisfies.
pub fn union(filters: impl IntoIterator<Item = (FactId, EventFilter)>) -> Vec<(FactId, Clause)> {
    filters.into_iter().flat_map(|(id, f)| f.tagged(id)).collect()
}
