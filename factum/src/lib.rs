//! An aggregateless event-sourcing engine backed by a relational event
//! log.
//!
//! There is no aggregate boundary: every event lives in one global,
//! append-only log (`factum_eventlog`). A command handler rebuilds
//! whatever slice of history it needs on every attempt by composing
//! [`Fact`]s — isolated `(filter, reducer)` pairs — into a typed
//! `Context`, runs user-supplied business logic against that context, and
//! appends the resulting events with optimistic concurrency control,
//! retrying automatically when another writer's events conflict with the
//! filter the context was built from.
//!
//! ```text
//! EventFilter ---\
//!                 +--> Fact --\
//! EventFilter ---/             +--> Composer --> Context --> execute() --> CommandHandler --> EventLog
//! EventFilter ---\             /
//!                 +--> Fact --/
//! EventFilter ---/
//! ```
//!
//! This crate only re-exports; the substance lives in `factum-filter`
//! (declarative event subsets), `factum-eventlog` (the log itself),
//! `factum-fact` (Fact and Composer), and `factum-runtime` (the command
//! handler state machine). A host wires these together: construct a
//! `PgEventLog` from its own connection pool, build one `CommandHandler`
//! per command type, and call `handle` with a database handle, the
//! command, and a metadata map.

pub use factum_eventlog::{
    AppendOutcome, EventLog, EventLogError, PgEventLog, StoredEvent, StoredEventInput, TaggedClause, TaggedEvent,
    SCHEMA_SQL,
};
pub use factum_fact::{new_fact, ComposeError, Composer, DecodeError, Fact, FactId};
pub use factum_filter::{
    attr_bool, attr_float, attr_int, attr_string, AttributePredicate, Clause, EventFilter, FilterError,
    PredicateValue, WireClause,
};
pub use factum_runtime::{CommandHandler, CommandResult, RetryConfig, RuntimeError};
