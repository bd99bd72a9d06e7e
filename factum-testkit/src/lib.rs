//! In-memory event log and seeding helpers.
//!
//! [`InMemoryEventLog`] implements `factum_eventlog::EventLog` over a
//! `Mutex<Vec<StoredEvent>>`, applying the same predicate model the
//! Postgres implementation compiles to jsonpath (`factum_filter::Clause::
//! matches`), so a filter behaves identically against either backend.

mod memory;
mod tracing_init;

pub use memory::{event_input, seed, InMemoryEventLog};
pub use tracing_init::init_test_tracing;
