//! Fact / Context Composer
//!
//! A [`Fact`] pairs an [`factum_filter::EventFilter`] with a reducer over a
//! domain-specific event type; a [`Composer`] merges many Facts into one
//! tagged query against an [`factum_eventlog::EventLog`] and routes each
//! returned event back only to the Facts whose filter it satisfied, so a
//! single round trip serves every Fact without any Fact observing an event
//! outside its own filter.

mod composer;
mod decode;
mod fact;

pub use composer::{ComposeError, Composer};
pub use decode::DecodeError;
pub use fact::{new_fact, Fact};
pub use factum_filter::FactId;
