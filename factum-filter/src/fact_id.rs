use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT: AtomicU64 = AtomicU64::new(1);

/// A process-unique opaque identifier for a Fact.
///
/// Only needs to be unique within the process lifetime — it never survives
/// a restart and is never persisted. An atomic counter is the simplest
/// thing that satisfies that, and avoids pulling a UUID dependency into the
/// hot path for an id nothing ever writes to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(u64);

impl FactId {
    /// Mint a fresh, process-unique Fact id.
    pub fn new() -> Self {
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Construct a `FactId` from a known raw value.
    ///
    /// Exposed for tests that need deterministic, reproducible ids; regular
    /// callers should use [`FactId::new`].
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[cfg(test)]
    pub(crate) fn for_test(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl Default for FactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact-{}", self.0)
    }
}

impl Serialize for FactId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Error parsing an opaque `fact_id` string back into a [`FactId`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid fact id tag: {0:?}")]
pub struct ParseFactIdError(String);

impl FromStr for FactId {
    type Err = ParseFactIdError;

    /// Inverse of [`FactId::to_string`] — parses the `"fact-<n>"` tag a
    /// storage backend hands back in an event's fact-id array.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("fact-")
            .and_then(|n| n.parse::<u64>().ok())
            .map(FactId)
            .ok_or_else(|| ParseFactIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_in_process() {
        let a = FactId::new();
        let b = FactId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn displays_as_opaque_tag() {
        let id = FactId::from_raw(42);
        assert_eq!(id.to_string(), "fact-42");
    }
}
