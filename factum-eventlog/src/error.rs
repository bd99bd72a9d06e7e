use thiserror::Error;

/// Errors surfaced by the event log. All of these collapse into
/// `CommandResult::SystemError` at the `factum-runtime` boundary — none of
/// them are retried internally (conflicts are not errors; they are the
/// [`crate::AppendOutcome::Conflict`] variant).
#[derive(Debug, Error)]
pub enum EventLogError {
    /// Connection or query failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored payload or metadata value could not be encoded/decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The append statement reported success but the row count returned
    /// did not match the requested batch size (and it wasn't a conflict).
    #[error("expected to insert {expected} rows, inserted {actual}")]
    RowMismatch { expected: usize, actual: usize },
}
