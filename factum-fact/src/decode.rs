use thiserror::Error;

/// A stored event's `(event_type, payload)` could not be decoded into the
/// domain event type: the decoder is expected to be strict, rejecting
/// unknown type names rather than silently skipping them.
///
/// `sequence_number` identifies which stored event failed to decode, so a
/// `SystemError` message built from this error can say *which* row needs
/// attention. The user-supplied decode function has no way to know its own
/// event's sequence number, so it constructs this with [`DecodeError::new`]
/// (leaving `sequence_number` at its default) and the Composer fills it in
/// via [`DecodeError::at_sequence`] before propagating the error.
#[derive(Debug, Error)]
#[error("failed to decode event {sequence_number} of type {event_type:?}: {reason}")]
pub struct DecodeError {
    pub event_type: String,
    pub reason: String,
    pub sequence_number: i64,
}

impl DecodeError {
    pub fn new(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { event_type: event_type.into(), reason: reason.into(), sequence_number: 0 }
    }

    /// Attach the sequence number of the stored event that failed to decode.
    pub fn at_sequence(mut self, sequence_number: i64) -> Self {
        self.sequence_number = sequence_number;
        self
    }
}
