//! Decode/narrowing errors for the envelope codec.

use thiserror::Error;

/// Errors decoding an inbound task body.
///
/// Kept distinct from [`NarrowError`] because the two are handled
/// differently by the consumer: a `DecodeError` means the message itself is
/// unreadable (reject, no requeue, per spec.md §4.1); a `NarrowError` is a
/// handler-level error raised while narrowing an already-decoded value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid celery timestamp {0:?}: {1}")]
    BadTimestamp(String, chrono::ParseError),

    #[error("invalid task id {0:?}: {1}")]
    BadTaskId(String, uuid::Error),
}

/// Raised when a handler narrows a [`crate::value::CeleryValue`] to a
/// concrete type and the shape doesn't match.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("expected {expected}, found {found}")]
pub struct NarrowError {
    pub expected: &'static str,
    pub found: &'static str,
}
