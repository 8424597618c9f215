//! Celery-compatible JSON envelope codec.
//!
//! Encodes/decodes the task and result shapes described in spec.md §3/§4.1:
//! the dynamically-typed [`CeleryValue`], the Celery timestamp format
//! ([`CeleryDateTime`]), the inbound [`TaskEnvelope`], and the outbound
//! [`ResultEnvelope`].

pub mod datetime;
pub mod envelope;
pub mod error;
pub mod result;
pub mod value;

pub use datetime::CeleryDateTime;
pub use envelope::TaskEnvelope;
pub use error::{DecodeError, NarrowError};
pub use result::{ResultEnvelope, ResultStatus};
pub use value::CeleryValue;
