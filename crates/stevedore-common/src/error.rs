//! Error types shared across the worker.
//!
//! Mirrors the layering used elsewhere in this codebase: a small, specific
//! error enum per concern, composed with `#[from]` rather than flattened
//! into one grab-bag type.

use thiserror::Error;

/// Errors raised while assembling a [`crate::config::WorkerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported broker scheme: {0:?}")]
    UnsupportedScheme(String),

    #[error("broker URI has no scheme: {0:?}")]
    MissingScheme(String),

    #[error("broker URI list is empty")]
    EmptyUriList,
}
