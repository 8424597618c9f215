//! The dynamically-typed value `args`/`kwargs` decode into.
//!
//! Per the Design Notes (spec.md §9), task arguments are modelled as a
//! recursive tagged variant over JSON values rather than leaning on
//! `serde_json::Value` directly everywhere — handlers narrow explicitly via
//! the `as_*` accessors below, and a narrowing mismatch is a handler error,
//! not a panic (mirrors the source's runtime `arg.(float64)` casts, but
//! without the panic).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::NarrowError;

/// A Celery task argument or keyword argument value.
///
/// Numbers always decode to `f64` (spec.md §4.1: "implementation chooses a
/// single numeric type"); integers round-trip exactly up to 2^53.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CeleryValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<CeleryValue>),
    Object(BTreeMap<String, CeleryValue>),
}

impl Default for CeleryValue {
    fn default() -> Self {
        Self::Null
    }
}

impl CeleryValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// # Errors
    /// Returns [`NarrowError`] if this value is not a [`CeleryValue::Number`].
    pub fn as_f64(&self) -> Result<f64, NarrowError> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(NarrowError {
                expected: "number",
                found: other.type_name(),
            }),
        }
    }

    /// # Errors
    /// Returns [`NarrowError`] if this value is not a [`CeleryValue::String`].
    pub fn as_str(&self) -> Result<&str, NarrowError> {
        match self {
            Self::String(s) => Ok(s.as_str()),
            other => Err(NarrowError {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// # Errors
    /// Returns [`NarrowError`] if this value is not a [`CeleryValue::Bool`].
    pub fn as_bool(&self) -> Result<bool, NarrowError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(NarrowError {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }

    /// # Errors
    /// Returns [`NarrowError`] if this value is not a [`CeleryValue::Array`].
    pub fn as_array(&self) -> Result<&[CeleryValue], NarrowError> {
        match self {
            Self::Array(a) => Ok(a.as_slice()),
            other => Err(NarrowError {
                expected: "array",
                found: other.type_name(),
            }),
        }
    }

    /// # Errors
    /// Returns [`NarrowError`] if this value is not a [`CeleryValue::Object`].
    pub fn as_object(&self) -> Result<&BTreeMap<String, CeleryValue>, NarrowError> {
        match self {
            Self::Object(o) => Ok(o),
            other => Err(NarrowError {
                expected: "object",
                found: other.type_name(),
            }),
        }
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

impl From<f64> for CeleryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for CeleryValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for CeleryValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<bool> for CeleryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
