//! The outbound Celery result envelope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::CeleryValue;

/// Result status. Only `Success` is ever emitted by this worker
/// (spec.md §3: "only `SUCCESS` is emitted").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    #[serde(rename = "SUCCESS")]
    Success,
}

/// The JSON body published to a task's reply queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub status: ResultStatus,
    #[serde(default)]
    pub traceback: Vec<String>,
    pub result: CeleryValue,
    pub task_id: Uuid,
    #[serde(default)]
    pub children: Vec<String>,
}

impl ResultEnvelope {
    /// Build the single result shape this worker ever emits: a successful
    /// result for `task_id`, no traceback, no children.
    #[must_use]
    pub const fn success(task_id: Uuid, result: CeleryValue) -> Self {
        Self {
            status: ResultStatus::Success,
            traceback: Vec::new(),
            result,
            task_id,
            children: Vec::new(),
        }
    }

    /// # Errors
    /// Returns a [`serde_json::Error`] if encoding fails (never expected in
    /// practice, since [`CeleryValue`] always encodes).
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn success_result_has_exact_key_set() {
        let id = Uuid::parse_str("d3858e68-48da-4631-b42b-7dbd0ffa08d1").unwrap();
        let envelope = ResultEnvelope::success(id, CeleryValue::Number(3.0));
        let encoded = envelope.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        let keys: BTreeSet<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> =
            ["status", "traceback", "result", "task_id", "children"]
                .into_iter()
                .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn matches_the_spec_example_body() {
        let id = Uuid::parse_str("d3858e68-48da-4631-b42b-7dbd0ffa08d1").unwrap();
        let envelope = ResultEnvelope::success(id, CeleryValue::Number(3.0));
        let value: serde_json::Value =
            serde_json::from_slice(&envelope.encode().unwrap()).unwrap();
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["result"], 3.0);
        assert_eq!(value["task_id"], "d3858e68-48da-4631-b42b-7dbd0ffa08d1");
        assert_eq!(value["traceback"], serde_json::json!([]));
        assert_eq!(value["children"], serde_json::json!([]));
    }

    #[test]
    fn round_trips_encode_decode() {
        let id = Uuid::new_v4();
        let original = ResultEnvelope::success(id, CeleryValue::String("done".into()));
        let encoded = original.encode().unwrap();
        let decoded: ResultEnvelope = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded.task_id, original.task_id);
        assert_eq!(decoded.result, original.result);
        assert_eq!(decoded.status, original.status);
    }
}
