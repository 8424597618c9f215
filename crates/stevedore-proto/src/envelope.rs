//! The inbound Celery task envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{datetime::celery_datetime_opt, value::CeleryValue, CeleryDateTime};

/// A decoded Celery task message body.
///
/// This is the codec-level view only: the out-of-band `receipt` handle that
/// binds a decoded task to its broker delivery (spec.md §3) is attached by
/// the broker consumer after decoding, not by this crate — the codec has no
/// notion of a broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task: String,
    pub id: Uuid,
    #[serde(default)]
    pub args: Vec<CeleryValue>,
    #[serde(default)]
    pub kwargs: BTreeMap<String, CeleryValue>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, with = "celery_datetime_opt")]
    pub eta: Option<CeleryDateTime>,
    #[serde(default, with = "celery_datetime_opt")]
    pub expires: Option<CeleryDateTime>,
}

/// Wire-shape twin of [`TaskEnvelope`] with `id`/`eta`/`expires` left as raw
/// strings, so `decode` can distinguish "not JSON at all" from "JSON, but
/// the id isn't a UUID" or "JSON, but the timestamp doesn't parse" rather
/// than collapsing every failure into [`crate::error::DecodeError::Json`].
#[derive(Debug, Deserialize)]
struct RawTaskEnvelope {
    task: String,
    id: String,
    #[serde(default)]
    args: Vec<CeleryValue>,
    #[serde(default)]
    kwargs: BTreeMap<String, CeleryValue>,
    #[serde(default)]
    retries: u32,
    #[serde(default)]
    eta: Option<String>,
    #[serde(default)]
    expires: Option<String>,
}

fn parse_timestamp(raw: Option<String>) -> Result<Option<CeleryDateTime>, crate::error::DecodeError> {
    raw.map(|s| {
        CeleryDateTime::parse(&s).map_err(|err| crate::error::DecodeError::BadTimestamp(s, err))
    })
    .transpose()
}

impl TaskEnvelope {
    /// Decode a task envelope from a JSON body.
    ///
    /// # Errors
    /// Returns [`crate::error::DecodeError::Json`] if `body` is not valid
    /// JSON or does not match the envelope shape; [`crate::error::DecodeError::BadTaskId`]
    /// if the JSON is well-formed but `id` isn't a UUID; or
    /// [`crate::error::DecodeError::BadTimestamp`] if `eta`/`expires` is
    /// present but not a valid Celery timestamp.
    pub fn decode(body: &[u8]) -> Result<Self, crate::error::DecodeError> {
        let raw: RawTaskEnvelope = serde_json::from_slice(body)?;

        let id = Uuid::parse_str(&raw.id)
            .map_err(|err| crate::error::DecodeError::BadTaskId(raw.id.clone(), err))?;
        let eta = parse_timestamp(raw.eta)?;
        let expires = parse_timestamp(raw.expires)?;

        Ok(Self {
            task: raw.task,
            id,
            args: raw.args,
            kwargs: raw.kwargs,
            retries: raw.retries,
            eta,
            expires,
        })
    }

    /// The reply-queue name for this task: `id` with hyphens stripped.
    ///
    /// Per spec.md §3/§6: 32 lowercase hex characters.
    #[must_use]
    pub fn reply_queue_name(&self) -> String {
        self.id.simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_happy_path_envelope() {
        let body = br#"{"task":"myapp.add","id":"d3858e68-48da-4631-b42b-7dbd0ffa08d1",
            "args":[1.0,2.0],"kwargs":{},"retries":0,"eta":null,"expires":null}"#;
        let task = TaskEnvelope::decode(body).unwrap();
        assert_eq!(task.task, "myapp.add");
        assert_eq!(
            task.id.to_string(),
            "d3858e68-48da-4631-b42b-7dbd0ffa08d1"
        );
        assert_eq!(task.args.len(), 2);
        assert!(task.eta.is_none());
    }

    #[test]
    fn reply_queue_name_strips_hyphens() {
        let body = br#"{"task":"myapp.add","id":"d3858e68-48da-4631-b42b-7dbd0ffa08d1",
            "args":[],"kwargs":{}}"#;
        let task = TaskEnvelope::decode(body).unwrap();
        let name = task.reply_queue_name();
        assert_eq!(name, "d3858e6848da4631b42b7dbd0ffa08d1");
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn rejects_malformed_eta() {
        let body = br#"{"task":"myapp.add","id":"d3858e68-48da-4631-b42b-7dbd0ffa08d1",
            "args":[],"kwargs":{},"eta":"not-a-timestamp"}"#;
        let err = TaskEnvelope::decode(body).unwrap_err();
        assert!(matches!(err, crate::error::DecodeError::BadTimestamp(..)));
    }

    #[test]
    fn rejects_malformed_task_id() {
        let body = br#"{"task":"myapp.add","id":"not-a-uuid","args":[],"kwargs":{}}"#;
        let err = TaskEnvelope::decode(body).unwrap_err();
        assert!(matches!(err, crate::error::DecodeError::BadTaskId(..)));
    }

    #[test]
    fn rejects_non_json_body() {
        let err = TaskEnvelope::decode(b"not json at all").unwrap_err();
        assert!(matches!(err, crate::error::DecodeError::Json(_)));
    }
}
