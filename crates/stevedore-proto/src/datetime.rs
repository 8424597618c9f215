//! The Celery timestamp format: `YYYY-MM-DDTHH:MM:SS.nnnnnnnnn`, no timezone.
//!
//! `eta`/`expires` are optional in the wire envelope; `null` is the zero/unset
//! value (spec.md §3). We represent that as `Option<CeleryDateTime>` rather
//! than inventing a sentinel "zero" timestamp — `None` is the zero value,
//! which is the idiomatic Rust reading of the source's Go zero-`time.Time`
//! convention (see DESIGN.md, Open Question: Celery datetime zero value).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

/// A parsed Celery-formatted timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CeleryDateTime(pub NaiveDateTime);

impl CeleryDateTime {
    /// # Errors
    /// Returns a [`chrono::ParseError`] if `s` does not match
    /// `YYYY-MM-DDTHH:MM:SS.nnnnnnnnn`.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT).map(Self)
    }

    #[must_use]
    pub fn format(&self) -> String {
        self.0.format(FORMAT).to_string()
    }
}

impl From<NaiveDateTime> for CeleryDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self(dt)
    }
}

impl Serialize for CeleryDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for CeleryDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "celery_datetime_opt")]` helper: `None` ⇔ JSON `null`.
pub mod celery_datetime_opt {
    use super::CeleryDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<CeleryDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => dt.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<CeleryDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<CeleryDateTime>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn round_trips_through_format_and_parse() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_nano_opt(12, 34, 56, 123_456_789)
            .unwrap();
        let celery = CeleryDateTime(dt);
        let formatted = celery.format();
        assert_eq!(formatted, "2024-03-07T12:34:56.123456789");
        assert_eq!(CeleryDateTime::parse(&formatted).unwrap(), celery);
    }

    #[test]
    fn null_round_trips_to_none() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "celery_datetime_opt")]
            eta: Option<CeleryDateTime>,
        }

        let decoded: Wrapper = serde_json::from_str(r#"{"eta": null}"#).unwrap();
        assert!(decoded.eta.is_none());

        let encoded = serde_json::to_string(&decoded).unwrap();
        assert_eq!(encoded, r#"{"eta":null}"#);
    }

    #[test]
    fn rejects_malformed_timestamp() {
        assert!(CeleryDateTime::parse("not-a-date").is_err());
        assert!(CeleryDateTime::parse("2024-03-07T12:34:56").is_err());
    }
}
