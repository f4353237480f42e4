//! Date helpers
//!
//! Status and queue records carry calendar dates. Older records may hold full
//! RFC 3339 timestamps; those are truncated to their UTC date on load.

use chrono::{DateTime, NaiveDate, Utc};

/// Current UTC calendar date
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).date_naive())
}

/// Serde adapter writing `YYYY-MM-DD` and reading via [`parse_date`]
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("not an ISO-8601 date: {raw:?}")))
    }
}
