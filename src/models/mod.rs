pub mod member;
pub mod task;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 so that lexical order in SQL matches chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
