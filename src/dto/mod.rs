pub mod admin;
pub mod auth;
pub mod bookings;
pub mod notifications;
pub mod shows;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Accepts RFC 3339, a `datetime-local` style `YYYY-MM-DDTHH:MM[:SS]` (read as
/// UTC) or a bare `YYYY-MM-DD` (midnight UTC). Always normalized to UTC so
/// stored timestamps compare correctly on every backend.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
