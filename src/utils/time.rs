//! Timestamp formats used on the wire
//!
//! The catalog API takes hour-truncated bounds with millisecond padding and a
//! numeric offset, while XMLTV wants the compact `YYYYMMDDHHMMSS ±ZZZZ` form.

use std::fmt::Display;

use chrono::{DateTime, FixedOffset, TimeZone};

/// Query window bound, e.g. `2024-05-01 10:00:00.000+0000`
pub const QUERY_BOUND_FORMAT: &str = "%Y-%m-%d %H:00:00.000%z";

/// XMLTV programme time, e.g. `20240501100000 +0000`
pub const XMLTV_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Format a query window bound, truncating to the hour
pub fn format_query_bound<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(QUERY_BOUND_FORMAT).to_string()
}

/// Format a timestamp for an XMLTV `start`/`stop` attribute, keeping its offset
pub fn format_xmltv<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(XMLTV_FORMAT).to_string()
}

/// Parse an upstream programme timestamp (RFC 3339)
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_query_bound_truncates_to_hour() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 42, 17).unwrap();
        assert_eq!(format_query_bound(&at), "2024-05-01 10:00:00.000+0000");
    }

    #[test]
    fn test_xmltv_keeps_source_offset() {
        let parsed = parse_timestamp("2024-05-01T10:30:00.000+02:00").unwrap();
        assert_eq!(format_xmltv(&parsed), "20240501103000 +0200");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("tomorrow-ish").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
