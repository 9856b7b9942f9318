use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Strict ISO 8601 layouts without an offset. Tried after RFC 3339.
const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ISO 8601 layouts carrying a numeric offset, as written by pandas
/// (`2021-03-01 00:00:00+00:00`).
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
];

/// Looser layouts accepted once a column has failed strict parsing.
const MIXED_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m-%d-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%Y-%m-%d",
];

/// Which parsing pass produced a timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampEncoding {
    Iso8601,
    Mixed,
}

fn naive_to_seconds(dt: NaiveDateTime) -> f64 {
    // Preserve subsecond precision via milliseconds
    dt.and_utc().timestamp_millis() as f64 / 1000.0
}

/// Parse a single ISO 8601 / RFC 3339 value to UTC seconds.
/// Values with an offset are converted to UTC; naive values are taken as UTC.
pub fn parse_iso8601(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis() as f64 / 1000.0);
    }
    for fmt in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.timestamp_millis() as f64 / 1000.0);
        }
    }
    for fmt in ISO_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive_to_seconds(dt));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(naive_to_seconds)
}

/// Parse a value using every layout we know, strict ones first.
pub fn parse_mixed(value: &str) -> Option<f64> {
    if let Some(ts) = parse_iso8601(value) {
        return Some(ts);
    }

    let value = value.trim();
    for fmt in MIXED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive_to_seconds(dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Some(naive_to_seconds(dt));
            }
        }
    }
    None
}

/// Parse a whole timestamp column.
///
/// The column is parsed strictly first. If any non-empty cell is rejected the
/// whole column is parsed again in mixed mode, so one dataset never ends up
/// with two interpretations of the same layout. Empty and unparseable cells
/// come back as `None`.
pub fn parse_column(values: &[String]) -> (Vec<Option<f64>>, TimestampEncoding) {
    let strict: Vec<Option<f64>> = values.iter().map(|s| parse_iso8601(s)).collect();
    let strict_ok = values
        .iter()
        .zip(&strict)
        .all(|(raw, parsed)| raw.trim().is_empty() || parsed.is_some());

    if strict_ok {
        return (strict, TimestampEncoding::Iso8601);
    }

    let mixed = values.iter().map(|s| parse_mixed(s)).collect();
    (mixed, TimestampEncoding::Mixed)
}

/// Format a Unix timestamp as a human-readable datetime string.
/// Shows milliseconds when the timestamp has a fractional component.
pub fn format_timestamp(ts: f64) -> String {
    let secs = ts.floor() as i64;
    let nanos = ((ts - ts.floor()) * 1_000_000_000.0) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos) {
        Some(dt) => {
            if nanos < 1_000_000 && secs % 60 == 0 {
                dt.format("%Y-%m-%d %H:%M").to_string()
            } else if nanos < 1_000_000 {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
            }
        }
        None => format!("{ts:.3}"),
    }
}

/// Date-only label used for axis ticks on long spans.
pub fn format_date(ts: f64) -> String {
    match DateTime::<Utc>::from_timestamp(ts.floor() as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => format!("{ts:.0}"),
    }
}
