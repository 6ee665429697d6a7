//! Fixed UTC+7 (Asia/Jakarta) display conversion.
//!
//! Stored timestamps are UTC. Responses render them with a `+07:00` offset so
//! clients see local wall-clock time while the instant stays the same. The
//! conversion never consults the host's local timezone.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};

use crate::error::{Error, Result};

/// Offset of Jakarta from UTC, in seconds.
pub const JAKARTA_OFFSET_SECONDS: i32 = 7 * 60 * 60;

pub fn jakarta_offset() -> FixedOffset {
    // 7h is always within the valid ±24h range
    FixedOffset::east_opt(JAKARTA_OFFSET_SECONDS).unwrap_or(Utc.fix())
}

/// Renders a UTC instant at the Jakarta offset.
pub fn to_jakarta(utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    utc.with_timezone(&jakarta_offset())
}

/// RFC 3339 rendering of `utc` at the Jakarta offset, microsecond precision
/// to match what the store keeps.
///
/// `2024-01-01T03:00:00Z` becomes `2024-01-01T10:00:00.000000+07:00`.
pub fn to_jakarta_time(utc: DateTime<Utc>) -> String {
    to_jakarta(utc).to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parses a Jakarta display timestamp back to UTC.
///
/// Input carrying an explicit offset (`...+07:00`, `...Z`) is honored as is.
/// Input without an offset is read as Jakarta wall-clock time.
pub fn from_jakarta_time(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return jakarta_offset()
                .from_local_datetime(&naive)
                .single()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| Error::InvalidParameter(format!("Ambiguous timestamp: {}", value)));
        }
    }

    Err(Error::InvalidParameter(format!("Invalid timestamp: {}", value)))
}

/// Current instant rendered at the Jakarta offset.
pub fn current_jakarta_time() -> String {
    to_jakarta_time(Utc::now())
}
