//! Timestamp helpers

use crate::error::{Result, SecOpsError};
use chrono::{DateTime, Duration, Utc};

/// Default lookback when neither a start time nor a window is configured
pub const DEFAULT_TIME_WINDOW_HOURS: i64 = 24;

/// Serialize a timestamp the way the API expects: RFC 3339, microseconds, `Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parse an RFC 3339 timestamp (`2024-01-15T10:30:00Z`, offsets allowed)
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SecOpsError::validation(format!("invalid timestamp '{value}': {e}")))
}

/// Validate a lookback window in hours and turn it into a duration
pub fn window_duration(hours: i64) -> Result<Duration> {
    if hours <= 0 {
        return Err(SecOpsError::validation(
            "time window must be a positive number of hours",
        ));
    }
    Duration::try_hours(hours).ok_or_else(|| {
        SecOpsError::validation(format!("time window of {hours} hours is too large"))
    })
}

/// Resolve a time range from optional bounds and a window in hours.
///
/// `end` defaults to `now`; `start` defaults to `end - window`.
pub fn resolve_time_range(
    start: Option<&str>,
    end: Option<&str>,
    window_hours: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end = match end {
        Some(v) => parse_timestamp(v)?,
        None => now,
    };
    let start = match start {
        Some(v) => parse_timestamp(v)?,
        None => {
            let hours = window_hours.unwrap_or(DEFAULT_TIME_WINDOW_HOURS);
            end.checked_sub_signed(window_duration(hours)?)
                .ok_or_else(|| {
                    SecOpsError::validation(format!(
                        "time window of {hours} hours starts before the earliest supported date"
                    ))
                })?
        }
    };
    Ok((start, end))
}

/// Reject ranges where `end` does not come strictly after `start`
pub fn require_ordered(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(SecOpsError::validation("End time must be after start time"));
    }
    Ok(())
}
