// src/timestamps.rs
//! RFC 3339 timestamps and durations as the scanners report them

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// RFC 3339 timestamp for epoch `seconds`, already in UTC.
///
/// Fractional seconds are printed as six digits of microseconds, and only
/// when present. Zero means "no time" and yields `None`.
pub fn utc_timestamp(seconds: f64) -> Option<String> {
    if seconds == 0.0 || !seconds.is_finite() {
        return None;
    }

    let micros = (seconds * 1_000_000.0).round() as i64;
    let dt = DateTime::<Utc>::from_timestamp_micros(micros)?;
    let format = if micros % 1_000_000 == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    Some(dt.to_rfc3339_opts(format, true))
}

/// Parse an RFC 3339 timestamp back into epoch seconds
pub fn utc_timestamp_to_local_now(timestamp: &str) -> Result<f64> {
    let dt = DateTime::parse_from_rfc3339(timestamp)
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", timestamp))?;
    Ok(dt.timestamp_micros() as f64 / 1_000_000.0)
}

/// Now, in epoch seconds with microseconds
pub fn local_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Format a duration down to microseconds, cutting off float noise
pub fn just_microseconds(duration: Option<f64>) -> Option<String> {
    duration.map(|d| format!("{:.6}", d))
}
