use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Local};

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "30s", "500ms", "1.5m", "1h"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

/// Format a duration for display
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        "0s".to_string()
    } else if nanos < 1_000_000 {
        format!("{}µs", nanos / 1_000)
    } else if nanos < 1_000_000_000 {
        format!("{}ms", nanos / 1_000_000)
    } else if d.as_secs() < 60 {
        format!("{:.0}s", d.as_secs_f64())
    } else {
        format!("{}m{:02}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}

/// Format a response time given in milliseconds.
///
/// Non-positive and non-finite values render as "0 ms".
pub fn format_response_time(ms: f64) -> String {
    if !(ms > 0.0) || !ms.is_finite() {
        "0 ms".to_string()
    } else if ms < 1000.0 {
        format!("{:.0} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

/// Format a percentage with two decimals.
pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "0.00".to_string()
    }
}

/// Clamp a percentage into [0, 100] for display.
///
/// Takes the value by copy so the stored figure is never touched.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn local_time(timestamp_ms: i64) -> Option<DateTime<Local>> {
    if timestamp_ms <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(timestamp_ms).map(|dt| dt.with_timezone(&Local))
}

/// Local calendar date for an epoch-millis timestamp, "-" when unset.
pub fn format_date(timestamp_ms: i64) -> String {
    local_time(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Local date and time for an epoch-millis timestamp, "-" when unset.
pub fn format_datetime(timestamp_ms: i64) -> String {
    local_time(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
