//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert fractional seconds to a duration
///
/// Negative, NaN and infinite inputs map to zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Signed seconds from `earlier` to `later`
pub fn seconds_between(earlier: &DateTime<Utc>, later: &DateTime<Utc>) -> f64 {
    let delta = *later - *earlier;
    delta.num_milliseconds() as f64 / 1000.0
}

/// UTC filename stamp, `yyyy-MM-dd HH-mm-ss`
pub fn filename_stamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H-%M-%S").to_string()
}
