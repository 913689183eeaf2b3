//! Wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in microseconds since the Unix epoch (0 if the clock is before it).
#[inline]
pub fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
