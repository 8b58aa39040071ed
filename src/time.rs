//! Wall-clock helpers
//!
//! Deadlines are absolute milliseconds since the Unix epoch.

use chrono::Utc;

/// Current time in milliseconds since the Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Absolute deadline for a relative duration, or `None` for the
/// "no expiry" sentinel (`duration_ms <= 0`).
#[inline]
pub fn deadline_after(duration_ms: i64) -> Option<u64> {
    if duration_ms > 0 {
        Some(now_ms().saturating_add(duration_ms as u64))
    } else {
        None
    }
}

/// Milliseconds left until `deadline_ms`, saturating at zero.
#[inline]
pub fn remaining_ms(deadline_ms: u64) -> u64 {
    deadline_ms.saturating_sub(now_ms())
}
