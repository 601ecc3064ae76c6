//! Bounded exponential backoff for rate-limited requests.

use std::time::Duration;

/// Base delay of the backoff schedule.
pub(crate) const BACKOFF_BASE: Duration = Duration::from_millis(200);

/// Delay before retrying a zero-based `attempt`: `200 ms · 2^attempt`.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_BASE.saturating_mul(1u32 << attempt.min(20))
}
