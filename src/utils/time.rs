//! Report clock helpers

use std::sync::atomic::{AtomicI64, Ordering};

static LAST_TIMESTAMP_MS: AtomicI64 = AtomicI64::new(0);

/// Current wall-clock time in milliseconds, clamped so successive calls
/// within this process never go backwards.
pub fn monotonic_millis() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let prev = LAST_TIMESTAMP_MS.fetch_max(now, Ordering::SeqCst);
    now.max(prev)
}
