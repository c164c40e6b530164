//! Wall-clock helper.
//!
//! Request expiry, session `timeoutAt`, and every action-record
//! timestamp are *absolute epoch milliseconds* — they are persisted and
//! compared against values produced by other processes, so the monotonic
//! clock is the wrong tool here.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
///
/// A clock set before 1970 yields 0 rather than a panic.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
