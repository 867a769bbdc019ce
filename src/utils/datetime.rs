//! Date and time utility functions
//!
//! This module provides countdown formatting for the refresh timer and
//! due-date proximity helpers used for urgency display and move locks.

use chrono::{DateTime, Duration, Utc};

/// Format a number of seconds as `mm:ss` for countdown display.
///
/// Minutes are not wrapped into hours, so `3600` renders as `60:00`.
pub fn format_countdown(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Signed time remaining until `due`, negative once it has passed.
pub fn time_until(due: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    due - now
}

/// True when `due` has passed or falls within `window_hours` of `now`.
pub fn is_within_hours(due: DateTime<Utc>, now: DateTime<Utc>, window_hours: i64) -> bool {
    time_until(due, now) <= Duration::hours(window_hours)
}

/// True when `due` is strictly in the past.
pub fn is_past(due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due < now
}
