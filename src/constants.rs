//! Constants used throughout the queue engine
//!
//! This module centralizes magic strings, notification text, and timing
//! defaults to improve maintainability and consistency.

// Reserved values
/// Status label marking an Active task that does not count against the cap.
pub const ON_HOLD_STATUS: &str = "on hold";
/// Cap value the remote service uses to mean "unlimited".
pub const UNLIMITED_CAP_SENTINEL: u32 = 999;
/// Pill color filled in when an "on hold" play/pause response carries none.
pub const DEFAULT_ON_HOLD_PILL_COLOR: &str = "#F5A623";

// Polling defaults
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_POLL_MAX_TICKS: u32 = 10;

// Countdown defaults
pub const DEFAULT_COUNTDOWN_SECS: u64 = 5 * 60;
pub const DEFAULT_REFRESHING_HOLD_SECS: u64 = 2;

// Remote call defaults
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const MIN_HTTP_TIMEOUT_SECS: u64 = 10;
pub const MAX_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8_000;
pub const DEFAULT_RETRY_JITTER: f64 = 0.2;

/// Hours before the latest due date during which a started task is locked.
pub const LOCK_WINDOW_HOURS: i64 = 24;

// Default endpoints
pub const DEFAULT_DATA_URL: &str = "http://localhost:8080/api/queue";
pub const DEFAULT_REORDER_URL: &str = "http://localhost:8080/api/queue/reorder";
pub const DEFAULT_PLAY_PAUSE_URL: &str = "http://localhost:8080/api/queue/play-pause";

// Success Messages
pub const SUCCESS_QUEUE_LOADED: &str = "✅ Queue refreshed";
pub const SUCCESS_REORDER_APPLIED: &str = "✅ Queue order saved";
pub const SUCCESS_REORDER_CANCELLED: &str = "↩️ Queue order changes discarded";
pub const SUCCESS_TASK_PLAYED: &str = "✅ Task resumed";
pub const SUCCESS_TASK_PAUSED: &str = "✅ Task paused";

// Warning Messages
pub const WARNING_REORDER_FAILED: &str = "⚠️ Failed to save queue order";
pub const WARNING_RUN_STATE_FAILED: &str = "⚠️ Failed to change task state";
pub const WARNING_LOAD_FAILED: &str = "⚠️ Failed to load queue";
pub const WARNING_CAPACITY_REACHED: &str =
    "⚠️ Active queue is at capacity. Pause or finish a task before resuming another";
pub const WARNING_NOT_LOADED: &str = "⚠️ Queue has not been loaded yet";
pub const WARNING_REFRESH_REQUIRED: &str = "⚠️ Queue is out of date. Refresh before making changes";

/// Entries kept by the in-memory notice log before the oldest are dropped.
pub const MAX_LOG_ENTRIES: usize = 500;

// Log Messages
pub const LOG_FETCHED_SNAPSHOT: &str = "✅ Fetched queue snapshot";
pub const LOG_STALE_SNAPSHOT: &str = "⏭️ Discarding stale queue snapshot";
pub const LOG_POLL_TICK_FAILED: &str = "❌ Poll tick failed";
