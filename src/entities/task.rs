use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::ON_HOLD_STATUS;

/// One unit of work in an account's queue, as reported by the remote service.
///
/// `active` selects the bucket: `true` for Active (assigned for work),
/// `false` for Hold (queued). `position` only carries meaning inside the
/// Hold bucket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub latest_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_time_tracked: f64,
    #[serde(default)]
    pub changed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_pill_color: Option<String>,
}

impl Task {
    /// Create a task with the given identity and bucket; everything else defaults.
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: status.into(),
            active,
            position: None,
            latest_due_date: None,
            total_time_tracked: 0.0,
            changed_at: None,
            status_pill_color: None,
        }
    }

    /// Builder-style helper used by hosts and tests to set the hold rank.
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// True when the status carries the reserved `"on hold"` label.
    ///
    /// The comparison ignores case and surrounding whitespace.
    pub fn is_on_hold(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(ON_HOLD_STATUS)
    }

    /// True once any work has been logged against the task.
    pub fn has_tracked_time(&self) -> bool {
        self.total_time_tracked > 0.0
    }
}
