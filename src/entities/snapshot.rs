use serde::{Deserialize, Serialize};

use super::task::Task;
use crate::constants::UNLIMITED_CAP_SENTINEL;

/// Concurrency limit for the Active bucket.
///
/// The remote service encodes "no limit" as the integer sentinel `999`; it is
/// decoded into [`Cap::Unlimited`] at the boundary and encoded back on output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Cap {
    Limited(u32),
    Unlimited,
}

impl Cap {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Cap::Unlimited)
    }

    /// The finite limit, or `None` when unlimited.
    pub fn limit(&self) -> Option<u32> {
        match self {
            Cap::Limited(n) => Some(*n),
            Cap::Unlimited => None,
        }
    }
}

impl Default for Cap {
    fn default() -> Self {
        Cap::Unlimited
    }
}

impl From<u32> for Cap {
    fn from(value: u32) -> Self {
        if value == UNLIMITED_CAP_SENTINEL {
            Cap::Unlimited
        } else {
            Cap::Limited(value)
        }
    }
}

impl From<Cap> for u32 {
    fn from(cap: Cap) -> Self {
        match cap {
            Cap::Limited(n) => n,
            Cap::Unlimited => UNLIMITED_CAP_SENTINEL,
        }
    }
}

/// Last server-confirmed queue state for one account.
///
/// Field names follow the fetch payload of the queue-data endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub cap: Cap,
    #[serde(default)]
    pub active_task_count: u32,
    #[serde(default, rename = "organizationName")]
    pub org_label: String,
}

impl QueueSnapshot {
    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}
