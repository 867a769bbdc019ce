//! Capacity/admission policy for the Active bucket.

use super::classify::{count_working, is_hold_marked_active};
use crate::entities::{Cap, Task};

/// Whether the Active bucket has room for one more working task.
///
/// Always true when the cap is unlimited, including for an empty list.
pub fn can_admit_one_more(tasks: &[Task], cap: Cap) -> bool {
    match cap {
        Cap::Unlimited => true,
        Cap::Limited(limit) => count_working(tasks) < limit,
    }
}

/// Whether playing `task` must be refused locally.
///
/// Only a hold-marked-active task is gated; the remote service remains the
/// final authority for everything else.
pub fn is_play_blocked(task: &Task, tasks: &[Task], cap: Cap) -> bool {
    is_hold_marked_active(task) && !can_admit_one_more(tasks, cap)
}

/// Free working slots, or `None` when unlimited.
pub fn open_slots(tasks: &[Task], cap: Cap) -> Option<u32> {
    cap.limit().map(|limit| limit.saturating_sub(count_working(tasks)))
}

/// The countdown refresh only runs while a finite cap has room left.
pub fn has_open_capacity(working_count: u32, cap: Cap) -> bool {
    match cap {
        Cap::Unlimited => false,
        Cap::Limited(limit) => working_count < limit,
    }
}
