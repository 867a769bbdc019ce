//! Task classification and ordering.
//!
//! Pure functions that split a task collection into its Active and Hold
//! buckets and compute the display/submission order of each bucket.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::constants::LOCK_WINDOW_HOURS;
use crate::entities::Task;
use crate::utils::datetime;

/// Tasks split by bucket, each side keeping input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    pub active: Vec<Task>,
    pub hold: Vec<Task>,
}

/// How close a task is to its latest due date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DueUrgency {
    Overdue,
    DueSoon,
    Later,
    Unscheduled,
}

/// Split `tasks` into Active (`active = true`) and Hold (everything else).
pub fn partition_tasks(tasks: &[Task]) -> Partition {
    let (active, hold): (Vec<Task>, Vec<Task>) = tasks.iter().cloned().partition(|t| t.active);
    Partition { active, hold }
}

/// Hold tasks sorted by ascending `position`.
///
/// The sort is stable, so equal positions keep their input order. A missing
/// position sorts after every present one.
pub fn hold_order(tasks: &[Task]) -> Vec<Task> {
    let mut hold: Vec<Task> = tasks.iter().filter(|t| !t.active).cloned().collect();
    hold.sort_by_key(|t| t.position.unwrap_or(i64::MAX));
    hold
}

/// Active tasks ordered by their index in the authoritative snapshot.
///
/// Tasks absent from the snapshot keep their relative order after the known ones.
pub fn active_order(tasks: &[Task], snapshot_tasks: &[Task]) -> Vec<Task> {
    let rank: HashMap<&str, usize> = snapshot_tasks
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.id.as_str(), idx))
        .collect();

    let mut active: Vec<Task> = tasks.iter().filter(|t| t.active).cloned().collect();
    active.sort_by_key(|t| rank.get(t.id.as_str()).copied().unwrap_or(usize::MAX));
    active
}

/// A working task occupies Active capacity: active and not marked "on hold".
pub fn is_working(task: &Task) -> bool {
    task.active && !task.is_on_hold()
}

pub fn count_working(tasks: &[Task]) -> u32 {
    tasks.iter().filter(|t| is_working(t)).count() as u32
}

/// Active but parked under the "on hold" status; eligible to be played.
pub fn is_hold_marked_active(task: &Task) -> bool {
    task.active && task.is_on_hold()
}

/// Started tasks close to (or past) their due date may not be moved.
pub fn is_locked(task: &Task, now: DateTime<Utc>) -> bool {
    if !task.has_tracked_time() {
        return false;
    }
    task.latest_due_date
        .map(|due| datetime::is_within_hours(due, now, LOCK_WINDOW_HOURS))
        .unwrap_or(false)
}

pub fn due_urgency(task: &Task, now: DateTime<Utc>) -> DueUrgency {
    match task.latest_due_date {
        None => DueUrgency::Unscheduled,
        Some(due) if datetime::is_past(due, now) => DueUrgency::Overdue,
        Some(due) if datetime::is_within_hours(due, now, LOCK_WINDOW_HOURS) => DueUrgency::DueSoon,
        Some(_) => DueUrgency::Later,
    }
}

/// 1-based rank of `task_id` inside its current bucket.
///
/// Active tasks are ranked by snapshot order, Hold tasks by position.
pub fn bucket_rank(task_id: &str, tasks: &[Task], snapshot_tasks: &[Task]) -> Option<usize> {
    let task = tasks.iter().find(|t| t.id == task_id)?;
    let bucket = if task.active {
        active_order(tasks, snapshot_tasks)
    } else {
        hold_order(tasks)
    };
    bucket.iter().position(|t| t.id == task_id).map(|idx| idx + 1)
}
