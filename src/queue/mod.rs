//! Pure queue logic: bucket classification, ordering and admission.
//!
//! Nothing in here performs I/O or owns state; the reconciliation engine in
//! [`crate::sync`] builds on these functions.

pub mod capacity;
pub mod classify;

pub use capacity::{can_admit_one_more, has_open_capacity, is_play_blocked, open_slots};
pub use classify::{
    active_order, bucket_rank, count_working, due_urgency, hold_order, is_hold_marked_active, is_locked,
    is_working, partition_tasks, DueUrgency, Partition,
};
