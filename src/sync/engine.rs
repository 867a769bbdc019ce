//! Queue reconciliation engine.
//!
//! [`QueueEngine`] owns the confirmed [`QueueSnapshot`] and the working task
//! list shown to the operator. It performs no I/O: every remote operation is
//! split into a `prepare`/`begin` step that yields the request and a
//! `complete` step that folds the response back in. The async orchestration
//! lives in [`crate::sync::QueueSession`].
//!
//! Reorders are staged locally and confirmed later (apply-then-confirm);
//! play/pause is sent first and applied only on success (confirm-then-apply).
//! Both share [`QueueEngine::rollback_to_snapshot`] as the recovery primitive.

use log::{debug, info, warn};

use super::outcome::{load_failed, Outcome, QueueError};
use crate::backend::{
    validate_reorder, BackendError, PlayPauseRequest, PlayPauseResponse, ReorderAck, ReorderEntry, RunAction,
};
use crate::constants::{
    LOG_STALE_SNAPSHOT, SUCCESS_REORDER_APPLIED, SUCCESS_REORDER_CANCELLED, SUCCESS_TASK_PAUSED,
    SUCCESS_TASK_PLAYED, WARNING_REORDER_FAILED, WARNING_RUN_STATE_FAILED,
};
use crate::entities::{Cap, QueueSnapshot, Task};
use crate::queue::{self, active_order, bucket_rank, count_working, hold_order, is_play_blocked};

/// Lifecycle of one account session.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    /// No data requested yet
    Idle,
    /// First fetch (or a fetch after an error) in flight
    Loading,
    /// Snapshot held, no local edits
    Ready,
    /// A staged reorder differs from the confirmed snapshot
    MutationPending,
    /// The last fetch failed; cleared by the next successful load
    Error { message: String },
}

/// Identifies one `load` so its response can be fenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub seq: u64,
    pub epoch: u64,
    pub account: String,
}

/// What the host should render.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueView {
    Loading,
    /// Nothing was ever loaded and the fetch failed: full-page error.
    FatalError { message: String },
    Queue {
        org_label: String,
        active: Vec<Task>,
        hold: Vec<Task>,
        cap: Cap,
        working: u32,
        /// Set when showing a fallback snapshot after a failed refresh
        stale: Option<String>,
    },
}

/// A staged Hold order on its way to the remote service.
///
/// Hand it back to [`QueueEngine::complete_reorder_submission`] with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderSubmission {
    pub id: u64,
    pub entries: Vec<ReorderEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StagedReorder {
    /// Id of the submission carrying this order, `None` until it is sent
    submission: Option<u64>,
}

pub struct QueueEngine {
    account: String,
    state: EngineState,
    snapshot: Option<QueueSnapshot>,
    tasks: Vec<Task>,
    staged: Option<StagedReorder>,
    fence_loads: bool,
    epoch: u64,
    issued_seq: u64,
    applied_seq: u64,
    submission_seq: u64,
}

impl QueueEngine {
    pub fn new(account: impl Into<String>, fence_loads: bool) -> Self {
        Self {
            account: account.into(),
            state: EngineState::Idle,
            snapshot: None,
            tasks: Vec::new(),
            staged: None,
            fence_loads,
            epoch: 0,
            issued_seq: 0,
            applied_seq: 0,
            submission_seq: 0,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&QueueSnapshot> {
        self.snapshot.as_ref()
    }

    /// Working task list, including any staged reorder.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn has_pending_mutation(&self) -> bool {
        self.staged.is_some()
    }

    pub fn cap(&self) -> Cap {
        self.snapshot.as_ref().map(|s| s.cap).unwrap_or_default()
    }

    pub fn active_tasks(&self) -> Vec<Task> {
        active_order(&self.tasks, self.snapshot_tasks())
    }

    pub fn hold_tasks(&self) -> Vec<Task> {
        hold_order(&self.tasks)
    }

    pub fn working_count(&self) -> u32 {
        count_working(&self.tasks)
    }

    pub fn open_slots(&self) -> Option<u32> {
        queue::open_slots(&self.tasks, self.cap())
    }

    pub fn view(&self) -> QueueView {
        match (&self.state, &self.snapshot) {
            (EngineState::Error { message }, None) => QueueView::FatalError {
                message: message.clone(),
            },
            (_, None) => QueueView::Loading,
            (state, Some(snapshot)) => QueueView::Queue {
                org_label: snapshot.org_label.clone(),
                active: self.active_tasks(),
                hold: self.hold_tasks(),
                cap: snapshot.cap,
                working: self.working_count(),
                stale: match state {
                    EngineState::Error { message } => Some(message.clone()),
                    _ => None,
                },
            },
        }
    }

    /// Forget everything and start over for `account`.
    ///
    /// Responses to loads issued before the reset are ignored.
    pub fn reset(&mut self, account: impl Into<String>) {
        self.account = account.into();
        self.state = EngineState::Idle;
        self.snapshot = None;
        self.tasks.clear();
        self.staged = None;
        self.epoch += 1;
        self.applied_seq = self.issued_seq;
    }

    /// Start a snapshot fetch.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_seq += 1;
        if matches!(self.state, EngineState::Idle | EngineState::Error { .. }) {
            self.state = EngineState::Loading;
        }
        LoadTicket {
            seq: self.issued_seq,
            epoch: self.epoch,
            account: self.account.clone(),
        }
    }

    /// Fold a fetch result into the engine.
    ///
    /// Success replaces the snapshot wholesale and drops any staged reorder.
    /// Failure keeps the previous snapshot for fallback display.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<QueueSnapshot, BackendError>) -> Outcome {
        if ticket.epoch != self.epoch {
            debug!("Ignoring load #{} for previous session of {}", ticket.seq, ticket.account);
            return Outcome::Unchanged;
        }
        if self.fence_loads && ticket.seq < self.applied_seq {
            info!("{} #{} (newest applied #{})", LOG_STALE_SNAPSHOT, ticket.seq, self.applied_seq);
            return Outcome::Unchanged;
        }
        self.applied_seq = self.applied_seq.max(ticket.seq);

        match result {
            Ok(snapshot) => {
                debug!(
                    "Applying snapshot #{} for {}: {} tasks, cap {:?}",
                    ticket.seq,
                    self.account,
                    snapshot.tasks.len(),
                    snapshot.cap
                );
                self.tasks = snapshot.tasks.clone();
                self.snapshot = Some(snapshot);
                self.staged = None;
                self.state = EngineState::Ready;
                Outcome::silent()
            }
            Err(e) => {
                warn!("❌ Failed to load queue for {}: {}", self.account, e);
                let err = load_failed(e);
                if self.snapshot.is_some() {
                    self.rollback_to_snapshot();
                }
                self.state = EngineState::Error { message: err.warning() };
                Outcome::Failed(err)
            }
        }
    }

    /// Move the Hold task at `from_index` to `to_index` (indices into the
    /// current Hold order) and renumber positions `1..=N`.
    ///
    /// Only stages the change; nothing is sent until
    /// [`prepare_reorder_submission`](Self::prepare_reorder_submission).
    pub fn reorder_hold(&mut self, from_index: usize, to_index: usize) -> Outcome {
        if let Err(e) = self.require_snapshot() {
            return Outcome::Failed(e);
        }
        if matches!(self.staged, Some(StagedReorder { submission: Some(_) })) {
            debug!("Reorder ignored while a submission is in flight");
            return Outcome::Unchanged;
        }

        let mut hold = self.hold_tasks();
        if from_index >= hold.len() || to_index >= hold.len() || from_index == to_index {
            return Outcome::Unchanged;
        }

        let moved = hold.remove(from_index);
        debug!("Staging move of {} from {} to {}", moved.id, from_index, to_index);
        hold.insert(to_index, moved);
        for (idx, task) in hold.iter_mut().enumerate() {
            task.position = Some(idx as i64 + 1);
        }

        let mut tasks = self.active_tasks();
        tasks.extend(hold);
        self.tasks = tasks;
        self.staged = Some(StagedReorder { submission: None });
        self.state = EngineState::MutationPending;
        Outcome::silent()
    }

    /// Build the reorder payload for the staged Hold order and mark it submitted.
    ///
    /// Returns the outcome to report instead when there is nothing valid to send.
    /// Positions are renumbered `1..=N` in Hold order, whatever the tasks carry.
    pub fn prepare_reorder_submission(&mut self) -> Result<ReorderSubmission, Outcome> {
        self.require_snapshot().map_err(Outcome::Failed)?;
        match self.staged {
            Some(StagedReorder { submission: None }) => {}
            _ => return Err(Outcome::Unchanged),
        }

        let entries: Vec<ReorderEntry> = self
            .hold_tasks()
            .into_iter()
            .enumerate()
            .map(|(idx, task)| ReorderEntry {
                position: idx as i64 + 1,
                task_id: task.id,
                active: task.active,
                status: task.status,
            })
            .collect();

        if let Err(e) = validate_reorder(&entries) {
            return Err(Outcome::Failed(QueueError::Validation(e.to_string())));
        }

        self.submission_seq += 1;
        self.staged = Some(StagedReorder {
            submission: Some(self.submission_seq),
        });
        Ok(ReorderSubmission {
            id: self.submission_seq,
            entries,
        })
    }

    /// Confirm or roll back a submitted reorder.
    ///
    /// Only touches local state while `submission` is still the staged one.
    /// A reload in the meantime drops it, and any edit staged after that
    /// stays pending.
    pub fn complete_reorder_submission(
        &mut self,
        submission: &ReorderSubmission,
        result: Result<ReorderAck, BackendError>,
    ) -> Outcome {
        let current = self.staged == Some(StagedReorder { submission: Some(submission.id) });
        if !current {
            debug!("Reorder #{} was superseded before its response arrived", submission.id);
        }

        match result {
            Ok(ack) => {
                info!("✅ Reorder confirmed for {} ({} tasks echoed)", self.account, ack.tasks.len());
                if current {
                    if let Some(snapshot) = self.snapshot.as_mut() {
                        snapshot.tasks = self.tasks.clone();
                    }
                    self.staged = None;
                    self.settle_state();
                }
                Outcome::done(SUCCESS_REORDER_APPLIED)
            }
            Err(e) => {
                warn!("❌ Reorder rejected for {}: {}", self.account, e);
                if current {
                    self.rollback_to_snapshot();
                    self.settle_state();
                }
                Outcome::Failed(QueueError::backend(WARNING_REORDER_FAILED, e))
            }
        }
    }

    /// Discard a staged reorder without contacting the remote service.
    pub fn cancel_pending_reorder(&mut self) -> Outcome {
        match self.staged {
            Some(StagedReorder { submission: None }) => {
                self.rollback_to_snapshot();
                self.settle_state();
                Outcome::done(SUCCESS_REORDER_CANCELLED)
            }
            _ => Outcome::Unchanged,
        }
    }

    /// Build the play/pause request for `task_id`, or the outcome to report
    /// instead when it must not be sent (unknown task, cap reached).
    pub fn prepare_run_state(&self, task_id: &str, to_active: bool) -> Result<PlayPauseRequest, Outcome> {
        let snapshot = self.require_snapshot().map_err(Outcome::Failed)?;
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| Outcome::Failed(QueueError::TaskNotFound(task_id.to_string())))?;

        let action = RunAction::for_target(to_active);
        if action == RunAction::Play && is_play_blocked(task, &self.tasks, snapshot.cap) {
            let working = self.working_count();
            warn!("⛔ Play of {} blocked: {} working, cap {:?}", task_id, working, snapshot.cap);
            return Err(Outcome::Failed(QueueError::CapacityExceeded {
                working,
                cap: snapshot.cap.into(),
            }));
        }

        let position = bucket_rank(task_id, &self.tasks, &snapshot.tasks)
            .ok_or_else(|| Outcome::Failed(QueueError::TaskNotFound(task_id.to_string())))?;

        Ok(PlayPauseRequest {
            action,
            task_id: task_id.to_string(),
            position: position as i64,
            view_id: self.account.clone(),
        })
    }

    /// Apply a confirmed play/pause to the task, or report the failure.
    ///
    /// Nothing was applied before the request, so failure needs no rollback.
    pub fn complete_run_state(
        &mut self,
        request: &PlayPauseRequest,
        result: Result<PlayPauseResponse, BackendError>,
    ) -> Outcome {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("❌ {} of {} failed: {}", request.action.as_str(), request.task_id, e);
                return Outcome::Failed(QueueError::backend(WARNING_RUN_STATE_FAILED, e));
            }
        };

        patch_task(&mut self.tasks, &request.task_id, &response);
        let working = count_working(&self.tasks);
        if let Some(snapshot) = self.snapshot.as_mut() {
            patch_task(&mut snapshot.tasks, &request.task_id, &response);
            snapshot.active_task_count = working;
        }

        info!(
            "✅ {} confirmed for {}: status '{}', active {}",
            request.action.as_str(),
            request.task_id,
            response.status,
            response.active
        );
        match request.action {
            RunAction::Play => Outcome::done(SUCCESS_TASK_PLAYED),
            RunAction::Pause => Outcome::done(SUCCESS_TASK_PAUSED),
        }
    }

    /// Restore the working list to the confirmed snapshot's task list.
    pub fn rollback_to_snapshot(&mut self) {
        self.tasks = self.snapshot_tasks().to_vec();
        self.staged = None;
    }

    fn snapshot_tasks(&self) -> &[Task] {
        self.snapshot.as_ref().map(|s| s.tasks.as_slice()).unwrap_or(&[])
    }

    fn require_snapshot(&self) -> Result<&QueueSnapshot, QueueError> {
        if matches!(self.state, EngineState::Error { .. }) {
            return Err(QueueError::RefreshRequired);
        }
        self.snapshot.as_ref().ok_or(QueueError::NotLoaded)
    }

    fn settle_state(&mut self) {
        if matches!(self.state, EngineState::MutationPending) && self.staged.is_none() {
            self.state = EngineState::Ready;
        }
    }
}

fn patch_task(tasks: &mut [Task], task_id: &str, response: &PlayPauseResponse) {
    if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
        task.status = response.status.clone();
        if task.active != response.active {
            // Hold rank is meaningless after a bucket change; the task sorts
            // last until the server assigns one.
            task.position = None;
        }
        task.active = response.active;
        if let Some(due) = response.due_date {
            task.latest_due_date = Some(due);
        }
        if let Some(color) = &response.badge_color {
            task.status_pill_color = Some(color.clone());
        }
    }
}
