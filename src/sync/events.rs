use super::countdown::CountdownPhase;

/// Operator actions the host UI forwards to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueAction {
    Refresh,
    /// Drag end inside the Hold bucket
    ReorderHold { from_index: usize, to_index: usize },
    ApplyReorder,
    CancelReorder,
    /// Play (`to_active = true`) or pause
    SetRunState { task_id: String, to_active: bool },
    SwitchAccount(String),
}

/// How a mutation reaches the confirmed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStrategy {
    /// Not a mutation
    ReadOnly,
    /// Applied locally first, then confirmed or rolled back
    StageOnly,
    /// Sent first, applied only once the remote confirms
    ConfirmThenApply,
}

impl QueueAction {
    pub fn strategy(&self) -> MutationStrategy {
        match self {
            QueueAction::ReorderHold { .. } | QueueAction::ApplyReorder | QueueAction::CancelReorder => {
                MutationStrategy::StageOnly
            }
            QueueAction::SetRunState { .. } => MutationStrategy::ConfirmThenApply,
            QueueAction::Refresh | QueueAction::SwitchAccount(_) => MutationStrategy::ReadOnly,
        }
    }
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
}

/// Notifications published to the host over the session's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Notice { level: NoticeLevel, message: String },
    /// The working task list or snapshot changed
    SnapshotUpdated,
    Countdown(CountdownPhase),
    /// A post-mutation polling run ended without being stopped
    PollFinished,
}
