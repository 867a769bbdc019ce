//! Results of queue operations.
//!
//! Engine and session operations never return `Err` or panic; each one
//! resolves to an [`Outcome`] the host renders as a toast or banner.

use crate::backend::BackendError;
use crate::constants::{
    WARNING_CAPACITY_REACHED, WARNING_LOAD_FAILED, WARNING_NOT_LOADED, WARNING_REFRESH_REQUIRED,
};

/// Why an operation did not take effect.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum QueueError {
    /// Remote call failed; `context` is the operator-facing prefix.
    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: BackendError,
    },

    /// Playing the task would exceed the concurrency cap. No request was sent.
    #[error("{}", WARNING_CAPACITY_REACHED)]
    CapacityExceeded { working: u32, cap: u32 },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("{}", WARNING_NOT_LOADED)]
    NotLoaded,

    /// The last load failed; only a refresh is accepted until it succeeds.
    #[error("{}", WARNING_REFRESH_REQUIRED)]
    RefreshRequired,
}

impl QueueError {
    pub fn backend(context: &'static str, source: BackendError) -> Self {
        QueueError::Backend { context, source }
    }

    /// Warning text shown to the operator, with remote detail where available.
    pub fn warning(&self) -> String {
        match self {
            QueueError::Backend { context, source } => format!("{}: {}", context, source.detail()),
            other => other.to_string(),
        }
    }
}

/// Result of one engine or session operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// State changed. `notice` is the success toast, if any.
    Done { notice: Option<String> },
    /// The request was a no-op (e.g. dropping a task onto itself).
    Unchanged,
    /// The operation failed; local state is consistent.
    Failed(QueueError),
}

impl Outcome {
    pub fn done(notice: impl Into<String>) -> Self {
        Outcome::Done {
            notice: Some(notice.into()),
        }
    }

    pub fn silent() -> Self {
        Outcome::Done { notice: None }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn error(&self) -> Option<&QueueError> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Text to show the operator, if anything.
    pub fn notice(&self) -> Option<String> {
        match self {
            Outcome::Done { notice } => notice.clone(),
            Outcome::Unchanged => None,
            Outcome::Failed(e) => Some(e.warning()),
        }
    }
}

impl From<QueueError> for Outcome {
    fn from(err: QueueError) -> Self {
        Outcome::Failed(err)
    }
}

/// Default prefix for a failed snapshot fetch.
pub(crate) fn load_failed(source: BackendError) -> QueueError {
    QueueError::backend(WARNING_LOAD_FAILED, source)
}
