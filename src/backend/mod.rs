//! Remote queue service abstraction layer.
//!
//! This module defines the interface the reconciliation engine uses to talk to
//! the remote system of record, along with the wire types and error handling
//! shared by every implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ON_HOLD_PILL_COLOR;
use crate::entities::QueueSnapshot;

pub mod factory;
pub mod http;
pub mod retry;

/// Common error types for remote queue operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("{0}")]
    Remote(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl BackendError {
    /// Transient failures worth retrying on idempotent reads.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Timeout(_) | BackendError::Network(_) => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Text shown to the operator, preferring the remote-provided detail.
    pub fn detail(&self) -> String {
        match self {
            BackendError::Status { detail, .. } => detail.clone(),
            BackendError::Remote(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// One Hold-bucket entry of a reorder submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub task_id: String,
    pub position: i64,
    pub active: bool,
    pub status: String,
}

/// Task summary echoed back by the reorder endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSummary {
    #[serde(alias = "id")]
    pub task_id: Option<String>,
    pub position: Option<i64>,
    pub active: Option<bool>,
    pub status: Option<String>,
}

/// The reorder endpoint answers with either a bare array or `{tasks: [...]}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReorderResponse {
    Bare(Vec<TaskSummary>),
    Wrapped { tasks: Vec<TaskSummary> },
}

/// Canonical reorder acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReorderAck {
    pub tasks: Vec<TaskSummary>,
}

impl From<ReorderResponse> for ReorderAck {
    fn from(response: ReorderResponse) -> Self {
        match response {
            ReorderResponse::Bare(tasks) | ReorderResponse::Wrapped { tasks } => ReorderAck { tasks },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunAction {
    Play,
    Pause,
}

impl RunAction {
    pub fn for_target(to_active: bool) -> Self {
        if to_active {
            RunAction::Play
        } else {
            RunAction::Pause
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunAction::Play => "play",
            RunAction::Pause => "pause",
        }
    }
}

/// Body of a play/pause request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayPauseRequest {
    pub action: RunAction,
    pub task_id: String,
    pub position: i64,
    pub view_id: String,
}

/// Result of a play/pause request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayPauseResponse {
    pub status: String,
    pub active: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub badge_color: Option<String>,
}

impl PlayPauseResponse {
    /// Fill the default pill color for an "on hold" answer that carries none.
    pub fn normalized(mut self) -> Self {
        if self.badge_color.is_none() && self.status.trim().eq_ignore_ascii_case(crate::constants::ON_HOLD_STATUS) {
            self.badge_color = Some(DEFAULT_ON_HOLD_PILL_COLOR.to_string());
        }
        self
    }
}

/// Reject a reorder payload before it reaches the network.
pub fn validate_reorder(entries: &[ReorderEntry]) -> Result<(), BackendError> {
    if entries.is_empty() {
        return Err(BackendError::Validation("reorder payload must not be empty".to_string()));
    }
    if let Some(entry) = entries.iter().find(|e| e.task_id.trim().is_empty()) {
        return Err(BackendError::Validation(format!(
            "reorder entry at position {} is missing task_id",
            entry.position
        )));
    }
    if let Some(entry) = entries.iter().find(|e| e.position < 1) {
        return Err(BackendError::Validation(format!(
            "reorder entry for task {} has invalid position {}",
            entry.task_id, entry.position
        )));
    }
    Ok(())
}

/// Remote queue service that the reconciliation engine talks to.
///
/// Implementations must normalize responses to the canonical types above.
/// Only `fetch_snapshot` may be retried automatically; the two mutations
/// surface their first failure to the caller.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Identifier used in log lines (e.g., "http").
    fn service_type(&self) -> &str;

    async fn fetch_snapshot(&self, account: &str) -> Result<QueueSnapshot, BackendError>;
    async fn reorder(&self, entries: &[ReorderEntry]) -> Result<ReorderAck, BackendError>;
    async fn play_pause(&self, request: &PlayPauseRequest) -> Result<PlayPauseResponse, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_response_normalization() {
        let bare: ReorderResponse = serde_json::from_str(r#"[{"task_id":"A","position":1}]"#).unwrap();
        let wrapped: ReorderResponse = serde_json::from_str(r#"{"tasks":[{"id":"A","position":1}]}"#).unwrap();

        let bare = ReorderAck::from(bare);
        let wrapped = ReorderAck::from(wrapped);
        assert_eq!(bare, wrapped);
        assert_eq!(bare.tasks[0].task_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BackendError::Timeout("t".into()).is_retryable());
        assert!(BackendError::Status { status: 503, detail: String::new() }.is_retryable());
        assert!(BackendError::Status { status: 429, detail: String::new() }.is_retryable());
        assert!(!BackendError::Status { status: 404, detail: String::new() }.is_retryable());
        assert!(!BackendError::Remote("nope".into()).is_retryable());
    }

    #[test]
    fn test_on_hold_response_gets_default_color() {
        let response = PlayPauseResponse {
            status: "On Hold".to_string(),
            active: true,
            due_date: None,
            badge_color: None,
        }
        .normalized();
        assert_eq!(response.badge_color.as_deref(), Some(DEFAULT_ON_HOLD_PILL_COLOR));
    }
}
