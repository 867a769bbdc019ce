//! HTTP implementation of the remote queue service.

use async_trait::async_trait;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::retry::with_retry;
use super::{
    validate_reorder, BackendError, PlayPauseRequest, PlayPauseResponse, QueueService, ReorderAck,
    ReorderEntry, ReorderResponse,
};
use crate::config::{EndpointsConfig, HttpConfig, RetryConfig};
use crate::constants::LOG_FETCHED_SNAPSHOT;
use crate::entities::QueueSnapshot;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Queue service backed by the three queue endpoints.
pub struct HttpQueueService {
    http: reqwest::Client,
    api_token: Option<String>,
    retry: RetryConfig,
    data_url: String,
    reorder_url: String,
    play_pause_url: String,
}

impl HttpQueueService {
    pub fn new(endpoints: &EndpointsConfig, http: &HttpConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http: client,
            api_token: http.api_token.clone().filter(|t| !t.trim().is_empty()),
            retry: http.retry.clone(),
            data_url: endpoints.data_url.clone(),
            reorder_url: endpoints.reorder_url.clone(),
            play_pause_url: endpoints.play_pause_url.clone(),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn fetch_once(&self, account: &str) -> Result<QueueSnapshot, BackendError> {
        let req = self.http.get(&self.data_url).query(&[("accountNumber", account)]);
        let resp = self.auth(req).send().await.map_err(map_reqwest_error)?;
        let value = read_json(resp).await?;
        decode(value)
    }
}

#[async_trait]
impl QueueService for HttpQueueService {
    fn service_type(&self) -> &str {
        "http"
    }

    async fn fetch_snapshot(&self, account: &str) -> Result<QueueSnapshot, BackendError> {
        debug!("GET {} accountNumber={}", self.data_url, account);
        let snapshot = with_retry("Queue fetch", &self.retry, move || self.fetch_once(account)).await?;
        info!(
            "{} for account {}: {} tasks, cap {:?}",
            LOG_FETCHED_SNAPSHOT,
            account,
            snapshot.tasks.len(),
            snapshot.cap
        );
        Ok(snapshot)
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> Result<ReorderAck, BackendError> {
        validate_reorder(entries)?;
        debug!("PATCH {} with {} entries", self.reorder_url, entries.len());

        let req = self.http.patch(&self.reorder_url).json(entries);
        let resp = self.auth(req).send().await.map_err(map_reqwest_error)?;
        let value = read_json(resp).await?;
        if value.is_null() {
            return Ok(ReorderAck::default());
        }
        let response: ReorderResponse = decode(value)?;
        Ok(response.into())
    }

    async fn play_pause(&self, request: &PlayPauseRequest) -> Result<PlayPauseResponse, BackendError> {
        debug!(
            "PATCH {} action={} task={} position={}",
            self.play_pause_url,
            request.action.as_str(),
            request.task_id,
            request.position
        );

        let req = self.http.patch(&self.play_pause_url).json(request);
        let resp = self.auth(req).send().await.map_err(map_reqwest_error)?;
        let value = read_json(resp).await?;
        let response: PlayPauseResponse = decode(value)?;
        Ok(response.normalized())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(err.to_string())
    } else if err.is_decode() {
        BackendError::InvalidData(err.to_string())
    } else {
        BackendError::Network(err.to_string())
    }
}

/// Read a response body as JSON, mapping non-2xx and `{error}` payloads to errors.
///
/// An empty 2xx body yields `Value::Null`.
async fn read_json(resp: reqwest::Response) -> Result<Value, BackendError> {
    let status = resp.status();
    let body = resp.text().await.map_err(map_reqwest_error)?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| BackendError::InvalidData(format!("{} | body={}", e, preview_body(&body))))?;

    if let Some(message) = value.get("error").filter(|e| !e.is_null()) {
        let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
        return Err(BackendError::Remote(message));
    }

    Ok(value)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::InvalidData(e.to_string()))
}

/// Pull a human-readable message out of an error body.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }
    preview_body(body)
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_body_empty() {
        assert_eq!(preview_body("   "), "<empty body>");
    }

    #[test]
    fn test_preview_body_truncates() {
        let body = "a".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = preview_body(&body);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn test_error_detail_prefers_json_fields() {
        assert_eq!(error_detail(r#"{"error":"queue locked"}"#), "queue locked");
        assert_eq!(error_detail(r#"{"detail":"db down"}"#), "db down");
        assert_eq!(error_detail("plain failure"), "plain failure");
    }
}
