use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::refresh::RefreshFailed;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The access token was rejected and it could not be renewed. The token
    /// store has been cleared by the time this is observed.
    #[error("session expired: {0}")]
    SessionExpired(RefreshFailed),

    /// The refresh this request was waiting on was cancelled before it
    /// finished. The stored session is untouched.
    #[error("token refresh interrupted: {0}")]
    RefreshInterrupted(RefreshFailed),

    #[error("request failed with status {status}")]
    Status {
        status: StatusCode,
        body: Option<Value>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<RefreshFailed> for ApiError {
    fn from(failure: RefreshFailed) -> Self {
        if failure.is_abandoned() {
            ApiError::RefreshInterrupted(failure)
        } else {
            ApiError::SessionExpired(failure)
        }
    }
}

impl ApiError {
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Err(err) => {
                tracing::debug!("failed to read error body for {status}: {err}");
                None
            }
        };
        ApiError::Status { status, body }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_))
    }

    /// The backend's `detail` field, only when it is a plain string.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                body: Some(body), ..
            } => body.get("detail").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Text suitable for showing inline: the string `detail` verbatim, or
    /// `fallback` for anything else.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }

    /// Like [`ApiError::user_message`], but also renders request validation
    /// failures (`detail: [{"msg": ..}, ..]`) as their joined messages.
    pub fn validation_message(&self, fallback: &str) -> String {
        if let ApiError::Status {
            body: Some(body), ..
        } = self
            && let Some(items) = body.get("detail").and_then(Value::as_array)
        {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return messages.join(", ");
            }
        }
        self.user_message(fallback)
    }
}
