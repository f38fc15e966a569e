use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{WidgetError, WidgetResult};

pub const THREADS_PATH: &str = "/threads/";
pub const CHAT_PATH: &str = "/chat/";

/// Backend-assigned conversation identifier.
///
/// Kept as the JSON value the backend returned (string or number) so it is
/// echoed back in exactly the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(Value);

impl ThreadId {
    /// Accepts a non-empty string or a number; anything else is not an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(value.clone())),
            Value::Number(_) => Some(Self(value.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// Remote conversational service
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /threads/` for the organization; returns the new thread id.
    async fn create_thread(&self, organization_id: u64) -> WidgetResult<ThreadId>;

    /// `POST /chat/` with one message; returns the reply text.
    async fn send_message(
        &self,
        organization_id: u64,
        thread_id: &ThreadId,
        message: &str,
    ) -> WidgetResult<String>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn create_thread(&self, organization_id: u64) -> WidgetResult<ThreadId> {
        (**self).create_thread(organization_id).await
    }

    async fn send_message(
        &self,
        organization_id: u64,
        thread_id: &ThreadId,
        message: &str,
    ) -> WidgetResult<String> {
        (**self).send_message(organization_id, thread_id, message).await
    }
}

/// Pull the thread id out of a `/threads/` response body
pub fn extract_thread_id(body: &Value) -> WidgetResult<ThreadId> {
    body.get("id")
        .and_then(ThreadId::from_value)
        .ok_or(WidgetError::MalformedResponse { field: "id" })
}

/// Pull the reply text out of a `/chat/` response body
pub fn extract_reply(body: &Value) -> WidgetResult<String> {
    match body.get("response") {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        _ => Err(WidgetError::MalformedResponse { field: "response" }),
    }
}

/// JSON-over-HTTP backend
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> WidgetResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(WidgetError::transport)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json(&self, path: &str, payload: &Value, field: &'static str) -> WidgetResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, %payload, "POST");

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(WidgetError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WidgetError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(WidgetError::transport)?;
        debug!(%url, body = %text, "Response");
        serde_json::from_str(&text).map_err(|_| WidgetError::MalformedResponse { field })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn create_thread(&self, organization_id: u64) -> WidgetResult<ThreadId> {
        let payload = serde_json::json!({
            "organization_id": organization_id,
        });
        let body = self.post_json(THREADS_PATH, &payload, "id").await?;
        extract_thread_id(&body)
    }

    async fn send_message(
        &self,
        organization_id: u64,
        thread_id: &ThreadId,
        message: &str,
    ) -> WidgetResult<String> {
        let payload = serde_json::json!({
            "organization_id": organization_id,
            "thread_id": thread_id,
            "message": message,
        });
        let body = self.post_json(CHAT_PATH, &payload, "response").await?;
        extract_reply(&body)
    }
}
