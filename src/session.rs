use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::backend::{CHAT_PATH, ChatBackend, THREADS_PATH, ThreadId};
use crate::error::{WidgetError, WidgetResult};

/// Lifecycle of the remote thread behind a widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Starting,
    Ready(ThreadId),
    Failed,
}

/// Owns the thread identifier and performs every network exchange.
///
/// The thread is created once per session. Individual sends never move the
/// state: a failed message leaves the thread usable.
pub struct ThreadSession<B> {
    backend: B,
    timeout: Duration,
    state: SessionState,
}

impl<B: ChatBackend> ThreadSession<B> {
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        match &self.state {
            SessionState::Ready(id) => Some(id),
            _ => None,
        }
    }

    /// Create the remote thread. Returns `None` when messaging is unavailable.
    ///
    /// Only the first call talks to the backend; later calls report the
    /// outcome of the first.
    pub async fn start(&mut self, organization_id: u64) -> Option<ThreadId> {
        if self.state != SessionState::Uninitialized {
            warn!(state = ?self.state, "Thread session already started");
            return self.thread_id().cloned();
        }

        self.state = SessionState::Starting;
        let result = self
            .with_deadline(THREADS_PATH, self.backend.create_thread(organization_id))
            .await;

        match result {
            Ok(id) => {
                info!(thread_id = %id, organization_id, "Conversation thread created");
                self.state = SessionState::Ready(id.clone());
                Some(id)
            }
            Err(e) => {
                error!(error = %e, kind = failure_kind(&e), transport = e.is_transport(), organization_id, "Failed to create conversation thread");
                self.state = SessionState::Failed;
                None
            }
        }
    }

    /// Submit one message against `thread_id` and return the reply text.
    pub async fn send(
        &self,
        thread_id: &ThreadId,
        organization_id: u64,
        message: &str,
    ) -> WidgetResult<String> {
        debug_assert!(!message.trim().is_empty(), "callers filter empty input");

        let result = self
            .with_deadline(
                CHAT_PATH,
                self.backend.send_message(organization_id, thread_id, message),
            )
            .await;

        if let Err(e) = &result {
            error!(error = %e, kind = failure_kind(e), transport = e.is_transport(), %thread_id, "Message exchange failed");
        }
        result
    }

    /// Send against the session's own thread, rejecting up front when there
    /// is none.
    pub async fn send_current(&self, organization_id: u64, message: &str) -> WidgetResult<String> {
        let thread_id = self.thread_id().ok_or_else(|| {
            warn!(state = ?self.state, "Send attempted without a thread");
            WidgetError::InvalidSession
        })?;
        self.send(thread_id, organization_id, message).await
    }

    async fn with_deadline<T>(
        &self,
        endpoint: &'static str,
        fut: impl Future<Output = WidgetResult<T>>,
    ) -> WidgetResult<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| WidgetError::TimedOut {
                endpoint,
                secs: self.timeout.as_secs(),
            })?
    }
}

fn failure_kind(e: &WidgetError) -> &'static str {
    match e {
        WidgetError::Transport(_) => "transport",
        WidgetError::Status { .. } => "status",
        WidgetError::TimedOut { .. } => "timeout",
        WidgetError::MalformedResponse { .. } => "malformed_response",
        WidgetError::InvalidSession => "invalid_session",
        WidgetError::CorruptPersistedState(_) | WidgetError::Storage(_) => "storage",
    }
}
