//! Error types for the conversation core.

use thiserror::Error;

/// Failures raised by the session, the store, or the controller.
///
/// `Transport`, `Status` and `TimedOut` are all transport-class failures;
/// they stay separate variants so the log says which one happened even
/// though the user sees the same error cue.
#[derive(Error, Debug)]
pub enum WidgetError {
    /// The request never produced a response (DNS, connect, body read...)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request exceeded its deadline
    #[error("Request to {endpoint} timed out after {secs}s")]
    TimedOut { endpoint: &'static str, secs: u64 },

    /// Success status but the expected field was missing or unusable
    #[error("Malformed response: missing `{field}`")]
    MalformedResponse { field: &'static str },

    /// Stored history could not be parsed
    #[error("Corrupt persisted state: {0}")]
    CorruptPersistedState(String),

    /// A send was attempted without a thread identifier
    #[error("No conversation thread available; messaging is disabled until restart")]
    InvalidSession,

    /// The store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WidgetError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Whether this failure happened on the wire rather than in local state.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::TimedOut { .. }
        )
    }

    /// Short label shown by the renderer's error indicator.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidSession => "Chat is unavailable right now. Please restart the widget.",
            Self::MalformedResponse { .. } => "Received an unexpected reply. Please try again.",
            Self::TimedOut { .. } => "The assistant took too long to answer. Please try again.",
            Self::Transport(_) | Self::Status { .. } => {
                "Message could not be delivered. Please try again."
            }
            Self::CorruptPersistedState(_) | Self::Storage(_) => {
                "Conversation history could not be saved."
            }
        }
    }
}

pub type WidgetResult<T> = Result<T, WidgetError>;
