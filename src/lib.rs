//! Chat widget: a corner button that opens a conversation panel backed by a
//! remote conversational service, with history kept across restarts.

pub mod backend;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod logging;
pub mod render;
pub mod session;
pub mod storage;
pub mod ui;
pub mod widget;

#[cfg(test)]
mod testing;

pub use backend::{ChatBackend, HttpBackend, ThreadId};
pub use config::{Position, WidgetConfig};
pub use controller::ConversationController;
pub use error::{WidgetError, WidgetResult};
pub use events::{ConversationEntry, ConversationHistory, EntryRole, SubmitOutcome};
pub use render::Renderer;
pub use session::{SessionState, ThreadSession};
pub use storage::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
pub use widget::{ChatWidget, WidgetState};
