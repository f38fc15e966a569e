use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::WidgetError;

/// Who produced a conversation entry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryRole {
    /// Typed by the person using the widget
    User,
    /// Returned by the backend
    System,
}

/// Individual conversation entry.
///
/// Serialized as `{"type": "user"|"system", "message": "..."}`, which is the
/// persisted layout of the history key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    #[serde(rename = "type")]
    role: EntryRole,
    #[serde(rename = "message")]
    text: String,
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: EntryRole::User,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: EntryRole::System,
            text: text.into(),
        }
    }

    pub fn role(&self) -> EntryRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Chronological list of entries; insertion order is display order.
///
/// Entries can only be appended. Nothing in the crate removes, reorders or
/// deduplicates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    entries: Vec<ConversationEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ConversationEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What happened to a single `submit` call
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing recorded, nothing sent
    Ignored,
    /// Another send is still pending
    Busy,
    /// The backend replied and the reply was recorded
    Replied(String),
    /// The user entry was recorded but the exchange failed
    Failed(WidgetError),
}

impl SubmitOutcome {
    pub fn is_replied(&self) -> bool {
        matches!(self, SubmitOutcome::Replied(_))
    }
}

/// Terminal events consumed by the widget loop
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}
