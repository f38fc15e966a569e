use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{WidgetError, WidgetResult};
use crate::events::{ConversationHistory, EntryRole};

/// Key the history is stored under unless configured otherwise
pub const DEFAULT_HISTORY_KEY: &str = "chatHistory";

/// Durable mapping from a fixed key to the serialized conversation history
pub trait HistoryStore: Send + Sync {
    /// Read the stored history. Absent key yields an empty history; an
    /// unparseable value yields `CorruptPersistedState`.
    fn try_load(&self) -> WidgetResult<ConversationHistory>;

    /// Overwrite the stored value with the full history in one write.
    fn save(&self, history: &ConversationHistory) -> WidgetResult<()>;

    /// Fail-safe load: any error is logged and replaced by an empty history.
    fn load(&self) -> ConversationHistory {
        match self.try_load() {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable conversation history");
                ConversationHistory::new()
            }
        }
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    fn try_load(&self) -> WidgetResult<ConversationHistory> {
        (**self).try_load()
    }

    fn save(&self, history: &ConversationHistory) -> WidgetResult<()> {
        (**self).save(history)
    }
}

fn decode(raw: &str) -> WidgetResult<ConversationHistory> {
    let history: ConversationHistory = serde_json::from_str(raw)
        .map_err(|e| WidgetError::CorruptPersistedState(e.to_string()))?;

    if let Some(index) = history
        .iter()
        .position(|entry| entry.role() == EntryRole::User && entry.text().is_empty())
    {
        return Err(WidgetError::CorruptPersistedState(format!(
            "user entry {} has an empty message",
            index
        )));
    }
    Ok(history)
}

fn encode(history: &ConversationHistory) -> WidgetResult<String> {
    serde_json::to_string(history).map_err(WidgetError::storage)
}

/// History stored as `<dir>/<key>.json`
pub struct FileHistoryStore {
    dir: PathBuf,
    key: String,
}

impl FileHistoryStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    fn ensure_directory(&self) -> WidgetResult<()> {
        fs::create_dir_all(&self.dir).map_err(WidgetError::storage)
    }

    fn write_atomic(&self, target: &Path, content: &str) -> WidgetResult<()> {
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", self.key, Uuid::new_v4().simple()));

        fs::write(&tmp, content).map_err(WidgetError::storage)?;
        if let Err(e) = fs::rename(&tmp, target) {
            let _ = fs::remove_file(&tmp);
            return Err(WidgetError::storage(e));
        }
        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn try_load(&self) -> WidgetResult<ConversationHistory> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(content) => decode(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored history yet");
                Ok(ConversationHistory::new())
            }
            Err(e) => Err(WidgetError::storage(e)),
        }
    }

    fn save(&self, history: &ConversationHistory) -> WidgetResult<()> {
        self.ensure_directory()?;
        let content = encode(history)?;
        self.write_atomic(&self.path(), &content)?;
        debug!(entries = history.len(), "Conversation history saved");
        Ok(())
    }
}

/// In-process store, used where no disk is wanted
#[derive(Default)]
pub struct MemoryHistoryStore {
    value: Mutex<Option<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a raw value, valid or not
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn try_load(&self) -> WidgetResult<ConversationHistory> {
        let guard = self.value.lock().map_err(WidgetError::storage)?;
        match guard.as_deref() {
            Some(raw) => decode(raw),
            None => Ok(ConversationHistory::new()),
        }
    }

    fn save(&self, history: &ConversationHistory) -> WidgetResult<()> {
        let content = encode(history)?;
        let mut guard = self.value.lock().map_err(WidgetError::storage)?;
        *guard = Some(content);
        Ok(())
    }
}
