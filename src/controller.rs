use tracing::{debug, error, info};

use crate::backend::{ChatBackend, ThreadId};
use crate::events::{ConversationEntry, ConversationHistory, SubmitOutcome};
use crate::render::Renderer;
use crate::session::ThreadSession;
use crate::storage::HistoryStore;

/// Single orchestration point between input, history, session and renderer.
///
/// The controller is the only writer of the history. Every append is
/// persisted before it is rendered.
pub struct ConversationController<B, S, R> {
    organization_id: u64,
    session: ThreadSession<B>,
    store: S,
    renderer: R,
    history: ConversationHistory,
    pending: bool,
}

impl<B, S, R> ConversationController<B, S, R>
where
    B: ChatBackend,
    S: HistoryStore,
    R: Renderer,
{
    pub fn new(organization_id: u64, session: ThreadSession<B>, store: S, renderer: R) -> Self {
        Self {
            organization_id,
            session,
            store,
            renderer,
            history: ConversationHistory::new(),
            pending: false,
        }
    }

    /// Create the remote thread for this conversation
    pub async fn start_session(&mut self) -> Option<ThreadId> {
        self.session.start(self.organization_id).await
    }

    /// Replace the in-memory history and the rendered view with whatever is
    /// stored. Never touches the network.
    pub fn restore(&mut self) -> usize {
        self.history = self.store.load();
        self.renderer.clear_entries();
        for entry in self.history.iter() {
            self.renderer.render_entry(entry.role(), entry.text());
        }
        self.renderer.scroll_to_latest();

        info!(entries = self.history.len(), "Conversation history restored");
        self.history.len()
    }

    /// Record `raw_input`, send it, and record the reply.
    pub async fn submit(&mut self, raw_input: &str) -> SubmitOutcome {
        let message = raw_input.trim();
        if message.is_empty() {
            debug!("Ignoring empty submission");
            return SubmitOutcome::Ignored;
        }
        if self.pending {
            debug!("Submission rejected while a reply is pending");
            return SubmitOutcome::Busy;
        }

        self.append(ConversationEntry::user(message));

        self.pending = true;
        self.renderer.set_input_enabled(false);

        let outcome = match self.session.send_current(self.organization_id, message).await {
            Ok(reply) => {
                self.append(ConversationEntry::system(reply.clone()));
                SubmitOutcome::Replied(reply)
            }
            Err(e) => {
                self.renderer.show_error(&e);
                SubmitOutcome::Failed(e)
            }
        };

        self.pending = false;
        self.renderer.set_input_enabled(true);
        outcome
    }

    fn append(&mut self, entry: ConversationEntry) {
        self.history.push(entry);
        self.persist();

        if let Some(entry) = self.history.last() {
            self.renderer.render_entry(entry.role(), entry.text());
        }
        self.renderer.scroll_to_latest();
    }

    /// Write the full history; a failed write is logged and the conversation
    /// carries on in memory.
    pub fn persist(&self) {
        if let Err(e) = self.store.save(&self.history) {
            error!(error = %e, entries = self.history.len(), "Failed to persist conversation history");
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn session(&self) -> &ThreadSession<B> {
        &self.session
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
