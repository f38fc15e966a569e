use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::backend::ChatBackend;
use crate::config::{Position, WidgetConfig};
use crate::controller::ConversationController;
use crate::events::{ConversationHistory, SubmitOutcome};
use crate::render::Renderer;
use crate::session::{SessionState, ThreadSession};
use crate::storage::HistoryStore;

/// Whether the conversation panel is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WidgetState {
    #[default]
    Closed,
    Open,
}

/// Handle to one widget instance.
///
/// Built with [`ChatWidget::create`], torn down with [`ChatWidget::dispose`].
pub struct ChatWidget<B, S, R> {
    instance_id: Uuid,
    position: Position,
    state: WidgetState,
    controller: ConversationController<B, S, R>,
}

impl<B, S, R> ChatWidget<B, S, R>
where
    B: ChatBackend,
    S: HistoryStore,
    R: Renderer,
{
    /// Restore stored history, then create the remote thread.
    ///
    /// A failed thread creation still yields a usable widget: history stays
    /// viewable and sends report `InvalidSession`.
    pub async fn create(config: &WidgetConfig, backend: B, store: S, renderer: R) -> Self {
        let instance_id = Uuid::new_v4();
        let span = info_span!("widget", %instance_id, organization_id = config.organization_id);

        let session = ThreadSession::new(backend, config.request_timeout());
        let mut controller =
            ConversationController::new(config.organization_id, session, store, renderer);

        async {
            controller.restore();
            if controller.start_session().await.is_none() {
                info!("Widget started without a conversation thread");
            }
        }
        .instrument(span)
        .await;

        Self {
            instance_id,
            position: config.position,
            state: WidgetState::default(),
            controller,
        }
    }

    pub async fn submit(&mut self, raw_input: &str) -> SubmitOutcome {
        let span = info_span!("submit", instance_id = %self.instance_id);
        self.controller.submit(raw_input).instrument(span).await
    }

    pub fn restore(&mut self) -> usize {
        self.controller.restore()
    }

    pub fn toggle_open(&mut self) -> WidgetState {
        self.state = match self.state {
            WidgetState::Closed => WidgetState::Open,
            WidgetState::Open => WidgetState::Closed,
        };
        self.state
    }

    pub fn close(&mut self) {
        self.state = WidgetState::Closed;
    }

    pub fn is_open(&self) -> bool {
        self.state == WidgetState::Open
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn session_state(&self) -> &SessionState {
        self.controller.session().state()
    }

    pub fn can_send(&self) -> bool {
        self.controller.session().thread_id().is_some() && !self.controller.is_pending()
    }

    pub fn history(&self) -> &ConversationHistory {
        self.controller.history()
    }

    pub fn renderer(&self) -> &R {
        self.controller.renderer()
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.controller.renderer_mut()
    }

    /// Flush the history one last time and hand back the renderer.
    pub fn dispose(self) -> R {
        self.controller.persist();
        info!(instance_id = %self.instance_id, entries = self.controller.history().len(), "Widget disposed");
        self.controller.into_renderer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryHistoryStore;
    use crate::testing::{FakeBackend, RecordingRenderer};
    use std::sync::Arc;

    #[tokio::test]
    async fn widget_starts_closed_and_toggles() {
        let mut widget = ChatWidget::create(
            &WidgetConfig::default(),
            FakeBackend::new(),
            MemoryHistoryStore::new(),
            RecordingRenderer::default(),
        )
        .await;

        assert_eq!(widget.state(), WidgetState::Closed);
        assert_eq!(widget.toggle_open(), WidgetState::Open);
        assert!(widget.is_open());
        widget.close();
        assert!(!widget.is_open());
    }

    #[tokio::test]
    async fn create_restores_history_and_starts_thread() {
        let store = Arc::new(MemoryHistoryStore::with_raw(r#"[{"type":"user","message":"earlier"}]"#));
        let backend = FakeBackend::new();
        let widget = ChatWidget::create(
            &WidgetConfig::default(),
            backend.clone(),
            store,
            RecordingRenderer::default(),
        )
        .await;

        assert_eq!(widget.history().len(), 1);
        assert_eq!(widget.renderer().visible().len(), 1);
        assert!(matches!(widget.session_state(), SessionState::Ready(_)));
        assert_eq!(backend.thread_requests(), vec![1u64]);
        assert!(widget.can_send());
    }

    #[tokio::test]
    async fn separate_widgets_do_not_share_state() {
        let config = WidgetConfig::default();
        let mut first = ChatWidget::create(
            &config,
            FakeBackend::new(),
            MemoryHistoryStore::new(),
            RecordingRenderer::default(),
        )
        .await;
        let second = ChatWidget::create(
            &config,
            FakeBackend::new(),
            MemoryHistoryStore::new(),
            RecordingRenderer::default(),
        )
        .await;

        first.submit("only here").await;
        assert_eq!(first.history().len(), 2);
        assert!(second.history().is_empty());
        assert_ne!(first.instance_id(), second.instance_id());
    }

    #[tokio::test]
    async fn dispose_returns_renderer_and_keeps_history_stored() {
        let store = Arc::new(MemoryHistoryStore::new());
        let mut widget = ChatWidget::create(
            &WidgetConfig::default(),
            FakeBackend::new(),
            store.clone(),
            RecordingRenderer::default(),
        )
        .await;
        widget.submit("Hello").await;

        let renderer = widget.dispose();
        assert_eq!(renderer.visible().len(), 2);
        assert_eq!(store.load().len(), 2);
    }
}
