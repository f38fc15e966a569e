//! Terminal rendering of the widget: corner button plus conversation panel.

use std::sync::{Arc, Mutex, MutexGuard};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::config::{Horizontal, Position, Vertical};
use crate::error::WidgetError;
use crate::events::EntryRole;
use crate::render::Renderer;
use crate::ui::composer::Composer;

const BUTTON_WIDTH: u16 = 6;
const BUTTON_HEIGHT: u16 = 3;
const PANEL_WIDTH: u16 = 52;
const PANEL_HEIGHT: u16 = 22;
const COMPOSER_HEIGHT: u16 = 5;

/// What the panel shows, written by the renderer and read when drawing
#[derive(Debug, Clone)]
pub struct PanelState {
    pub greeting: String,
    pub entries: Vec<(EntryRole, String)>,
    pub error: Option<String>,
    pub input_enabled: bool,
    /// Lines scrolled up from the newest entry
    pub scroll_offset: usize,
}

impl PanelState {
    fn new(greeting: &str) -> Self {
        Self {
            greeting: greeting.to_string(),
            entries: Vec::new(),
            error: None,
            input_enabled: true,
            scroll_offset: 0,
        }
    }
}

/// Read side of the panel, shared with the draw loop
#[derive(Clone)]
pub struct PanelView {
    state: Arc<Mutex<PanelState>>,
}

impl PanelView {
    fn lock(&self) -> MutexGuard<'_, PanelState> {
        // A poisoned lock still holds the last consistent panel contents
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PanelState {
        self.lock().clone()
    }

    pub fn input_enabled(&self) -> bool {
        self.lock().input_enabled
    }

    pub fn scroll_up(&self, lines: usize) {
        let mut state = self.lock();
        state.scroll_offset = state.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&self, lines: usize) {
        let mut state = self.lock();
        state.scroll_offset = state.scroll_offset.saturating_sub(lines);
    }
}

/// `Renderer` that feeds the terminal panel
pub struct TerminalRenderer {
    view: PanelView,
}

impl TerminalRenderer {
    pub fn new(greeting: &str) -> (Self, PanelView) {
        let view = PanelView {
            state: Arc::new(Mutex::new(PanelState::new(greeting))),
        };
        (Self { view: view.clone() }, view)
    }
}

impl Renderer for TerminalRenderer {
    fn render_entry(&mut self, role: EntryRole, text: &str) {
        self.view.lock().entries.push((role, text.to_string()));
    }

    fn clear_entries(&mut self) {
        let mut state = self.view.lock();
        state.entries.clear();
        state.scroll_offset = 0;
    }

    fn show_error(&mut self, error: &WidgetError) {
        self.view.lock().error = Some(error.user_message().to_string());
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        let mut state = self.view.lock();
        state.input_enabled = enabled;
        if !enabled {
            // A new exchange replaces the previous failure cue
            state.error = None;
        }
    }

    fn scroll_to_latest(&mut self) {
        self.view.lock().scroll_offset = 0;
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        lines.push(current);
    }
    lines
}

/// Anchor a `width`×`height` box in the corner named by `position`
fn corner_rect(area: Rect, position: Position, width: u16, height: u16, offset_y: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height.saturating_sub(offset_y));
    let x = match position.horizontal {
        Horizontal::Left => area.x,
        Horizontal::Right => area.x + area.width - width,
    };
    let y = match position.vertical {
        Vertical::Top => area.y + offset_y,
        Vertical::Bottom => (area.y + area.height).saturating_sub(height + offset_y),
    };
    Rect { x, y, width, height }
}

pub fn button_rect(area: Rect, position: Position) -> Rect {
    corner_rect(area, position, BUTTON_WIDTH, BUTTON_HEIGHT, 0)
}

/// The panel opens next to the button, on the inside of the screen
pub fn panel_rect(area: Rect, position: Position) -> Rect {
    corner_rect(area, position, PANEL_WIDTH, PANEL_HEIGHT, BUTTON_HEIGHT)
}

fn role_style(role: EntryRole) -> Style {
    match role {
        EntryRole::User => Style::default().fg(Color::Blue),
        EntryRole::System => Style::default().fg(Color::Green),
    }
}

fn conversation_lines(state: &PanelState, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let greeting = std::iter::once((EntryRole::System, state.greeting.as_str()));
    let entries = state.entries.iter().map(|(role, text)| (*role, text.as_str()));

    for (role, text) in greeting.chain(entries) {
        let label = match role {
            EntryRole::User => "You",
            EntryRole::System => "Assistant",
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )));
        for wrapped in wrap_text(text, width.saturating_sub(2)) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(wrapped, role_style(role)),
            ]));
        }
        lines.push(Line::default());
    }
    lines
}

/// Draw the whole widget for the current frame
pub fn draw(frame: &mut Frame, view: &PanelView, composer: &Composer, position: Position, open: bool) {
    let area = frame.size();
    let state = view.snapshot();

    let button = button_rect(area, position);
    let glyph = if open { " ✕ " } else { " 💬 " };
    frame.render_widget(Clear, button);
    frame.render_widget(
        Paragraph::new(glyph).block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        ),
        button,
    );

    if !open {
        return;
    }

    let panel = panel_rect(area, position);
    frame.render_widget(Clear, panel);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("💬 Chat")
        .style(Style::default().fg(Color::White));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let error_height = if state.error.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(error_height),
            Constraint::Length(COMPOSER_HEIGHT),
        ])
        .split(inner);

    let history_area = chunks[0];
    let lines = conversation_lines(&state, history_area.width as usize);
    let height = history_area.height as usize;
    let max_offset = lines.len().saturating_sub(height);
    let offset = state.scroll_offset.min(max_offset);
    let end = lines.len() - offset;
    let start = end.saturating_sub(height);
    frame.render_widget(Paragraph::new(lines[start..end].to_vec()), history_area);

    if let Some(error) = &state.error {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("⚠ {}", error),
                Style::default().fg(Color::Red),
            ))),
            chunks[1],
        );
    }

    frame.render_widget(composer, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_breaks_on_width_and_newlines() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn button_sits_in_configured_corner() {
        let area = Rect::new(0, 0, 100, 40);
        let br = button_rect(area, "bottom-right".parse().unwrap());
        assert_eq!((br.x, br.y), (94, 37));
        let tl = button_rect(area, "top-left".parse().unwrap());
        assert_eq!((tl.x, tl.y), (0, 0));
    }

    #[test]
    fn panel_opens_beside_the_button() {
        let area = Rect::new(0, 0, 100, 40);
        let bottom = panel_rect(area, "bottom-right".parse().unwrap());
        assert_eq!(bottom.y + bottom.height, 37);
        let top = panel_rect(area, "top-left".parse().unwrap());
        assert_eq!(top.y, 3);
    }

    #[test]
    fn renderer_clear_replaces_entries() {
        let (mut renderer, view) = TerminalRenderer::new("Hi there!");
        renderer.render_entry(EntryRole::User, "a");
        renderer.clear_entries();
        renderer.render_entry(EntryRole::User, "a");
        assert_eq!(view.snapshot().entries.len(), 1);
    }

    #[test]
    fn new_exchange_clears_error_cue() {
        let (mut renderer, view) = TerminalRenderer::new("");
        renderer.show_error(&WidgetError::InvalidSession);
        assert!(view.snapshot().error.is_some());
        renderer.set_input_enabled(false);
        assert!(view.snapshot().error.is_none());
        assert!(!view.input_enabled());
    }
}
