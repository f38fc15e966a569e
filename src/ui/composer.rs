use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    None,
}

/// Multi-line message input.
///
/// `cursor` is a byte offset that always sits on a char boundary.
#[derive(Debug, Clone)]
pub struct Composer {
    content: String,
    cursor: usize,
    placeholder: String,
    enabled: bool,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            enabled: true,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char('\n');
                } else if !self.content.trim().is_empty() {
                    let content = std::mem::take(&mut self.content);
                    self.cursor = 0;
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.remove(prev);
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.len() {
                    self.content.remove(self.cursor);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(c) = self.content[self.cursor..].chars().next() {
                    self.cursor += c.len_utf8();
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            _ => {}
        }

        ComposerResult::None
    }

    pub fn insert_str(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        self.content.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, color) = if self.enabled {
            ("Message", Color::Green)
        } else {
            ("Waiting for reply…", Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(color));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner.x, inner.y, &placeholder, inner.width);
            return;
        }

        let mut content = self.content.clone();
        if self.enabled {
            content.insert(self.cursor, '▌');
        }

        // Keep the cursor line visible when the text outgrows the box
        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, text) in lines[start..].iter().enumerate() {
            let line = Line::from(vec![Span::raw(*text)]);
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut composer = Composer::new("Enter your message");
        type_str(&mut composer, "Hello");

        assert_eq!(
            composer.handle_key(key(KeyCode::Enter)),
            ComposerResult::Submitted("Hello".to_string())
        );
        assert!(composer.content().is_empty());
    }

    #[test]
    fn enter_on_blank_does_nothing() {
        let mut composer = Composer::new("");
        type_str(&mut composer, "   ");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ComposerResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let mut composer = Composer::new("");
        type_str(&mut composer, "a");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut composer, "b");
        assert_eq!(composer.content(), "a\nb");
    }

    #[test]
    fn editing_respects_multibyte_chars() {
        let mut composer = Composer::new("");
        type_str(&mut composer, "héllo");
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Backspace));
        assert_eq!(composer.content(), "hllo");
    }

    #[test]
    fn disabled_composer_ignores_keys() {
        let mut composer = Composer::new("");
        composer.set_enabled(false);
        type_str(&mut composer, "x");
        composer.insert_str("pasted");
        assert!(composer.content().is_empty());
    }
}
