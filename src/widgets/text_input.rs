//! Minimal single-line text input for the filter and upload prompts.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Single-line editable text with a character cursor.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    value: String,
    /// Cursor position in characters (not bytes).
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the content and put the cursor at the end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply one key. Returns true when the text changed (cursor-only
    /// movement returns false so callers can skip refetching).
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return false;
                }
                let at = self.byte_index(self.cursor - 1);
                self.value.remove(at);
                self.cursor -= 1;
                true
            }
            KeyCode::Delete => {
                if self.cursor >= self.value.chars().count() {
                    return false;
                }
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.value.chars().count());
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = self.value.chars().count();
                false
            }
            _ => false,
        }
    }

    /// Render with a titled border and a reverse-video cursor cell.
    pub fn render_titled(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        let inner = block.inner(area);
        Paragraph::new(self.value.as_str()).block(block).render(area, buf);

        let cursor_x = inner.x + self.cursor.min(inner.width.saturating_sub(1) as usize) as u16;
        if cursor_x < inner.x + inner.width && inner.height > 0 {
            buf[(cursor_x, inner.y)].set_style(
                Style::default().bg(Color::White).fg(Color::Black),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_backspace_edit_at_cursor() {
        let mut input = TextInput::new();
        for c in "abc".chars() {
            assert!(input.handle_key(key(KeyCode::Char(c))));
        }
        assert_eq!(input.value(), "abc");
        assert!(!input.handle_key(key(KeyCode::Left)));
        assert!(input.handle_key(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "ac");
        assert!(input.handle_key(key(KeyCode::Char('X'))));
        assert_eq!(input.value(), "aXc");
    }

    #[test]
    fn delete_removes_under_cursor_and_reports_no_change_at_end() {
        let mut input = TextInput::new();
        input.set_value("ab");
        assert!(!input.handle_key(key(KeyCode::Delete)), "cursor at end");
        input.handle_key(key(KeyCode::Home));
        assert!(input.handle_key(key(KeyCode::Delete)));
        assert_eq!(input.value(), "b");
    }

    #[test]
    fn multibyte_characters_edit_cleanly() {
        let mut input = TextInput::new();
        input.handle_key(key(KeyCode::Char('é')));
        input.handle_key(key(KeyCode::Char('ü')));
        assert_eq!(input.value(), "éü");
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "é");
    }
}
