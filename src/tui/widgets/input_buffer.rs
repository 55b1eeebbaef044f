//! Single-line text input with cursor management.
//!
//! Backs the upload path field and the workspace title prompt.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

/// A simple text input buffer with cursor positioning.
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.content.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            let next = self.content[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.content.len());
            self.content.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.len() {
            self.cursor = self.content[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.content.len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Take the content out, resetting the buffer.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    /// Apply an editing key. Returns false for keys that are not edits
    /// (Enter, Esc, Tab, ...), leaving them to the caller.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => self.clear(),
            (KeyModifiers::CONTROL, KeyCode::Char('a')) => self.move_home(),
            (KeyModifiers::CONTROL, KeyCode::Char('e')) => self.move_end(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => self.insert_char(c),
            (_, KeyCode::Backspace) => self.backspace(),
            (_, KeyCode::Delete) => self.delete(),
            (_, KeyCode::Left) => self.move_left(),
            (_, KeyCode::Right) => self.move_right(),
            (_, KeyCode::Home) => self.move_home(),
            (_, KeyCode::End) => self.move_end(),
            _ => return false,
        }
        true
    }

    /// Render as a line with a block cursor, or `placeholder` when empty.
    pub fn to_line(&self, style: Style, placeholder: &str) -> Line<'static> {
        let cursor_style = style.add_modifier(Modifier::REVERSED);
        if self.content.is_empty() {
            return Line::from(vec![
                Span::styled(" ", cursor_style),
                Span::styled(placeholder.to_string(), style.add_modifier(Modifier::DIM)),
            ]);
        }

        let (before, after) = self.content.split_at(self.cursor);
        let mut chars = after.chars();
        let under = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        Line::from(vec![
            Span::styled(before.to_string(), style),
            Span::styled(under, cursor_style),
            Span::styled(chars.as_str().to_string(), style),
        ])
    }
}
