//! Workspace chat: transcript above, message composer below.

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use crate::core::chat::{ChatLog, ChatMessage, Sender, ASSISTANT_REPLY, REPLY_DELAY};
use crate::core::content::RequestSlot;
use crate::tui::layout;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

/// Assistant reply tagged with the workspace it answers for.
type ChatReply = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInputMode {
    /// Keys scroll the transcript; unhandled ones reach global bindings.
    Normal,
    /// Keys edit the composer.
    Insert,
}

pub struct ChatState {
    log: ChatLog,
    workspace_id: Option<String>,
    input: InputBuffer,
    input_mode: ChatInputMode,
    /// Lines scrolled up from the bottom of the transcript.
    scroll_back: u16,
    reply_delay: Duration,
    request: RequestSlot,
    reply_tx: mpsc::UnboundedSender<ChatReply>,
    reply_rx: mpsc::UnboundedReceiver<ChatReply>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::with_reply_delay(REPLY_DELAY)
    }

    pub fn with_reply_delay(reply_delay: Duration) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            log: ChatLog::new(),
            workspace_id: None,
            input: InputBuffer::new(),
            input_mode: ChatInputMode::Normal,
            scroll_back: 0,
            reply_delay,
            request: RequestSlot::new(),
            reply_tx,
            reply_rx,
        }
    }

    /// Show the transcript for `workspace_id`. Another workspace starts over.
    pub fn open(&mut self, workspace_id: &str) {
        if self.workspace_id.as_deref() == Some(workspace_id) {
            return;
        }
        self.cancel();
        self.workspace_id = Some(workspace_id.to_string());
        self.log = ChatLog::new();
        self.input.clear();
        self.input_mode = ChatInputMode::Normal;
        self.scroll_back = 0;
    }

    /// Drop a pending reply.
    pub fn cancel(&mut self) {
        self.request.cancel();
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.request.is_pending()
    }

    pub fn input_mode(&self) -> ChatInputMode {
        self.input_mode
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.messages()
    }

    /// Send the composer text. Rejected while a reply is pending or when blank.
    pub fn submit(&mut self) -> bool {
        let Some(workspace_id) = self.workspace_id.clone() else {
            return false;
        };
        if self.is_awaiting_reply() || self.log.send(self.input.text()).is_none() {
            return false;
        }
        self.input.clear();
        self.scroll_back = 0;

        let tx = self.reply_tx.clone();
        let delay = self.reply_delay;
        self.request.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send((workspace_id, ASSISTANT_REPLY.to_string()));
        });
        true
    }

    pub fn poll(&mut self) {
        while let Ok((id, reply)) = self.reply_rx.try_recv() {
            if self.workspace_id.as_deref() != Some(id.as_str()) {
                continue;
            }
            self.request.finish();
            self.log.reply(reply);
            self.scroll_back = 0;
        }
    }

    pub fn handle_input(&mut self, event: &Event) -> bool {
        let Event::Key(
            key @ KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            },
        ) = event
        else {
            return false;
        };

        match self.input_mode {
            ChatInputMode::Insert => self.handle_insert_input(key),
            ChatInputMode::Normal => self.handle_normal_input(*code, *modifiers),
        }
    }

    fn handle_insert_input(&mut self, key: &KeyEvent) -> bool {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return false,
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => return false,
            (_, KeyCode::Esc) => self.input_mode = ChatInputMode::Normal,
            (_, KeyCode::Enter) => {
                self.submit();
            }
            _ => {
                self.input.handle_key(key);
            }
        }
        true
    }

    fn handle_normal_input(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Char('i') | KeyCode::Enter) => {
                self.input_mode = ChatInputMode::Insert;
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.scroll_back = self.scroll_back.saturating_add(1);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.scroll_back = self.scroll_back.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("Chat");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (body, footer) = layout::with_footer(inner);
        let (transcript, composer) = layout::with_composer(body);

        let lines = self.transcript_lines();
        let max_scroll = (lines.len() as u16).saturating_sub(transcript.height);
        let scroll = max_scroll.saturating_sub(self.scroll_back);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            transcript,
        );

        let insert = self.input_mode == ChatInputMode::Insert;
        let border = if insert {
            theme::border_focused()
        } else {
            theme::border_default()
        };
        let input = self
            .input
            .to_line(Style::default().fg(theme::TEXT), "Type your message...");
        frame.render_widget(
            Paragraph::new(input).block(Block::default().borders(Borders::ALL).border_style(border)),
            composer,
        );

        let hints = if insert {
            Line::from(vec![
                Span::styled(" Enter", theme::key_hint()),
                Span::raw(":send "),
                Span::styled("Esc", theme::key_hint()),
                Span::raw(":stop typing"),
            ])
        } else {
            Line::from(vec![
                Span::styled(" i", theme::key_hint()),
                Span::raw(":type "),
                Span::styled("j/k", theme::key_hint()),
                Span::raw(":scroll"),
            ])
        };
        frame.render_widget(Paragraph::new(hints), footer);
    }

    fn transcript_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in self.log.messages() {
            lines.extend(bubble_lines(message.sender, &message.content));
        }
        if self.is_awaiting_reply() {
            lines.extend(bubble_lines(Sender::Assistant, "..."));
        }
        lines
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

/// Sent messages are indented; received ones hug the left edge.
fn bubble_lines(sender: Sender, content: &str) -> Vec<Line<'static>> {
    let (indent, avatar, text) = match sender {
        Sender::User => (
            "        ",
            Style::default()
                .fg(theme::PRIMARY_LIGHT)
                .add_modifier(Modifier::BOLD),
            Style::default().fg(theme::TEXT),
        ),
        Sender::Assistant => (
            " ",
            Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            theme::muted(),
        ),
    };

    let mut lines = vec![Line::from(vec![
        Span::raw(indent),
        Span::styled(format!("[{}]", sender.initials()), avatar),
    ])];
    for para in content.lines() {
        lines.push(Line::from(vec![
            Span::raw(indent),
            Span::styled(para.to_string(), text),
        ]));
    }
    lines.push(Line::raw(""));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(state: &mut ChatState, text: &str) {
        for c in text.chars() {
            state.handle_input(&key(KeyCode::Char(c)));
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    #[tokio::test]
    async fn test_send_gets_reply_after_delay() {
        let mut state = ChatState::with_reply_delay(Duration::from_millis(5));
        state.open("w1");
        state.handle_input(&key(KeyCode::Char('i')));
        assert_eq!(state.input_mode(), ChatInputMode::Insert);
        type_text(&mut state, "What is a GCN?");
        state.handle_input(&key(KeyCode::Enter));

        assert_eq!(state.messages().len(), 4);
        assert_eq!(state.messages()[3].content, "What is a GCN?");
        assert!(state.is_awaiting_reply());
        assert!(state.input.text().is_empty());

        settle().await;
        state.poll();
        assert!(!state.is_awaiting_reply());
        assert_eq!(state.messages().len(), 5);
        assert_eq!(state.messages()[4].sender, Sender::Assistant);
        assert_eq!(state.messages()[4].content, ASSISTANT_REPLY);
    }

    #[tokio::test]
    async fn test_blank_and_pending_submits_rejected() {
        let mut state = ChatState::with_reply_delay(Duration::from_millis(5));
        state.open("w1");
        state.input.insert_char(' ');
        assert!(!state.submit());
        assert_eq!(state.messages().len(), 3);

        state.input.clear();
        "first".chars().for_each(|c| state.input.insert_char(c));
        assert!(state.submit());
        "second".chars().for_each(|c| state.input.insert_char(c));
        assert!(!state.submit());
        assert_eq!(state.input.text(), "second");
        assert_eq!(state.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_workspace_switch_drops_pending_reply() {
        let mut state = ChatState::with_reply_delay(Duration::from_millis(5));
        state.open("w1");
        "hello".chars().for_each(|c| state.input.insert_char(c));
        assert!(state.submit());

        state.open("w2");
        assert!(!state.is_awaiting_reply());
        assert_eq!(state.messages().len(), 3);

        settle().await;
        state.poll();
        assert_eq!(state.messages().len(), 3);
    }

    #[test]
    fn test_typing_keys_stay_in_composer() {
        let mut state = ChatState::new();
        state.open("w1");
        assert!(!state.handle_input(&key(KeyCode::Char('q'))));

        state.handle_input(&key(KeyCode::Enter));
        assert!(state.handle_input(&key(KeyCode::Char('q'))));
        assert_eq!(state.input.text(), "q");
        assert!(!state.handle_input(&key(KeyCode::Tab)));
        state.handle_input(&key(KeyCode::Esc));
        assert_eq!(state.input_mode(), ChatInputMode::Normal);
    }

    #[test]
    fn test_no_workspace_sends_nothing() {
        let mut state = ChatState::new();
        "hi".chars().for_each(|c| state.input.insert_char(c));
        assert!(!state.submit());
        assert_eq!(state.messages().len(), 3);
    }
}
