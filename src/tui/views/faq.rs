//! FAQ accordion. At most one entry is expanded.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use crate::api::ApiError;
use crate::core::content::{ContentLoad, FaqEntry, RequestSlot};
use crate::tui::services::Services;
use crate::tui::theme;

type FaqResult = (String, Result<Vec<FaqEntry>, ApiError>);

pub struct FaqState {
    load: ContentLoad<Vec<FaqEntry>>,
    /// Workspace the loaded entries belong to.
    workspace_id: Option<String>,
    selected: usize,
    expanded: Option<usize>,
    request: RequestSlot,
    data_tx: mpsc::UnboundedSender<FaqResult>,
    data_rx: mpsc::UnboundedReceiver<FaqResult>,
}

impl FaqState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            load: ContentLoad::Idle,
            workspace_id: None,
            selected: 0,
            expanded: None,
            request: RequestSlot::new(),
            data_tx,
            data_rx,
        }
    }

    /// Fetch entries for `workspace_id` unless they are already loaded.
    pub fn load(&mut self, services: &Services, workspace_id: &str) {
        let same = self.workspace_id.as_deref() == Some(workspace_id);
        if same && matches!(self.load, ContentLoad::Ready(_) | ContentLoad::Loading) {
            return;
        }
        self.workspace_id = Some(workspace_id.to_string());
        self.load = ContentLoad::Loading;
        self.selected = 0;
        self.expanded = None;

        let tx = self.data_tx.clone();
        let content = services.content.clone();
        let id = workspace_id.to_string();
        self.request.spawn(async move {
            let result = content.faq(&id).await;
            let _ = tx.send((id, result));
        });
    }

    /// Drop any pending request. The next `load` fetches again.
    pub fn cancel(&mut self) {
        self.request.cancel();
        if self.load.is_loading() {
            self.load = ContentLoad::Idle;
        }
    }

    pub fn poll(&mut self) {
        while let Ok((id, result)) = self.data_rx.try_recv() {
            if self.workspace_id.as_deref() != Some(id.as_str()) {
                continue;
            }
            self.request.finish();
            self.load = ContentLoad::from_result(result);
        }
    }

    fn entries(&self) -> &[FaqEntry] {
        match self.load {
            ContentLoad::Ready(ref entries) => entries,
            _ => &[],
        }
    }

    /// Expand `idx`, collapsing whatever was open. Toggling the open entry closes it.
    pub fn toggle(&mut self, idx: usize) {
        if idx >= self.entries().len() {
            return;
        }
        self.expanded = if self.expanded == Some(idx) {
            None
        } else {
            Some(idx)
        };
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return false;
        };

        let len = self.entries().len();
        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < len {
                    self.selected += 1;
                }
                true
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle(self.selected);
                true
            }
            KeyCode::Char('r') => {
                if let Some(id) = self.workspace_id.clone() {
                    self.load = ContentLoad::Idle;
                    self.load(services, &id);
                }
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("FAQ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(inner);
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(" Frequently Asked Questions", theme::title())),
                Line::from(Span::styled(
                    " Common questions about PinSage and Graph Convolutional Networks",
                    theme::muted(),
                )),
            ]),
            chunks[0],
        );

        let body = chunks[1];
        let lines: Vec<Line<'static>> = match self.load {
            ContentLoad::Idle => vec![Line::from(Span::styled(
                " Select a workspace to see its FAQ.",
                theme::muted(),
            ))],
            ContentLoad::Loading => {
                vec![Line::from(Span::styled(" Loading FAQ...", theme::muted()))]
            }
            ContentLoad::Failed(ref e) => {
                vec![Line::from(Span::styled(format!(" Error: {e}"), theme::error()))]
            }
            ContentLoad::Ready(ref entries) if entries.is_empty() => {
                vec![Line::from(Span::styled(" No questions yet.", theme::muted()))]
            }
            ContentLoad::Ready(ref entries) => self.entry_lines(entries),
        };

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
    }

    fn entry_lines(&self, entries: &[FaqEntry]) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            let open = self.expanded == Some(i);
            let marker = if open { "▾" } else { "▸" };
            let style = if i == self.selected {
                theme::highlight()
            } else {
                Style::default().fg(theme::TEXT)
            };
            lines.push(Line::from(Span::styled(
                format!(" {marker} {}", entry.question),
                style,
            )));
            if open {
                for para in entry.answer.lines() {
                    lines.push(Line::from(Span::styled(format!("     {para}"), theme::muted())));
                }
            }
            lines.push(Line::from(Span::styled(" ─────", theme::dim())));
        }
        lines
    }
}

impl Default for FaqState {
    fn default() -> Self {
        Self::new()
    }
}
