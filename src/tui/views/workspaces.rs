//! Workspace list with create.
//!
//! Fetched on focus. `n` opens a title prompt; Enter on a row makes it the
//! active workspace and jumps to its uploads page.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

use crate::api::models::{display_date, WorkspaceSummary};
use crate::api::ApiError;
use crate::core::content::RequestSlot;
use crate::tui::events::{Action, AppEvent, NotificationLevel};
use crate::tui::layout;
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

enum WorkspaceMsg {
    Listed(Result<Vec<WorkspaceSummary>, ApiError>),
    Created(Result<WorkspaceSummary, ApiError>),
}

pub struct WorkspacesState {
    workspaces: Vec<WorkspaceSummary>,
    loading: bool,
    error: Option<String>,
    selected: usize,
    /// Title prompt, open while `Some`.
    create_input: Option<InputBuffer>,
    creating: bool,
    list_request: RequestSlot,
    create_request: RequestSlot,
    data_tx: mpsc::UnboundedSender<WorkspaceMsg>,
    data_rx: mpsc::UnboundedReceiver<WorkspaceMsg>,
}

impl WorkspacesState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            workspaces: Vec::new(),
            loading: false,
            error: None,
            selected: 0,
            create_input: None,
            creating: false,
            list_request: RequestSlot::new(),
            create_request: RequestSlot::new(),
            data_tx,
            data_rx,
        }
    }

    pub fn workspaces(&self) -> &[WorkspaceSummary] {
        &self.workspaces
    }

    /// Title of a listed workspace, for headers elsewhere.
    pub fn title_of(&self, id: &str) -> Option<&str> {
        self.workspaces
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.title.as_str())
    }

    pub fn load(&mut self, services: &Services) {
        self.loading = true;
        self.error = None;
        let tx = self.data_tx.clone();
        let client = services.client.clone();

        self.list_request.spawn(async move {
            let result = client.list_workspaces().await;
            let _ = tx.send(WorkspaceMsg::Listed(result));
        });
    }

    pub fn poll(&mut self, services: &Services) {
        while let Ok(msg) = self.data_rx.try_recv() {
            match msg {
                WorkspaceMsg::Listed(Ok(list)) => {
                    self.list_request.finish();
                    log::debug!("Loaded {} workspaces", list.len());
                    self.workspaces = list;
                    self.selected = self.selected.min(self.workspaces.len().saturating_sub(1));
                    self.loading = false;
                }
                WorkspaceMsg::Listed(Err(e)) => {
                    self.list_request.finish();
                    log::warn!("Failed to fetch workspaces: {e}");
                    self.error = Some(e.to_string());
                    self.loading = false;
                }
                WorkspaceMsg::Created(Ok(ws)) => {
                    self.create_request.finish();
                    self.creating = false;
                    services.notify(format!("Created \"{}\"", ws.title), NotificationLevel::Success);
                    self.workspaces.push(ws);
                    self.selected = self.workspaces.len() - 1;
                }
                WorkspaceMsg::Created(Err(e)) => {
                    self.create_request.finish();
                    self.creating = false;
                    let level = if e.is_precondition() {
                        NotificationLevel::Warning
                    } else {
                        NotificationLevel::Error
                    };
                    services.notify(format!("Create failed: {e}"), level);
                }
            }
        }
    }

    fn submit_create(&mut self, services: &Services) {
        let Some(mut input) = self.create_input.take() else {
            return;
        };
        let title = input.take();
        if title.trim().is_empty() {
            services.notify("Title cannot be empty", NotificationLevel::Warning);
            self.create_input = Some(input);
            return;
        }

        self.creating = true;
        let tx = self.data_tx.clone();
        let client = services.client.clone();
        self.create_request.spawn(async move {
            let result = client.create_workspace(&title).await;
            let _ = tx.send(WorkspaceMsg::Created(result));
        });
    }

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
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

        if let Some(ref mut input) = self.create_input {
            match code {
                KeyCode::Esc => self.create_input = None,
                KeyCode::Enter => self.submit_create(services),
                _ => {
                    input.handle_key(key);
                }
            }
            return true;
        }

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                if self.selected + 1 < self.workspaces.len() {
                    self.selected += 1;
                }
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('n')) => {
                self.create_input = Some(InputBuffer::new());
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                self.load(services);
                true
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                if let Some(ws) = self.workspaces.get(self.selected) {
                    let _ = services
                        .event_tx
                        .send(AppEvent::Action(Action::SelectWorkspace(ws.id.clone())));
                }
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("My Notebooks");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (body, footer) = layout::with_footer(inner);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "  [n] create  [Enter] open  [r] refresh  [j/k] move",
                theme::key_hint(),
            ))),
            footer,
        );

        if self.loading {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(" Loading workspaces...", theme::muted()))),
                body,
            );
        } else if let Some(ref error) = self.error {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" Error: {error}"), theme::error()))),
                body,
            );
        } else if self.workspaces.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " No notebooks found. Create one!",
                    theme::muted(),
                ))),
                body,
            );
        } else {
            self.render_list(frame, body);
        }

        if self.create_input.is_some() || self.creating {
            self.render_create_modal(frame, area);
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line<'static>> = vec![Line::raw("")];
        for (i, ws) in self.workspaces.iter().enumerate() {
            let is_selected = i == self.selected;
            let marker = if is_selected { "▸ " } else { "  " };
            let title_style = if is_selected {
                theme::highlight()
            } else {
                Style::default().fg(theme::TEXT)
            };
            let date = ws
                .created_at
                .as_deref()
                .map(display_date)
                .unwrap_or_default();

            lines.push(Line::from(vec![
                Span::styled(format!(" {marker}"), title_style),
                Span::styled(ws.title.clone(), title_style),
                Span::raw("  "),
                Span::styled(date, theme::muted()),
            ]));
            if let Some(desc) = ws.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(Line::from(Span::styled(format!("     {desc}"), theme::dim())));
            }
        }

        let visible = area.height as usize;
        let scroll = (self.selected + 2).saturating_sub(visible);
        frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), area);
    }

    fn render_create_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = layout::centered(50, 20, area);
        let block = theme::block_focused("New Notebook");
        let inner = block.inner(modal);
        frame.render_widget(Clear, modal);
        frame.render_widget(block, modal);

        let input_line = match self.create_input {
            Some(ref input) => input.to_line(Style::default().fg(theme::TEXT), "Title"),
            None => Line::from(Span::styled("Creating...", theme::muted())),
        };
        let lines = vec![
            Line::raw(""),
            input_line,
            Line::raw(""),
            Line::from(Span::styled("[Enter] create  [Esc] cancel", theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for WorkspacesState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str) -> WorkspaceSummary {
        WorkspaceSummary {
            id: id.into(),
            title: title.into(),
            description: None,
            created_at: None,
        }
    }

    #[test]
    fn test_title_of() {
        let mut state = WorkspacesState::new();
        state.workspaces = vec![summary("w1", "Graphs"), summary("w2", "Biology")];
        assert_eq!(state.title_of("w2"), Some("Biology"));
        assert_eq!(state.title_of("w3"), None);
    }
}
