use std::io;
use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::core::staging::FileStore;

use super::events::{Action, AppEvent, AreaFocus, Focus, Notification, NotificationLevel};
use super::layout::{self, Shell};
use super::services::Services;
use super::sidebar::SidebarState;
use super::theme;
use super::views::chat::ChatState;
use super::views::faq::FaqState;
use super::views::home::HomeState;
use super::views::overview::OverviewState;
use super::views::quiz::QuizViewState;
use super::views::uploads::UploadsState;
use super::views::workspaces::WorkspacesState;

/// Maximum notifications shown at once.
const MAX_NOTIFICATIONS: usize = 3;

/// Central application state (Elm architecture).
pub struct AppState {
    pub running: bool,
    /// Currently focused top-level view.
    pub focus: Focus,
    /// Whether sidebar or main content has input focus.
    pub area_focus: AreaFocus,
    pub sidebar: SidebarState,
    /// Files staged for upload. Survives view switches.
    pub files: FileStore,
    /// Workspace the Uploads/Overview/Chat/Quiz/FAQ views operate on.
    pub workspace_id: Option<String>,
    pub home: HomeState,
    pub workspaces: WorkspacesState,
    pub uploads: UploadsState,
    pub overview: OverviewState,
    pub chat: ChatState,
    pub quiz: QuizViewState,
    pub faq: FaqState,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    notification_counter: u64,
    pub show_help: bool,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    services: Services,
}

impl AppState {
    pub fn new(
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
        services: Services,
    ) -> Self {
        Self {
            running: true,
            focus: Focus::Home,
            area_focus: AreaFocus::Main,
            sidebar: SidebarState::new(),
            files: FileStore::new(),
            workspace_id: None,
            home: HomeState::new(),
            workspaces: WorkspacesState::new(),
            uploads: UploadsState::new(),
            overview: OverviewState::new(),
            chat: ChatState::new(),
            quiz: QuizViewState::new(),
            faq: FaqState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            event_rx,
            event_tx,
            services,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    /// Queue an action to run on the next loop iteration.
    pub fn dispatch(&self, action: Action) {
        let _ = self.event_tx.send(AppEvent::Action(action));
    }

    // ── Event handling ──────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                let crossterm_event = mouse_to_key(&crossterm_event).unwrap_or(crossterm_event);

                // Priority 1: Help modal
                if self.show_help {
                    if let Some(action) = self.map_help_input(&crossterm_event) {
                        self.handle_action(action);
                    }
                    return;
                }

                // Priority 2: Sidebar input (when focused)
                if self.area_focus == AreaFocus::Sidebar && self.handle_sidebar_input(&crossterm_event) {
                    return;
                }

                // Priority 3: Focused view
                if self.dispatch_view_input(&crossterm_event) {
                    return;
                }

                // Priority 4: Global keybindings
                if let Some(action) = self.map_input_to_action(crossterm_event) {
                    self.handle_action(action);
                }
            }
            AppEvent::Action(action) => self.handle_action(action),
            AppEvent::Tick => self.on_tick(),
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Quit => {
                self.running = false;
            }
        }
    }

    /// Dispatch input to the currently focused view. Returns true if consumed.
    fn dispatch_view_input(&mut self, event: &Event) -> bool {
        match self.focus {
            Focus::Home => self.home.handle_input(event, &self.services),
            Focus::Workspaces => self.workspaces.handle_input(event, &self.services),
            Focus::Uploads => self.uploads.handle_input(
                event,
                &mut self.files,
                &self.services,
                self.workspace_id.as_deref(),
            ),
            Focus::Overview => self.overview.handle_input(event, &self.services),
            Focus::Chat => self.chat.handle_input(event),
            Focus::Quiz => self.quiz.handle_input(event, &self.services),
            Focus::Faq => self.faq.handle_input(event, &self.services),
        }
    }

    /// Handle sidebar-specific input. Returns true if consumed.
    fn handle_sidebar_input(&mut self, event: &Event) -> bool {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return false;
        };

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.sidebar.select_next();
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.sidebar.select_prev();
                true
            }
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char('l')) => {
                let focus = self.sidebar.selected_focus();
                self.handle_action(focus.to_action());
                self.area_focus = AreaFocus::Main;
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('h')) => {
                self.sidebar.set_open(false);
                self.area_focus = AreaFocus::Main;
                true
            }
            (KeyModifiers::NONE, KeyCode::Esc) => {
                self.area_focus = AreaFocus::Main;
                true
            }
            _ => false,
        }
    }

    // ── Input mapping ───────────────────────────────────────────────────

    fn map_help_input(&self, event: &Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };

        match code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::CloseHelp),
            _ => None,
        }
    }

    fn map_input_to_action(&self, event: Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };

        match (modifiers, code) {
            (KeyModifiers::CONTROL, KeyCode::Char('b')) => Some(Action::ToggleSidebar),
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, _) => match code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ShowHelp),
                KeyCode::Tab => Some(Action::TabNext),
                KeyCode::BackTab => Some(Action::TabPrev),
                KeyCode::Char(c @ '1'..='7') => {
                    let idx = (c as usize) - ('1' as usize);
                    Focus::ALL.get(idx).map(|f| f.to_action())
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::FocusHome => self.focus_view(Focus::Home),
            Action::FocusWorkspaces => self.focus_view(Focus::Workspaces),
            Action::FocusUploads => self.focus_view(Focus::Uploads),
            Action::FocusOverview => self.focus_view(Focus::Overview),
            Action::FocusChat => self.focus_view(Focus::Chat),
            Action::FocusQuiz => self.focus_view(Focus::Quiz),
            Action::FocusFaq => self.focus_view(Focus::Faq),
            Action::TabNext => {
                let next = self.next_available(Focus::next);
                self.focus_view(next);
            }
            Action::TabPrev => {
                let prev = self.next_available(Focus::prev);
                self.focus_view(prev);
            }
            Action::SelectWorkspace(id) => {
                self.set_workspace(id);
                self.focus_view(Focus::Uploads);
            }
            Action::OpenOverview(id) => {
                self.set_workspace(id.clone());
                self.set_focus(Focus::Overview);
                self.overview.reload(&self.services, &id);
            }
            Action::ToggleSidebar => {
                self.sidebar.toggle_open();
                if self.sidebar.is_open() {
                    self.area_focus = AreaFocus::Sidebar;
                    self.sidebar.sync_to_focus(self.focus);
                } else {
                    self.area_focus = AreaFocus::Main;
                }
            }
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
        }
    }

    /// Switch the active workspace. In-flight uploads for another one stop.
    fn set_workspace(&mut self, id: String) {
        if self.workspace_id.as_deref() == Some(id.as_str()) {
            return;
        }
        if self.uploads.is_submitting() {
            log::info!("Workspace changed; cancelling upload");
        }
        self.uploads.cancel();
        self.chat.cancel();
        self.quiz.cancel();
        self.faq.cancel();
        log::info!("Active workspace: {id}");
        self.workspace_id = Some(id);
    }

    /// Next view in `step` order that can be shown right now.
    fn next_available(&self, step: fn(Focus) -> Focus) -> Focus {
        let mut candidate = step(self.focus);
        while candidate != self.focus {
            if !candidate.needs_workspace() || self.workspace_id.is_some() {
                return candidate;
            }
            candidate = step(candidate);
        }
        candidate
    }

    /// Focus a view and load its data. Workspace views without a workspace
    /// redirect to the workspace list.
    fn focus_view(&mut self, focus: Focus) {
        if focus.needs_workspace() && self.workspace_id.is_none() {
            self.push_notification(
                format!("Select a workspace to open {}", focus.label()),
                NotificationLevel::Warning,
            );
            self.set_focus(Focus::Workspaces);
        } else {
            self.set_focus(focus);
        }
        self.on_focus_changed();
    }

    /// Set focus and sync sidebar selection.
    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.sidebar.sync_to_focus(focus);
        self.area_focus = AreaFocus::Main;
    }

    fn on_focus_changed(&mut self) {
        let workspace = self.workspace_id.clone();
        match (self.focus, workspace.as_deref()) {
            (Focus::Workspaces, _) => self.workspaces.load(&self.services),
            (Focus::Overview, Some(id)) => self.overview.set_workspace(&self.services, id),
            (Focus::Chat, Some(id)) => self.chat.open(id),
            (Focus::Quiz, Some(id)) => self.quiz.load(&self.services, id),
            (Focus::Faq, Some(id)) => self.faq.load(&self.services, id),
            _ => {}
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        match level {
            NotificationLevel::Error => log::error!("{message}"),
            NotificationLevel::Warning => log::warn!("{message}"),
            _ => log::info!("{message}"),
        }

        self.notification_counter += 1;
        let mut notification = Notification::new(message, level);
        notification.id = self.notification_counter;
        self.notifications.push(notification);

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, dismiss expired, poll async data.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        self.workspaces.poll(&self.services);
        self.uploads.poll(&mut self.files, &self.services);
        self.overview.poll(&self.services);
        self.chat.poll();
        self.quiz.poll();
        self.faq.poll();
    }

    /// A request is in flight somewhere.
    fn is_busy(&self) -> bool {
        self.uploads.is_submitting() || self.overview.is_loading()
    }

    fn workspace_label(&self) -> Option<&str> {
        let id = self.workspace_id.as_deref()?;
        Some(self.workspaces.title_of(id).unwrap_or(id))
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let shell = Shell::split(area, self.sidebar.width(area.width));

        self.sidebar.render(
            frame,
            shell.sidebar,
            self.focus,
            self.area_focus,
            self.workspace_label(),
        );
        self.render_content(frame, shell.view);
        self.render_status_bar(frame, shell.status);

        // Overlays
        self.render_notifications(frame, area);
        if self.show_help {
            self.render_help_modal(frame, area);
        }
    }

    fn render_content(&self, frame: &mut Frame, area: Rect) {
        match self.focus {
            Focus::Home => self.home.render(frame, area),
            Focus::Workspaces => self.workspaces.render(frame, area),
            Focus::Uploads => self.uploads.render(frame, area, &self.files),
            Focus::Overview => self.overview.render(frame, area),
            Focus::Chat => self.chat.render(frame, area),
            Focus::Quiz => self.quiz.render(frame, area),
            Focus::Faq => self.faq.render(frame, area),
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let activity = if self.is_busy() {
            Span::styled(" BUSY ", theme::busy_badge())
        } else {
            Span::raw("")
        };

        let backend = match self.services.client.base_url() {
            Ok(url) => Span::styled(url.to_string(), theme::muted()),
            Err(_) => Span::styled("no backend", theme::error()),
        };

        let workspace = match self.workspace_label() {
            Some(label) => Span::styled(label.to_string(), Style::default().fg(theme::TEXT)),
            None => Span::styled("no workspace", theme::dim()),
        };

        let status = Line::from(vec![
            Span::styled(" NEURA ", theme::brand_badge()),
            Span::raw(" "),
            activity,
            Span::raw(" "),
            Span::styled(
                self.focus.label(),
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" │ "),
            workspace,
            Span::raw(" │ "),
            backend,
            Span::raw(" │ "),
            Span::styled("Tab", theme::key_hint()),
            Span::raw(":nav "),
            Span::styled("Ctrl+B", theme::key_hint()),
            Span::raw(":sidebar "),
            Span::styled("?", theme::key_hint()),
            Span::raw(":help "),
            Span::styled("q", theme::key_hint()),
            Span::raw(":quit"),
        ]);

        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50.min(area.width.saturating_sub(2));
        let height = self.notifications.len() as u16;
        let x = area.width.saturating_sub(max_width + 1);
        let notification_area = Rect::new(x, 1, max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", theme::INFO),
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {prefix} "),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(n.message.as_str()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)),
            notification_area,
        );
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = layout::centered(60, 80, area);

        let keybindings = [
            ("Global:", ""),
            ("q", "Quit application"),
            ("?", "Toggle this help"),
            ("Tab / Shift+Tab", "Next / previous view"),
            ("1-7", "Jump to view by number"),
            ("Ctrl+B", "Open / close sidebar"),
            ("Ctrl+C", "Force quit"),
            ("", ""),
            ("Sidebar (when focused):", ""),
            ("j/k", "Navigate up/down"),
            ("Enter / l", "Select view"),
            ("h", "Close sidebar"),
            ("Esc", "Focus main content"),
            ("", ""),
            ("Workspaces:", ""),
            ("n", "New notebook"),
            ("Enter", "Open workspace uploads"),
            ("r", "Refresh list"),
            ("", ""),
            ("Uploads:", ""),
            ("a", "Pick files (separate paths with ;)"),
            ("d", "Remove highlighted file"),
            ("g / Enter", "Generate overview"),
            ("Esc", "Cancel running upload"),
            ("", ""),
            ("Overview:", ""),
            ("j/k  Ctrl+D/U", "Scroll line / half page"),
            ("[ / ]", "Previous / next section"),
            ("1-4  c  n  s", "Answer, check, next, skip"),
            ("r", "Reload study guide"),
            ("", ""),
            ("Chat:", ""),
            ("i / Enter", "Start typing"),
            ("Enter", "Send message (while typing)"),
            ("Esc", "Stop typing"),
            ("j/k", "Scroll transcript"),
            ("", ""),
            ("Quiz:", ""),
            ("1-4", "Answer current question"),
            ("j/k", "Move between questions"),
            ("s", "Submit quiz"),
            ("r", "Reset answers"),
            ("", ""),
            ("FAQ:", ""),
            ("Enter / Space", "Expand / collapse answer"),
        ];

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(" Keybindings", theme::title())),
            Line::raw(""),
        ];

        for (key, desc) in &keybindings {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {key}"), theme::title())));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{key:<22}"),
                        Style::default()
                            .fg(theme::PRIMARY_LIGHT)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(*desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled("?", theme::heading()),
            Span::raw(" or "),
            Span::styled("Esc", theme::heading()),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

/// Wheel scrolling acts like the arrow keys in the focused view.
fn mouse_to_key(event: &Event) -> Option<Event> {
    let Event::Mouse(mouse) = event else {
        return None;
    };
    let code = match mouse.kind {
        MouseEventKind::ScrollDown => KeyCode::Down,
        MouseEventKind::ScrollUp => KeyCode::Up,
        _ => return None,
    };
    Some(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}
