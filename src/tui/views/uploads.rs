//! Upload page: stage files, then generate a study guide from them.
//!
//! Left pane is the picker and the generate button, right pane lists what is
//! staged. While a submission runs the button is replaced by a stepped
//! progress display; Esc cancels it.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::core::staging::{format_file_size, FileStore};
use crate::core::upload::{UploadFlow, UploadPhase};
use crate::tui::events::{Action, AppEvent, NotificationLevel};
use crate::tui::picker::{FilePicker, ACCEPTED_EXTENSIONS, PATH_SEPARATOR};
use crate::tui::layout;
use crate::tui::services::Services;
use crate::tui::theme;

/// Captions cycled while a submission is in flight.
pub const LOADING_STEPS: &[&str] = &[
    "Uploading Materials",
    "Analyzing the Content",
    "Understanding Material",
    "Segmenting Sections",
    "Summarizing Sections",
    "Creating Metadata",
];

/// Ticks each loading caption stays on screen.
const TICKS_PER_STEP: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadsMode {
    Normal,
    /// Typing paths into the picker.
    Picking,
}

pub struct UploadsState {
    picker: FilePicker,
    flow: UploadFlow,
    mode: UploadsMode,
    /// Highlighted staged file.
    selected: usize,
    /// Ticks since the current submission started.
    busy_ticks: u32,
}

impl UploadsState {
    pub fn new() -> Self {
        Self {
            picker: FilePicker::new(),
            flow: UploadFlow::new(),
            mode: UploadsMode::Normal,
            selected: 0,
            busy_ticks: 0,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.flow.is_submitting()
    }

    /// True while the picker input owns the keyboard.
    pub fn is_picking(&self) -> bool {
        self.mode == UploadsMode::Picking
    }

    /// Abort any submission and clear a previous result.
    pub fn cancel(&mut self) {
        self.flow.cancel();
        self.flow.reset();
        self.busy_ticks = 0;
    }

    fn loading_step(&self) -> &'static str {
        let idx = (self.busy_ticks / TICKS_PER_STEP) as usize;
        LOADING_STEPS[idx.min(LOADING_STEPS.len() - 1)]
    }

    /// Drain upload progress. Navigates to the overview once the batch is done.
    pub fn poll(&mut self, files: &mut FileStore, services: &Services) {
        if self.flow.is_submitting() {
            self.busy_ticks = self.busy_ticks.saturating_add(1);
        }

        let was_submitting = self.flow.is_submitting();
        let finished = self.flow.poll(files);
        self.selected = self.selected.min(files.len().saturating_sub(1));

        if let Some(done) = finished {
            self.busy_ticks = 0;
            log::info!(
                "Uploaded {} file(s) to workspace {}",
                done.study_guide_ids.len(),
                done.workspace_id
            );
            if !done.ready {
                services.notify(
                    "Study guide is still processing; refresh the overview shortly",
                    NotificationLevel::Warning,
                );
            }
            let _ = services
                .event_tx
                .send(AppEvent::Action(Action::OpenOverview(done.workspace_id)));
        } else if was_submitting {
            if let Some(err) = self.flow.error() {
                self.busy_ticks = 0;
                services.notify(format!("Upload failed: {err}"), NotificationLevel::Error);
            }
        }
    }

    fn generate(&mut self, files: &FileStore, services: &Services, workspace_id: Option<&str>) {
        match self.flow.begin(&services.client, workspace_id, files) {
            Ok(plan) => {
                log::info!(
                    "Submitting {} file(s) to workspace {}",
                    plan.items.len(),
                    plan.workspace_id
                );
                self.busy_ticks = 0;
                self.flow
                    .start(services.client.clone(), plan, services.readiness);
            }
            Err(e) => services.notify(e.to_string(), NotificationLevel::Warning),
        }
    }

    fn stage_selection(&mut self, files: &mut FileStore, services: &Services) {
        match self.picker.handle_selection(files) {
            Ok(selection) => {
                for skipped in &selection.skipped {
                    services.notify(skipped.to_string(), NotificationLevel::Warning);
                }
                if selection.staged > 0 {
                    self.flow.reset();
                    self.selected = files.len().saturating_sub(1);
                }
            }
            Err(e) => services.notify(e.to_string(), NotificationLevel::Warning),
        }
    }

    pub fn handle_input(
        &mut self,
        event: &Event,
        files: &mut FileStore,
        services: &Services,
        workspace_id: Option<&str>,
    ) -> bool {
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

        if self.mode == UploadsMode::Picking {
            match code {
                KeyCode::Esc => {
                    self.picker.input.clear();
                    self.mode = UploadsMode::Normal;
                }
                KeyCode::Enter => {
                    self.stage_selection(files, services);
                    self.mode = UploadsMode::Normal;
                }
                _ => {
                    self.picker.input.handle_key(key);
                }
            }
            return true;
        }

        if self.flow.is_submitting() {
            if *code == KeyCode::Esc {
                self.cancel();
                services.notify("Upload cancelled", NotificationLevel::Info);
                return true;
            }
            return false;
        }

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('a') | KeyCode::Char('o')) => {
                self.mode = UploadsMode::Picking;
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                if self.selected + 1 < files.len() {
                    self.selected += 1;
                }
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('d') | KeyCode::Delete) => {
                let id = files.files().get(self.selected).map(|f| f.id.clone());
                if let Some(id) = id {
                    self.picker.remove_file(files, &id);
                    self.selected = self.selected.min(files.len().saturating_sub(1));
                }
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Enter) => {
                if !files.is_empty() {
                    self.generate(files, services, workspace_id);
                }
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, files: &FileStore) {
        let (left, right) = layout::columns(area);
        self.render_picker(frame, left, files);
        self.render_staged(frame, right, files);
    }

    fn render_picker(&self, frame: &mut Frame, area: Rect, files: &FileStore) {
        let block = if self.mode == UploadsMode::Picking {
            theme::block_focused("Upload Files")
        } else {
            theme::block_default("Upload Files")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::from(Span::styled(
                " Support for images, PDFs, videos, and more",
                theme::muted(),
            )),
            Line::from(Span::styled(
                format!(" {}", ACCEPTED_EXTENSIONS.join(" ")),
                theme::dim(),
            )),
            Line::raw(""),
        ];

        if self.mode == UploadsMode::Picking {
            let mut input = self
                .picker
                .input
                .to_line(Style::default().fg(theme::TEXT), "path/to/file.pdf");
            input.spans.insert(0, Span::styled(" ▸ ", theme::highlight()));
            lines.push(input);
            lines.push(Line::from(Span::styled(
                format!(" Separate paths with '{PATH_SEPARATOR}'.  [Enter] add  [Esc] cancel"),
                theme::key_hint(),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                " [a] Click to upload or drag and drop",
                Style::default().fg(theme::PRIMARY_LIGHT),
            )));
        }
        lines.push(Line::raw(""));

        match self.flow.phase() {
            UploadPhase::Submitting { total, done } => {
                lines.push(Line::from(vec![
                    Span::styled(" Generating... ", theme::busy_badge()),
                    Span::styled(format!("  {done}/{total} uploaded"), theme::muted()),
                ]));
                lines.push(Line::raw(""));
                let current = self.loading_step();
                for step in LOADING_STEPS {
                    let (mark, style) = if *step == current {
                        ("◉", theme::highlight())
                    } else {
                        ("○", theme::dim())
                    };
                    lines.push(Line::from(Span::styled(format!("   {mark} {step}"), style)));
                }
                lines.push(Line::raw(""));
                lines.push(Line::from(Span::styled(" [Esc] cancel", theme::key_hint())));
            }
            UploadPhase::Failed(message) => {
                lines.push(Line::from(Span::styled(format!(" {message}"), theme::error())));
                if !files.is_empty() {
                    lines.push(Line::raw(""));
                    lines.push(generate_button());
                }
            }
            UploadPhase::Idle | UploadPhase::Succeeded { .. } => {
                if !files.is_empty() {
                    lines.push(generate_button());
                }
            }
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn render_staged(&self, frame: &mut Frame, area: Rect, files: &FileStore) {
        let block = theme::block_default("Uploaded Files");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if files.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " No files uploaded yet",
                    theme::muted(),
                ))),
                inner,
            );
            return;
        }

        let name_width = (inner.width as usize).saturating_sub(16).max(8);
        let mut lines: Vec<Line<'static>> = files
            .files()
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let is_selected = i == self.selected;
                let style = if is_selected {
                    theme::highlight()
                } else {
                    Style::default().fg(theme::TEXT)
                };
                let name: String = f.name.chars().take(name_width).collect();
                Line::from(vec![
                    Span::styled(if is_selected { " ▸ " } else { "   " }, style),
                    Span::styled(format!("{name:<name_width$}"), style),
                    Span::styled(format!(" {:>9}", format_file_size(f.size_bytes)), theme::muted()),
                    Span::styled(" ✕", theme::dim()),
                ])
            })
            .collect();

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} file(s), {}", files.len(), format_file_size(files.total_bytes())),
                theme::dim().add_modifier(Modifier::ITALIC),
            ),
        ]));
        lines.push(Line::from(Span::styled(" [d] remove  [j/k] move", theme::key_hint())));

        let visible = inner.height as usize;
        let scroll = (self.selected + 3).saturating_sub(visible);
        frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);
    }
}

fn generate_button() -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(" [g] Generate Overview ", theme::brand_badge()),
    ])
}

impl Default for UploadsState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::AppConfig;
    use crate::core::staging::StagedFile;
    use crate::core::upload::ReadinessPolicy;

    #[test]
    fn test_loading_step_advances_and_saturates() {
        let mut state = UploadsState::new();
        assert_eq!(state.loading_step(), "Uploading Materials");
        state.busy_ticks = TICKS_PER_STEP;
        assert_eq!(state.loading_step(), "Analyzing the Content");
        state.busy_ticks = TICKS_PER_STEP * 100;
        assert_eq!(state.loading_step(), "Creating Metadata");
    }

    #[test]
    fn test_starts_in_normal_mode() {
        let state = UploadsState::new();
        assert!(!state.is_picking());
        assert!(!state.is_submitting());
    }

    /// Upload one file against a mock backend whose study-guide list returns
    /// `listed`, ticking the view until it asks to open the overview.
    async fn upload_and_collect(listed: serde_json::Value) -> Vec<AppEvent> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/workspaces/w1/study-guides"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": "abc123"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/w1/study-guides/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listed))
            .mount(&server)
            .await;

        let mut config = AppConfig::default();
        config.backend.base_url = Some(server.uri());
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut services = Services::init(config, event_tx).unwrap();
        services.readiness = ReadinessPolicy {
            interval: Duration::from_millis(5),
            max_attempts: 2,
        };

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        let mut files = FileStore::new();
        files.add_files(vec![StagedFile::new(
            file,
            "notes.pdf".into(),
            "application/pdf".into(),
            4,
        )]);

        let mut state = UploadsState::new();
        state.generate(&files, &services, Some("w1"));
        assert!(state.is_submitting());

        let mut events = Vec::new();
        for _ in 0..300 {
            state.poll(&mut files, &services);
            while let Ok(event) = event_rx.try_recv() {
                events.push(event);
            }
            let navigated = events
                .iter()
                .any(|e| matches!(e, AppEvent::Action(Action::OpenOverview(_))));
            if navigated {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(files.is_empty());
        events
    }

    fn warnings(events: &[AppEvent]) -> usize {
        events
            .iter()
            .filter(|e| {
                matches!(e, AppEvent::Notification(n) if n.level == NotificationLevel::Warning)
            })
            .count()
    }

    #[tokio::test]
    async fn test_finished_upload_opens_overview() {
        let events = upload_and_collect(json!([{"_id": "abc123"}])).await;
        let opened: Vec<&Action> = events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Action(action) => Some(action),
                _ => None,
            })
            .collect();
        assert_eq!(opened, vec![&Action::OpenOverview("w1".to_string())]);
        assert_eq!(warnings(&events), 0);
    }

    #[tokio::test]
    async fn test_unready_upload_warns_then_opens_overview() {
        let events = upload_and_collect(json!([])).await;
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Action(Action::OpenOverview(id)) if id == "w1")));
        assert_eq!(warnings(&events), 1);
    }
}
