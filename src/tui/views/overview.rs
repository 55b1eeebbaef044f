//! Study-guide overview for the active workspace.
//!
//! Left pane lists sections and tracks the one under the observation band as
//! the document scrolls. The active section's quiz sits under the document.

use std::cell::Cell;
use std::collections::HashMap;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use crate::api::models::StudyGuide;
use crate::api::ApiError;
use crate::core::content::{ContentLoad, RequestSlot};
use crate::core::quiz::{QuizQuestion, SectionQuiz};
use crate::core::section_nav::{SectionAnchor, SectionNav};
use crate::core::study_guide::{resolve_images, OverviewLoader, OverviewPhase, ResolvedImage};
use crate::tui::layout::OverviewPanes;
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::markdown::markdown_to_lines;
use crate::tui::widgets::wrap::wrap_lines;

/// Delay between checking a section-quiz answer and moving on.
const AUTO_ADVANCE_MS: u64 = 1500;

type QuizResult = (String, Result<Vec<QuizQuestion>, ApiError>);

/// Unwrapped document lines with the source line of every section heading.
#[derive(Debug, Clone)]
struct GuideSource {
    lines: Vec<Line<'static>>,
    anchors: Vec<SectionAnchor>,
}

/// Source wrapped to the current width.
struct GuideDocument {
    source: GuideSource,
    lines: Vec<Line<'static>>,
    width: usize,
    nav: SectionNav,
}

impl GuideDocument {
    fn new(source: GuideSource, width: usize) -> Self {
        let mut doc = Self {
            source,
            lines: Vec::new(),
            width: 0,
            nav: SectionNav::default(),
        };
        doc.relayout(width);
        doc
    }

    /// Rewrap for `width`. The active section is recomputed by the caller.
    fn relayout(&mut self, width: usize) {
        let (lines, starts) = wrap_lines(&self.source.lines, width);
        let anchors = self
            .source
            .anchors
            .iter()
            .map(|a| SectionAnchor {
                line: starts.get(a.line).copied().unwrap_or(a.line),
                ..a.clone()
            })
            .collect();
        self.lines = lines;
        self.width = width;
        self.nav = SectionNav::new(anchors);
    }
}

fn image_lines(images: &[ResolvedImage]) -> Vec<Line<'static>> {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            let page = img
                .page_number
                .map(|p| format!(" (page {p})"))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!("  ▣ Figure {}: {}{page} ", i + 1, img.filename),
                    Style::default().fg(theme::IMAGE),
                ),
                Span::styled(img.url.clone(), theme::dim().add_modifier(Modifier::UNDERLINED)),
            ])
        })
        .collect()
}

/// Render the guide to lines. Images only appear when `base_url` is known.
fn build_source(guide: &StudyGuide, base_url: Option<&str>) -> GuideSource {
    let images = |names: &[String]| -> Vec<Line<'static>> {
        match base_url {
            Some(base) => image_lines(&resolve_images(base, guide, names)),
            None => Vec::new(),
        }
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut anchors = Vec::new();

    if !guide.original_filename.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Source: {}", guide.original_filename),
            theme::muted(),
        )));
        lines.push(Line::raw(""));
    }

    for section in &guide.sections {
        anchors.push(SectionAnchor {
            section_id: section.section_id.clone(),
            title: section.section_title.clone(),
            line: lines.len(),
        });
        lines.push(Line::from(Span::styled(
            section.section_title.clone(),
            theme::title(),
        )));

        if !section.section_overview_description.is_empty() {
            lines.extend(markdown_to_lines(&section.section_overview_description));
        }
        lines.extend(images(&section.associated_image_filenames));

        for sub in &section.subsections {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                sub.subsection_title.clone(),
                theme::heading(),
            )));
            lines.extend(markdown_to_lines(&sub.explanation));
            lines.extend(images(&sub.associated_image_filenames));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("─".repeat(24), theme::dim())));
        lines.push(Line::raw(""));
    }

    GuideSource { lines, anchors }
}

pub struct OverviewState {
    loader: OverviewLoader,
    doc: Option<GuideDocument>,
    questions: ContentLoad<Vec<QuizQuestion>>,
    section_quizzes: HashMap<String, SectionQuiz>,
    /// Section whose quiz advances once the countdown reaches zero.
    pending_advance: Option<(String, u32)>,
    scroll: usize,
    /// Document viewport (width, height) from the last render.
    viewport: Cell<(u16, u16)>,
    quiz_request: RequestSlot,
    quiz_tx: mpsc::UnboundedSender<QuizResult>,
    quiz_rx: mpsc::UnboundedReceiver<QuizResult>,
}

impl OverviewState {
    pub fn new() -> Self {
        let (quiz_tx, quiz_rx) = mpsc::unbounded_channel();
        Self {
            loader: OverviewLoader::new(),
            doc: None,
            questions: ContentLoad::Idle,
            section_quizzes: HashMap::new(),
            pending_advance: None,
            scroll: 0,
            viewport: Cell::new((80, 24)),
            quiz_request: RequestSlot::new(),
            quiz_tx,
            quiz_rx,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.loader.workspace_id()
    }

    /// Id of the section under the observation band.
    pub fn active_section(&self) -> Option<&str> {
        self.doc.as_ref().and_then(|d| d.nav.active_id())
    }

    /// Point the overview at `workspace_id`. No-op when it is already shown.
    pub fn set_workspace(&mut self, services: &Services, workspace_id: &str) {
        if !self.loader.set_workspace(&services.client, workspace_id) {
            return;
        }
        self.clear_document();
        self.fetch_quiz(services, workspace_id);
    }

    /// Show `workspace_id`, refetching even if it is already shown.
    pub fn reload(&mut self, services: &Services, workspace_id: &str) {
        if self.loader.workspace_id() == Some(workspace_id) {
            self.refresh(services);
        } else {
            self.set_workspace(services, workspace_id);
        }
    }

    fn refresh(&mut self, services: &Services) {
        let Some(id) = self.loader.workspace_id().map(str::to_string) else {
            return;
        };
        self.loader.refresh(&services.client);
        self.clear_document();
        self.fetch_quiz(services, &id);
    }

    fn clear_document(&mut self) {
        self.doc = None;
        self.scroll = 0;
        self.section_quizzes.clear();
        self.pending_advance = None;
    }

    fn fetch_quiz(&mut self, services: &Services, workspace_id: &str) {
        self.questions = ContentLoad::Loading;
        let tx = self.quiz_tx.clone();
        let content = services.content.clone();
        let id = workspace_id.to_string();
        self.quiz_request.spawn(async move {
            let result = content.quiz(&id).await;
            let _ = tx.send((id, result));
        });
    }

    pub fn poll(&mut self, services: &Services) {
        if self.loader.poll() {
            if let OverviewPhase::Loaded { ref guide, .. } = *self.loader.phase() {
                let base = services.client.base_url().ok();
                let source = build_source(guide, base);
                log::debug!(
                    "Built overview: {} sections, {} lines",
                    source.anchors.len(),
                    source.lines.len()
                );
                self.doc = Some(GuideDocument::new(source, self.viewport.get().0 as usize));
                self.scroll = 0;
                self.observe();
                self.build_section_quizzes();
            }
        }

        while let Ok((id, result)) = self.quiz_rx.try_recv() {
            if self.loader.workspace_id() != Some(id.as_str()) {
                continue;
            }
            self.quiz_request.finish();
            self.questions = ContentLoad::from_result(result);
            self.build_section_quizzes();
        }

        let width = self.viewport.get().0 as usize;
        if let Some(ref mut doc) = self.doc {
            if doc.width != width {
                doc.relayout(width);
                self.observe();
            }
        }

        if let Some((section_id, ticks)) = self.pending_advance.take() {
            if ticks == 0 {
                if let Some(quiz) = self.section_quizzes.get_mut(&section_id) {
                    quiz.advance();
                }
            } else {
                self.pending_advance = Some((section_id, ticks - 1));
            }
        }
    }

    fn build_section_quizzes(&mut self) {
        let (Some(doc), ContentLoad::Ready(questions)) = (&self.doc, &self.questions) else {
            return;
        };
        self.section_quizzes = doc
            .source
            .anchors
            .iter()
            .map(|a| (a.section_id.clone(), SectionQuiz::for_section(questions, &a.section_id)))
            .filter(|(_, quiz)| !quiz.is_empty())
            .collect();
    }

    fn viewport_height(&self) -> usize {
        self.viewport.get().1 as usize
    }

    fn max_scroll(&self) -> usize {
        self.doc
            .as_ref()
            .map(|d| d.lines.len().saturating_sub(self.viewport_height()))
            .unwrap_or(0)
    }

    fn observe(&mut self) {
        let height = self.viewport_height();
        let scroll = self.scroll;
        if let Some(ref mut doc) = self.doc {
            if let Some(id) = doc.nav.observe(scroll, height) {
                log::trace!("Active section: {id}");
            }
            doc.nav.sync_selection_to_active();
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let target = self.scroll as isize + delta;
        self.scroll = (target.max(0) as usize).min(self.max_scroll());
        self.observe();
    }

    /// Scroll so the section heading sits on the observation band.
    fn jump_to(&mut self, line: usize) {
        let band_offset = SectionNav::band_line(0, self.viewport_height());
        self.scroll = line.saturating_sub(band_offset).min(self.max_scroll());
        self.observe();
    }

    fn jump_section(&mut self, forward: bool) {
        let Some(ref mut doc) = self.doc else {
            return;
        };
        if forward {
            doc.nav.select_next();
        } else {
            doc.nav.select_prev();
        }
        let target = doc
            .nav
            .anchors()
            .get(doc.nav.selected())
            .and_then(|a| doc.nav.scroll_to(&a.section_id));
        if let Some(line) = target {
            self.jump_to(line);
        }
    }

    fn active_quiz_mut(&mut self) -> Option<(String, &mut SectionQuiz)> {
        let id = self.active_section()?.to_string();
        let quiz = self.section_quizzes.get_mut(&id)?;
        Some((id, quiz))
    }

    fn handle_quiz_key(&mut self, code: KeyCode, services: &Services) -> bool {
        let advance_ticks = (AUTO_ADVANCE_MS / services.config.tui.tick_rate_ms.max(1)) as u32;
        let Some((section_id, quiz)) = self.active_quiz_mut() else {
            return false;
        };

        match code {
            KeyCode::Char(c @ '1'..='9') => {
                let option = (c as usize) - ('1' as usize);
                quiz.select(option);
                true
            }
            KeyCode::Char('c') => {
                if quiz.check().is_some() {
                    self.pending_advance = Some((section_id, advance_ticks));
                }
                true
            }
            KeyCode::Char('n') => {
                if quiz.advance() {
                    self.pending_advance = None;
                }
                true
            }
            KeyCode::Char('s') => {
                quiz.skip();
                self.pending_advance = None;
                true
            }
            _ => false,
        }
    }

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return false;
        };

        let page = (self.viewport_height() / 2).max(1) as isize;
        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.scroll_by(1);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.scroll_by(-1);
                true
            }
            (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::PageDown) => {
                self.scroll_by(page);
                true
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) | (_, KeyCode::PageUp) => {
                self.scroll_by(-page);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => {
                self.scroll = 0;
                self.observe();
                true
            }
            (KeyModifiers::SHIFT, KeyCode::Char('G')) | (_, KeyCode::End) => {
                self.scroll = self.max_scroll();
                self.observe();
                true
            }
            (KeyModifiers::NONE, KeyCode::Char(']')) => {
                self.jump_section(true);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('[')) => {
                self.jump_section(false);
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                self.refresh(services);
                true
            }
            (KeyModifiers::NONE, code) => self.handle_quiz_key(code, services),
            _ => false,
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match self.loader.phase() {
            OverviewPhase::Loaded {
                workspace_title, ..
            }
            | OverviewPhase::Empty { workspace_title } => workspace_title.as_str(),
            _ => "Overview",
        };
        let block = theme::block_focused(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match self.loader.phase() {
            OverviewPhase::Idle => message(frame, inner, " Select a workspace to view its study guide.", theme::muted()),
            OverviewPhase::Loading => message(frame, inner, " Loading study guide...", theme::muted()),
            OverviewPhase::Error(e) => {
                let lines = vec![
                    Line::from(Span::styled(format!(" Error: {e}"), theme::error())),
                    Line::raw(""),
                    Line::from(Span::styled(" [r] retry", theme::key_hint())),
                ];
                frame.render_widget(Paragraph::new(lines), inner);
            }
            OverviewPhase::Empty { .. } => message(
                frame,
                inner,
                " No study guide yet. Upload materials to generate one.",
                theme::muted(),
            ),
            OverviewPhase::Loaded { .. } => self.render_loaded(frame, inner),
        }
    }

    fn render_loaded(&self, frame: &mut Frame, area: Rect) {
        let Some(ref doc) = self.doc else {
            return;
        };

        let active_quiz = self
            .active_section()
            .and_then(|id| self.section_quizzes.get(id));
        let panes = OverviewPanes::split(area, active_quiz.is_some());

        if let Some(nav_area) = panes.sections {
            self.render_sections(frame, nav_area, &doc.nav);
        }
        self.render_document(frame, panes.document, doc);
        if let (Some(quiz), Some(quiz_area)) = (active_quiz, panes.quiz) {
            render_section_quiz(frame, quiz_area, quiz);
        }
    }

    fn render_sections(&self, frame: &mut Frame, area: Rect, nav: &SectionNav) {
        let block = theme::block_default("Sections");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if nav.is_empty() {
            message(frame, inner, " No sections found.", theme::muted());
            return;
        }

        let max = (inner.width as usize).saturating_sub(3);
        let active = nav.active_id();
        let lines: Vec<Line<'static>> = nav
            .anchors()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let is_active = active == Some(a.section_id.as_str());
                let marker = if i == nav.selected() { "▸ " } else { "  " };
                let style = if is_active {
                    theme::highlight()
                } else {
                    theme::muted()
                };
                let title: String = a.title.chars().take(max).collect();
                Line::from(Span::styled(format!("{marker}{title}"), style))
            })
            .collect();

        let scroll = (nav.selected() + 1).saturating_sub(inner.height as usize);
        frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);
    }

    fn render_document(&self, frame: &mut Frame, area: Rect, doc: &GuideDocument) {
        // One column for the scrollbar.
        let text_area = Rect {
            width: area.width.saturating_sub(2),
            x: area.x + 1,
            ..area
        };
        self.viewport.set((text_area.width, text_area.height));

        let visible = text_area.height as usize;
        let scroll = self.scroll.min(doc.lines.len().saturating_sub(visible));
        let lines: Vec<Line> = doc.lines.iter().skip(scroll).take(visible).cloned().collect();
        frame.render_widget(Paragraph::new(lines), text_area);

        if doc.lines.len() > visible {
            let mut state = ScrollbarState::new(doc.lines.len())
                .position(scroll)
                .viewport_content_length(visible);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area,
                &mut state,
            );
        }
    }
}

fn message(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(text.to_string(), style))),
        area,
    );
}

fn section_quiz_lines(quiz: &SectionQuiz) -> Vec<Line<'static>> {
    let Some(question) = quiz.current() else {
        return vec![
            Line::from(Span::styled(" Section quiz complete.", theme::muted())),
        ];
    };
    let (pos, total) = quiz.position().unwrap_or((1, quiz.len()));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!(" Question {pos} of {total}"), theme::muted()),
            Span::styled("   [s] Skip", theme::key_hint()),
        ]),
        Line::from(Span::styled(
            format!(" {}", question.question),
            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
        )),
    ];

    for (i, option) in question.options.iter().enumerate() {
        let picked = quiz.selected() == Some(i);
        let style = if quiz.is_checked() && question.is_correct(i) {
            Style::default().fg(theme::SUCCESS)
        } else if quiz.is_checked() && picked {
            Style::default().fg(theme::ERROR)
        } else if picked {
            Style::default().fg(theme::PRIMARY_LIGHT).add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };
        let mark = match (quiz.is_checked(), picked, question.is_correct(i)) {
            (true, _, true) => "✓",
            (true, true, false) => "✗",
            (_, true, _) => "•",
            _ => " ",
        };
        lines.push(Line::from(Span::styled(
            format!("  [{mark}] {}. {option}", i + 1),
            style,
        )));
    }

    let footer = if quiz.is_checked() {
        " [n] next"
    } else if quiz.can_check() {
        " [c] Check Answer"
    } else {
        " [1-4] choose an answer"
    };
    lines.push(Line::from(Span::styled(footer, theme::key_hint())));
    lines
}

fn render_section_quiz(frame: &mut Frame, area: Rect, quiz: &SectionQuiz) {
    let block = theme::block_default("Quiz");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(section_quiz_lines(quiz)).wrap(Wrap { trim: false }),
        inner,
    );
}

impl Default for OverviewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ExtractedImage, StudyGuideSection, StudyGuideSubsection};

    fn guide() -> StudyGuide {
        StudyGuide {
            id: "g1".into(),
            original_filename: "pinsage.pdf".into(),
            workspace_id: Some("w1".into()),
            original_pdf_gridfs_id: None,
            extracted_images: vec![ExtractedImage {
                filename: "fig1.png".into(),
                page_number: Some(3),
                gridfs_id: Some("abc".into()),
            }],
            sections: vec![
                StudyGuideSection {
                    section_id: "1".into(),
                    section_title: "Introduction".into(),
                    section_overview_description: "Graphs are *everywhere*.".into(),
                    subsection_titles: vec![],
                    subsections: vec![StudyGuideSubsection {
                        subsection_title: "Motivation".into(),
                        explanation: "Scale matters.".into(),
                        associated_image_filenames: vec!["fig1.png".into(), "missing.png".into()],
                    }],
                    associated_image_filenames: vec![],
                },
                StudyGuideSection {
                    section_id: "2".into(),
                    section_title: "Method".into(),
                    section_overview_description: String::new(),
                    subsection_titles: vec![],
                    subsections: vec![],
                    associated_image_filenames: vec![],
                },
            ],
        }
    }

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_anchors_point_at_section_titles() {
        let source = build_source(&guide(), None);
        let rows = text(&source.lines);
        assert_eq!(source.anchors.len(), 2);
        for anchor in &source.anchors {
            assert_eq!(rows[anchor.line], anchor.title);
        }
    }

    #[test]
    fn test_only_resolved_images_render() {
        let source = build_source(&guide(), Some("http://api"));
        let image_rows: Vec<String> = text(&source.lines)
            .into_iter()
            .filter(|l| l.contains("Figure"))
            .collect();
        assert_eq!(image_rows.len(), 1);
        assert!(image_rows[0].contains("http://api/api/files/gridfs/abc"));
        assert!(image_rows[0].contains("page 3"));
    }

    #[test]
    fn test_no_images_without_backend() {
        let source = build_source(&guide(), None);
        assert!(!text(&source.lines).iter().any(|l| l.contains("Figure")));
    }

    #[test]
    fn test_relayout_keeps_anchors_on_titles() {
        let mut g = guide();
        g.sections[0].section_overview_description =
            "a long overview sentence that will need several rows when narrow".into();
        let doc = GuideDocument::new(build_source(&g, None), 12);
        let rows = text(&doc.lines);
        for anchor in doc.nav.anchors() {
            assert_eq!(rows[anchor.line], anchor.title);
        }
    }

    #[test]
    fn test_section_quiz_lines_progress() {
        let questions = vec![QuizQuestion {
            id: "q1".into(),
            question: "Pick one".into(),
            options: vec!["x".into(), "y".into()],
            correct_answer: 1,
            section_id: "1".into(),
        }];
        let mut quiz = SectionQuiz::for_section(&questions, "1");
        let rows = text(&section_quiz_lines(&quiz));
        assert!(rows[0].contains("Question 1 of 1"));

        quiz.select(0);
        quiz.check();
        let rows = text(&section_quiz_lines(&quiz));
        assert!(rows.iter().any(|r| r.contains("[✓] 2. y")));
        assert!(rows.iter().any(|r| r.contains("[✗] 1. x")));

        quiz.advance();
        assert_eq!(text(&section_quiz_lines(&quiz)), vec![" Section quiz complete."]);
    }
}
