//! Whole-workspace quiz: answer every question, submit, review results.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use crate::api::ApiError;
use crate::core::content::{ContentLoad, RequestSlot};
use crate::core::quiz::{QuizQuestion, QuizSession};
use crate::tui::events::NotificationLevel;
use crate::tui::layout;
use crate::tui::services::Services;
use crate::tui::theme;

const QUIZ_TITLE: &str = "Web-Scale Graph Quiz";

type QuizResult = (String, Result<Vec<QuizQuestion>, ApiError>);

pub struct QuizViewState {
    load: ContentLoad<QuizSession>,
    workspace_id: Option<String>,
    /// Question the cursor is on.
    current: usize,
    request: RequestSlot,
    data_tx: mpsc::UnboundedSender<QuizResult>,
    data_rx: mpsc::UnboundedReceiver<QuizResult>,
}

impl QuizViewState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            load: ContentLoad::Idle,
            workspace_id: None,
            current: 0,
            request: RequestSlot::new(),
            data_tx,
            data_rx,
        }
    }

    pub fn load(&mut self, services: &Services, workspace_id: &str) {
        let same = self.workspace_id.as_deref() == Some(workspace_id);
        if same && matches!(self.load, ContentLoad::Ready(_) | ContentLoad::Loading) {
            return;
        }
        self.workspace_id = Some(workspace_id.to_string());
        self.load = ContentLoad::Loading;
        self.current = 0;

        let tx = self.data_tx.clone();
        let content = services.content.clone();
        let id = workspace_id.to_string();
        self.request.spawn(async move {
            let result = content.quiz(&id).await;
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
            self.load = ContentLoad::from_result(result.map(QuizSession::new));
        }
    }

    fn session_mut(&mut self) -> Option<&mut QuizSession> {
        match self.load {
            ContentLoad::Ready(ref mut session) => Some(session),
            _ => None,
        }
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

        let current = self.current;
        let Some(session) = self.session_mut() else {
            return false;
        };
        let total = session.questions().len();

        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                if current + 1 < total {
                    self.current += 1;
                }
                true
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.current = current.saturating_sub(1);
                true
            }
            KeyCode::Char(c @ '1'..='9') => {
                let option = (*c as usize) - ('1' as usize);
                if let Some(qid) = session.questions().get(current).map(|q| q.id.clone()) {
                    if let Err(e) = session.select(&qid, option) {
                        log::debug!("Quiz select ignored: {e}");
                    } else if current + 1 < total {
                        self.current += 1;
                    }
                }
                true
            }
            KeyCode::Char('s') | KeyCode::Enter => {
                match session.submit() {
                    Ok(()) => {
                        services.notify(
                            format!("Your Score: {}", session.summary()),
                            NotificationLevel::Success,
                        );
                    }
                    Err(e) => services.notify(e.to_string(), NotificationLevel::Warning),
                }
                true
            }
            KeyCode::Char('r') => {
                session.reset();
                self.current = 0;
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("Quiz");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let session = match self.load {
            ContentLoad::Idle => {
                render_message(frame, inner, " Select a workspace to take its quiz.", theme::muted());
                return;
            }
            ContentLoad::Loading => {
                render_message(frame, inner, " Loading quiz...", theme::muted());
                return;
            }
            ContentLoad::Failed(ref e) => {
                render_message(frame, inner, &format!(" Error: {e}"), theme::error());
                return;
            }
            ContentLoad::Ready(ref session) => session,
        };

        if session.questions().is_empty() {
            render_message(frame, inner, " No quiz questions for this workspace.", theme::muted());
            return;
        }

        let (body, footer) = layout::with_footer(inner);
        let (lines, focus_line) = if session.is_submitted() {
            (results_lines(session), 0)
        } else {
            question_lines(session, self.current)
        };

        let visible = body.height as usize;
        let scroll = focus_line.saturating_sub(visible / 2) as u16;
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            body,
        );

        let hints = if session.is_submitted() {
            " [r] retake"
        } else {
            " [1-4] answer  [j/k] question  [s] submit  [r] reset"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hints, theme::key_hint()))),
            footer,
        );
    }
}

fn render_message(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(text.to_string(), style))),
        area,
    );
}

/// Question list with the selection marked. Returns the line of the current question.
fn question_lines(session: &QuizSession, current: usize) -> (Vec<Line<'static>>, usize) {
    let total = session.questions().len();
    let mut lines = vec![
        Line::from(Span::styled(format!(" {QUIZ_TITLE}"), theme::title())),
        Line::from(Span::styled(
            format!(" Answer all {total} questions to complete the quiz."),
            theme::muted(),
        )),
        Line::raw(""),
    ];
    let mut focus_line = 0;

    for (i, q) in session.questions().iter().enumerate() {
        let is_current = i == current;
        if is_current {
            focus_line = lines.len();
        }
        let header_style = if is_current {
            theme::highlight()
        } else {
            theme::heading()
        };
        lines.push(Line::from(Span::styled(format!(" Question {}", i + 1), header_style)));
        lines.push(Line::from(Span::styled(
            format!(" {}", q.question),
            Style::default().fg(theme::TEXT),
        )));

        let chosen = session.answer(&q.id);
        for (j, option) in q.options.iter().enumerate() {
            let picked = chosen == Some(j);
            let radio = if picked { "(•)" } else { "( )" };
            let style = if picked {
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD)
            } else {
                theme::muted()
            };
            lines.push(Line::from(Span::styled(
                format!("   {radio} {}. {option}", j + 1),
                style,
            )));
        }
        lines.push(Line::raw(""));
    }

    let submit_style = if session.all_answered() {
        theme::brand_badge()
    } else {
        theme::dim()
    };
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(" Submit Quiz ", submit_style),
        Span::styled(
            format!("  {}/{} answered", session.answered(), total),
            theme::dim(),
        ),
    ]));

    (lines, focus_line)
}

fn results_lines(session: &QuizSession) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(" Quiz Results", theme::title())),
        Line::from(Span::styled(
            format!(" Your Score: {}", session.summary()),
            theme::heading(),
        )),
        Line::raw(""),
    ];

    for (i, result) in session.results().into_iter().enumerate() {
        let (mark, color) = if result.correct {
            ("✓", theme::SUCCESS)
        } else {
            ("✗", theme::ERROR)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {mark} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(format!("{}. {}", i + 1, result.question), Style::default().fg(theme::TEXT)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("     Your answer: ", theme::muted()),
            Span::styled(result.chosen.unwrap_or_default(), Style::default().fg(color)),
        ]));
        if !result.correct {
            lines.push(Line::from(vec![
                Span::styled("     Correct answer: ", theme::muted()),
                Span::styled(
                    result.correct_option.unwrap_or_default(),
                    Style::default().fg(theme::SUCCESS),
                ),
            ]));
        }
        lines.push(Line::raw(""));
    }
    lines
}

impl Default for QuizViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::api::NeuraClient;
    use crate::config::AppConfig;
    use crate::core::content::{ContentSource, FaqEntry};
    use crate::core::upload::ReadinessPolicy;

    fn question(id: &str, correct: usize) -> QuizQuestion {
        QuizQuestion {
            id: id.into(),
            question: format!("Question text {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct,
            section_id: "1".into(),
        }
    }

    #[test]
    fn test_question_lines_mark_current() {
        let session = QuizSession::new(vec![question("1", 0), question("2", 1)]);
        let (lines, focus) = question_lines(&session, 1);
        assert_eq!(lines[focus].to_string(), " Question 2");
        assert!(lines[1].to_string().contains("Answer all 2 questions"));
    }

    #[test]
    fn test_results_show_correct_answer_only_when_wrong() {
        let mut session = QuizSession::new(vec![question("1", 0), question("2", 1)]);
        session.select("1", 0).unwrap();
        session.select("2", 2).unwrap();
        session.submit().unwrap();

        let text: Vec<String> = results_lines(&session).iter().map(|l| l.to_string()).collect();
        assert!(text[1].contains("1 out of 2 (50%)"));
        let correct_lines = text.iter().filter(|l| l.contains("Correct answer:")).count();
        assert_eq!(correct_lines, 1);
    }

    /// Never answers; counts requests started and dropped unfinished.
    #[derive(Default)]
    struct StalledContent {
        started: AtomicUsize,
        dropped: Arc<AtomicUsize>,
    }

    struct CountOnDrop(Arc<AtomicUsize>);

    impl Drop for CountOnDrop {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ContentSource for StalledContent {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn quiz(&self, _workspace_id: &str) -> crate::api::Result<Vec<QuizQuestion>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let _guard = CountOnDrop(self.dropped.clone());
            std::future::pending().await
        }

        async fn faq(&self, _workspace_id: &str) -> crate::api::Result<Vec<FaqEntry>> {
            std::future::pending().await
        }
    }

    fn stalled_services(content: Arc<StalledContent>) -> Services {
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let config = AppConfig::default();
        Services {
            client: NeuraClient::new(&config).unwrap(),
            readiness: ReadinessPolicy::from(&config.upload),
            config,
            content,
            event_tx,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_workspace_change_cancels_pending_load() {
        let content = Arc::new(StalledContent::default());
        let services = stalled_services(content.clone());
        let mut state = QuizViewState::new();

        state.load(&services, "w1");
        settle().await;
        assert_eq!(content.started.load(Ordering::SeqCst), 1);
        assert_eq!(content.dropped.load(Ordering::SeqCst), 0);

        state.load(&services, "w2");
        settle().await;
        assert_eq!(content.started.load(Ordering::SeqCst), 2);
        assert_eq!(content.dropped.load(Ordering::SeqCst), 1);

        drop(state);
        settle().await;
        assert_eq!(content.dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle_and_reloads() {
        let content = Arc::new(StalledContent::default());
        let services = stalled_services(content.clone());
        let mut state = QuizViewState::new();

        state.load(&services, "w1");
        settle().await;
        state.cancel();
        settle().await;
        assert!(matches!(state.load, ContentLoad::Idle));
        assert_eq!(content.dropped.load(Ordering::SeqCst), 1);

        state.load(&services, "w1");
        settle().await;
        assert_eq!(content.started.load(Ordering::SeqCst), 2);
    }
}
