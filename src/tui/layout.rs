//! Screen regions: the app shell and the split panes of individual views.

use ratatui::layout::{Constraint, Layout, Rect};

/// Width of the overview's section list.
pub const SECTIONS_PANE_WIDTH: u16 = 28;
/// Height of the overview's per-section quiz pane.
pub const QUIZ_PANE_HEIGHT: u16 = 11;
/// Chat input line plus its border.
pub const COMPOSER_HEIGHT: u16 = 3;

/// Sidebar column, active view, and the one-row status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub sidebar: Rect,
    pub view: Rect,
    pub status: Rect,
}

impl Shell {
    pub fn split(area: Rect, sidebar_width: u16) -> Self {
        let status_height = area.height.min(1);
        let body_height = area.height - status_height;
        let sidebar_width = sidebar_width.min(area.width);

        Self {
            sidebar: Rect::new(area.x, area.y, sidebar_width, body_height),
            view: Rect::new(
                area.x + sidebar_width,
                area.y,
                area.width - sidebar_width,
                body_height,
            ),
            status: Rect::new(area.x, area.y + body_height, area.width, status_height),
        }
    }
}

/// Overview regions. The section list needs room for the document beside
/// it, and the quiz pane only appears when the document keeps most rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewPanes {
    pub sections: Option<Rect>,
    pub document: Rect,
    pub quiz: Option<Rect>,
}

impl OverviewPanes {
    pub fn split(area: Rect, with_quiz: bool) -> Self {
        let (sections, main) = if area.width > SECTIONS_PANE_WIDTH * 2 {
            let [left, right] =
                Layout::horizontal([Constraint::Length(SECTIONS_PANE_WIDTH), Constraint::Min(0)])
                    .areas(area);
            (Some(left), right)
        } else {
            (None, area)
        };

        let (document, quiz) = if with_quiz && main.height > QUIZ_PANE_HEIGHT * 2 {
            let [top, bottom] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(QUIZ_PANE_HEIGHT)])
                    .areas(main);
            (top, Some(bottom))
        } else {
            (main, None)
        };

        Self {
            sections,
            document,
            quiz,
        }
    }
}

/// Equal left and right columns (uploads: picker and staged list).
pub fn columns(area: Rect) -> (Rect, Rect) {
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
    (left, right)
}

/// Body plus a one-row hint line at the bottom.
pub fn with_footer(area: Rect) -> (Rect, Rect) {
    let [body, footer] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
    (body, footer)
}

/// Transcript above a bordered one-line composer.
pub fn with_composer(area: Rect) -> (Rect, Rect) {
    let [transcript, composer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(COMPOSER_HEIGHT)]).areas(area);
    (transcript, composer)
}

/// Rect of `percent_x` by `percent_y` centered in `area`, for modals.
pub fn centered(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let scale = |len: u16, percent: u16| (u32::from(len) * u32::from(percent.min(100)) / 100) as u16;
    let width = scale(area.width, percent_x);
    let height = scale(area.height, percent_y);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_tiles_the_screen() {
        let shell = Shell::split(Rect::new(0, 0, 100, 30), 22);
        assert_eq!(shell.sidebar, Rect::new(0, 0, 22, 29));
        assert_eq!(shell.view, Rect::new(22, 0, 78, 29));
        assert_eq!(shell.status, Rect::new(0, 29, 100, 1));
    }

    #[test]
    fn test_shell_without_sidebar_or_rows() {
        let shell = Shell::split(Rect::new(0, 0, 10, 1), 0);
        assert_eq!(shell.sidebar.width, 0);
        assert_eq!(shell.view.width, 10);
        assert_eq!(shell.view.height, 0);
        assert_eq!(shell.status.height, 1);

        let empty = Shell::split(Rect::new(0, 0, 0, 0), 22);
        assert_eq!(empty.status.height, 0);
        assert_eq!(empty.sidebar.width, 0);
    }

    #[test]
    fn test_overview_wide_and_tall_gets_all_panes() {
        let panes = OverviewPanes::split(Rect::new(0, 0, 120, 40), true);
        let sections = panes.sections.unwrap();
        let quiz = panes.quiz.unwrap();
        assert_eq!(sections.width, SECTIONS_PANE_WIDTH);
        assert_eq!(panes.document.x, SECTIONS_PANE_WIDTH);
        assert_eq!(quiz.height, QUIZ_PANE_HEIGHT);
        assert_eq!(panes.document.height + quiz.height, 40);
    }

    #[test]
    fn test_overview_narrow_or_short_drops_panes() {
        let narrow = OverviewPanes::split(Rect::new(0, 0, SECTIONS_PANE_WIDTH * 2, 40), true);
        assert!(narrow.sections.is_none());
        assert_eq!(narrow.document.width, SECTIONS_PANE_WIDTH * 2);

        let short = OverviewPanes::split(Rect::new(0, 0, 120, QUIZ_PANE_HEIGHT * 2), true);
        assert!(short.quiz.is_none());

        let no_quiz = OverviewPanes::split(Rect::new(0, 0, 120, 40), false);
        assert!(no_quiz.quiz.is_none());
        assert_eq!(no_quiz.document.height, 40);
    }

    #[test]
    fn test_footer_is_last_row() {
        let (body, footer) = with_footer(Rect::new(2, 3, 40, 10));
        assert_eq!(body.height, 9);
        assert_eq!(footer, Rect::new(2, 12, 40, 1));
    }

    #[test]
    fn test_composer_keeps_its_rows() {
        let (transcript, composer) = with_composer(Rect::new(0, 0, 60, 20));
        assert_eq!(composer, Rect::new(0, 17, 60, COMPOSER_HEIGHT));
        assert_eq!(transcript.height, 17);
    }

    #[test]
    fn test_centered_is_inside() {
        let area = Rect::new(10, 5, 100, 50);
        let r = centered(60, 80, area);
        assert_eq!((r.width, r.height), (60, 40));
        assert_eq!((r.x, r.y), (30, 10));
        assert!(r.right() <= area.right() && r.bottom() <= area.bottom());
    }
}
