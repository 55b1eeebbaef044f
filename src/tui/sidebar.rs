//! Collapsible left sidebar with grouped navigation.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::events::{AreaFocus, Focus, SidebarGroup};
use super::theme;

/// Width when open: group headers and labels.
pub const OPEN_WIDTH: u16 = 22;
/// Width when closed: one icon per row.
pub const CLOSED_WIDTH: u16 = 3;
/// Terminals narrower than this get icons even when the sidebar is open.
const LABELS_MIN_TERMINAL_WIDTH: u16 = 60;

/// How the sidebar draws this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarForm {
    Labeled,
    Icons,
}

/// Sidebar navigation state.
pub struct SidebarState {
    /// Open shows icons and labels; closed shows icons only.
    is_open: bool,
    /// Currently highlighted item index (into Focus::ALL).
    pub selected: usize,
}

impl SidebarState {
    pub fn new() -> Self {
        Self {
            is_open: true,
            selected: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Form for a terminal `terminal_width` columns wide.
    pub fn form(&self, terminal_width: u16) -> SidebarForm {
        if self.is_open && terminal_width >= LABELS_MIN_TERMINAL_WIDTH {
            SidebarForm::Labeled
        } else {
            SidebarForm::Icons
        }
    }

    /// Columns the sidebar takes, never more than half the terminal.
    pub fn width(&self, terminal_width: u16) -> u16 {
        let wanted = match self.form(terminal_width) {
            SidebarForm::Labeled => OPEN_WIDTH,
            SidebarForm::Icons => CLOSED_WIDTH,
        };
        wanted.min(terminal_width / 2)
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % Focus::ALL.len();
    }

    pub fn select_prev(&mut self) {
        if self.selected == 0 {
            self.selected = Focus::ALL.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn selected_focus(&self) -> Focus {
        Focus::ALL[self.selected]
    }

    /// Sync selection to match the active focus (e.g., after Tab navigation).
    pub fn sync_to_focus(&mut self, focus: Focus) {
        if let Some(idx) = Focus::ALL.iter().position(|&f| f == focus) {
            self.selected = idx;
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        current_focus: Focus,
        area_focus: AreaFocus,
        workspace: Option<&str>,
    ) {
        if area.width == 0 {
            return;
        }
        match self.form(frame.area().width) {
            SidebarForm::Icons => self.render_collapsed(frame, area, current_focus),
            SidebarForm::Labeled => {
                self.render_expanded(frame, area, current_focus, area_focus, workspace)
            }
        }
    }

    fn render_collapsed(&self, frame: &mut Frame, area: Rect, current_focus: Focus) {
        let mut lines: Vec<Line> = vec![Line::from(Span::styled(" N", theme::title()))];

        for group in SidebarGroup::ALL {
            for &view in group.views() {
                if lines.len() >= area.height as usize {
                    break;
                }
                let style = if view == current_focus {
                    theme::highlight()
                } else {
                    theme::muted()
                };
                lines.push(Line::from(Span::styled(format!(" {}", view.icon()), style)));
            }
        }

        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)),
            area,
        );
    }

    fn render_expanded(
        &self,
        frame: &mut Frame,
        area: Rect,
        current_focus: Focus,
        area_focus: AreaFocus,
        workspace: Option<&str>,
    ) {
        let mut lines: Vec<Line> = vec![
            Line::from(Span::styled(" Neura", theme::title())),
            Line::raw(""),
        ];
        let sidebar_focused = area_focus == AreaFocus::Sidebar;
        let mut focus_idx = 0usize;

        for group in SidebarGroup::ALL {
            if lines.len() >= area.height as usize {
                break;
            }

            lines.push(Line::from(Span::styled(
                format!(" {}", group.label()),
                theme::heading(),
            )));

            for &view in group.views() {
                if lines.len() >= area.height as usize {
                    break;
                }

                let is_current = view == current_focus;
                let is_selected = sidebar_focused && focus_idx == self.selected;
                let disabled = view.needs_workspace() && workspace.is_none();

                let prefix = if is_selected { "▸ " } else { "  " };
                let style = if is_current {
                    theme::highlight()
                } else if is_selected {
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD)
                } else if disabled {
                    theme::dim()
                } else {
                    theme::muted()
                };

                let label = format!("{prefix}{} {}", view.icon(), view.label());
                let padded = format!("{:<width$}", label, width = area.width as usize);
                lines.push(Line::from(Span::styled(padded, style)));

                focus_idx += 1;
            }
        }

        if let Some(id) = workspace {
            let max = (area.width as usize).saturating_sub(2);
            let shown: String = id.chars().take(max).collect();
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(format!(" {shown}"), theme::dim())));
        }

        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)),
            area,
        );
    }
}

impl Default for SidebarState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_open() {
        let state = SidebarState::new();
        assert!(state.is_open());
        assert_eq!(state.selected_focus(), Focus::Home);
    }

    #[test]
    fn test_set_open_and_toggle() {
        let mut state = SidebarState::new();
        state.set_open(false);
        assert!(!state.is_open());
        state.set_open(false);
        assert!(!state.is_open());
        state.toggle_open();
        assert!(state.is_open());
        state.toggle_open();
        assert!(!state.is_open());
    }

    #[test]
    fn test_width_follows_store() {
        let mut state = SidebarState::new();
        assert_eq!(state.form(120), SidebarForm::Labeled);
        assert_eq!(state.width(120), OPEN_WIDTH);
        state.toggle_open();
        assert_eq!(state.form(120), SidebarForm::Icons);
        assert_eq!(state.width(120), CLOSED_WIDTH);
    }

    #[test]
    fn test_narrow_terminal_forces_icons() {
        let state = SidebarState::new();
        assert!(state.is_open());
        assert_eq!(state.form(40), SidebarForm::Icons);
        assert_eq!(state.width(40), CLOSED_WIDTH);
        assert_eq!(state.width(4), 2);
        assert_eq!(state.width(1), 0);
    }

    #[test]
    fn test_select_wraps() {
        let mut state = SidebarState::new();
        state.select_prev();
        assert_eq!(state.selected_focus(), Focus::Faq);
        state.select_next();
        assert_eq!(state.selected_focus(), Focus::Home);
    }

    #[test]
    fn test_sync_to_focus() {
        let mut state = SidebarState::new();
        state.sync_to_focus(Focus::Quiz);
        assert_eq!(state.selected_focus(), Focus::Quiz);
    }
}
