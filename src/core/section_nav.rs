//! Scroll-tracking section navigation.
//!
//! Each section has an anchor line in the rendered document. The active
//! section is the one covering the observation line, 20% down the viewport
//! (a -20% top / -80% bottom margin leaves a single line band).

use crate::core::study_guide::section_anchor;

/// Fraction of the viewport height above the observation line.
pub const BAND_TOP_FRACTION: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionAnchor {
    pub section_id: String,
    pub title: String,
    /// First rendered line of the section.
    pub line: usize,
}

impl SectionAnchor {
    pub fn key(&self) -> String {
        section_anchor(&self.section_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionNav {
    anchors: Vec<SectionAnchor>,
    active: Option<usize>,
    /// Highlighted entry in the navigation list.
    selected: usize,
}

impl SectionNav {
    /// Anchors must be in document order.
    pub fn new(anchors: Vec<SectionAnchor>) -> Self {
        Self {
            anchors,
            active: None,
            selected: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> &[SectionAnchor] {
        &self.anchors
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.map(|i| self.anchors[i].section_id.as_str())
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Line of the observation band for a viewport.
    pub fn band_line(scroll: usize, viewport_height: usize) -> usize {
        scroll + (viewport_height as f32 * BAND_TOP_FRACTION) as usize
    }

    /// Recompute the active section for the current scroll position.
    ///
    /// Returns the newly active id if it changed. With no anchors this is a
    /// no-op. Above the first anchor the previous active section is kept.
    pub fn observe(&mut self, scroll: usize, viewport_height: usize) -> Option<&str> {
        if self.anchors.is_empty() {
            return None;
        }
        let band = Self::band_line(scroll, viewport_height);
        let covering = self.anchors.iter().rposition(|a| a.line <= band);

        match covering {
            Some(idx) if self.active != Some(idx) => {
                self.active = Some(idx);
                Some(self.anchors[idx].section_id.as_str())
            }
            _ => None,
        }
    }

    /// Anchor line for `section_id` (first match when ids repeat).
    pub fn scroll_to(&self, section_id: &str) -> Option<usize> {
        self.anchors
            .iter()
            .find(|a| a.section_id == section_id)
            .map(|a| a.line)
    }

    pub fn select_next(&mut self) {
        if !self.anchors.is_empty() {
            self.selected = (self.selected + 1) % self.anchors.len();
        }
    }

    pub fn select_prev(&mut self) {
        if self.anchors.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.anchors.len() - 1
        } else {
            self.selected - 1
        };
    }

    /// Anchor line of the highlighted entry.
    pub fn selected_line(&self) -> Option<usize> {
        self.anchors.get(self.selected).map(|a| a.line)
    }

    /// Move the highlight onto the active section.
    pub fn sync_selection_to_active(&mut self) {
        if let Some(idx) = self.active {
            self.selected = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav() -> SectionNav {
        SectionNav::new(vec![
            SectionAnchor {
                section_id: "intro".into(),
                title: "Intro".into(),
                line: 0,
            },
            SectionAnchor {
                section_id: "method".into(),
                title: "Method".into(),
                line: 40,
            },
            SectionAnchor {
                section_id: "results".into(),
                title: "Results".into(),
                line: 100,
            },
        ])
    }

    #[test]
    fn test_band_line_is_twenty_percent_down() {
        assert_eq!(SectionNav::band_line(10, 50), 20);
    }

    #[test]
    fn test_initial_observe_activates_first() {
        let mut nav = nav();
        assert_eq!(nav.observe(0, 50), Some("intro"));
        assert_eq!(nav.active_id(), Some("intro"));
    }

    #[test]
    fn test_section_becomes_active_when_it_reaches_band() {
        let mut nav = nav();
        nav.observe(0, 50);
        // band = 29 + 10 = 39: method (line 40) not yet in band
        assert_eq!(nav.observe(29, 50), None);
        assert_eq!(nav.active_id(), Some("intro"));
        // band = 30 + 10 = 40
        assert_eq!(nav.observe(30, 50), Some("method"));
    }

    #[test]
    fn test_scrolling_back_up_reactivates_earlier() {
        let mut nav = nav();
        nav.observe(200, 50);
        assert_eq!(nav.active_id(), Some("results"));
        nav.observe(0, 50);
        assert_eq!(nav.active_id(), Some("intro"));
    }

    #[test]
    fn test_scroll_to() {
        let nav = nav();
        assert_eq!(nav.scroll_to("method"), Some(40));
        assert_eq!(nav.scroll_to("missing"), None);
    }

    #[test]
    fn test_empty_nav_observes_nothing() {
        let mut nav = SectionNav::new(Vec::new());
        assert!(nav.is_empty());
        assert_eq!(nav.observe(0, 50), None);
        nav.select_next();
        nav.select_prev();
        assert_eq!(nav.selected_line(), None);
    }

    #[test]
    fn test_selection_wraps_and_syncs() {
        let mut nav = nav();
        nav.select_prev();
        assert_eq!(nav.selected(), 2);
        nav.select_next();
        assert_eq!(nav.selected(), 0);
        nav.observe(60, 50);
        nav.sync_selection_to_active();
        assert_eq!(nav.selected_line(), Some(40));
    }

    #[test]
    fn test_anchor_key() {
        assert_eq!(nav().anchors()[1].key(), "section-method");
    }
}
