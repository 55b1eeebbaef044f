//! Landing page: hero, features, getting-started steps, pricing,
//! testimonials and footer links.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::tui::events::{Action, AppEvent};
use crate::tui::services::Services;
use crate::tui::theme;

struct Feature {
    title: &'static str,
    desc: &'static str,
}

struct Step {
    title: &'static str,
    desc: &'static str,
}

struct PriceTier {
    title: &'static str,
    price: &'static str,
    desc: &'static str,
    features: &'static [&'static str],
    is_primary: bool,
}

struct Testimonial {
    name: &'static str,
    handle: &'static str,
    text: &'static str,
}

struct FooterLink {
    title: &'static str,
    href: &'static str,
}

const FEATURES: &[Feature] = &[
    Feature {
        title: "Upload any content",
        desc: "From PDFs and YouTube videos to slides and even recorded lectures, learn everything your way.",
    },
    Feature {
        title: "Test your knowledge",
        desc: "Create and customize flashcards: edit, delete, star, view sources, and more.",
    },
    Feature {
        title: "Sources Included",
        desc: "Retrieve accurate and contextual information from your content.",
    },
];

const STEPS: &[Step] = &[
    Step {
        title: "Create a workspace",
        desc: "",
    },
    Step {
        title: "Upload materials",
        desc: "Upload all your materials.",
    },
    Step {
        title: "Get a cup of a coffee",
        desc: "Cause there's nothing better than a cup of coffee to get started with learning.",
    },
];

const PRICES: &[PriceTier] = &[
    PriceTier {
        title: "Free",
        price: "0",
        desc: "Start your learning journey here.",
        features: &[
            "5 AI chats / day (includes 3/month with Learn+)",
            "3 PDFs or YouTube Links / month",
            "Upload PDFs, each up to 120 pages / 20 MB in size",
            "2 recorded lecture / month",
        ],
        is_primary: false,
    },
    PriceTier {
        title: "Pro (annual)",
        price: "1,000",
        desc: "Learn at the highest level.",
        features: &[
            "Unlimited AI chats (includes 100/month with Learn+)",
            "Unlimited PDFs or YouTube Links",
            "Upload PDFs, each up to 2000 pages / 50 MB in size",
            "40 recorded lectures / month",
            "Access to advanced voice mode beta",
        ],
        is_primary: true,
    },
];

const TESTIMONIALS: &[Testimonial] = &[
    Testimonial {
        name: "Mihir Wadekar",
        handle: "mihirwadekar",
        text: "I love this tool, like the YouTube video summarizer! I use it to learn concepts ranging from Econ to Quantum Mechanics, and it makes learning so much easier and more effective.",
    },
    Testimonial {
        name: "G. Shaw Jr.",
        handle: "gshaw",
        text: "I definitely plan to experiment with Neura in my online course this summer to offer students an additional method of engagement with more complex topics.",
    },
    Testimonial {
        name: "Nasim Uddin",
        handle: "nasimuddin",
        text: "I wish I had this when I was in school",
    },
    Testimonial {
        name: "Rohan Robinson",
        handle: "rohanrobinson",
        text: "Neura is awesome , just used it to learn from a biotech roundtable discussion!",
    },
    Testimonial {
        name: "Jason Patel",
        handle: "jasonpatel",
        text: "This Neura site, with features like \"Chat with PDF,\" has become an integral part of our daily workflow. It has streamlined our process of understanding videos and PDFs.",
    },
    Testimonial {
        name: "Kate Doe",
        handle: "katedoe",
        text: "I use Neura on a daily basis now. It's streamlined my processes and improved how I learn materials.",
    },
];

/// Site pages; shown as text since the terminal has nowhere to open them.
const FOOTER_LINKS: &[FooterLink] = &[
    FooterLink {
        title: "Terms & Conditions",
        href: "./terms-conditions",
    },
    FooterLink {
        title: "Privacy Policy",
        href: "./privacy-policy",
    },
    FooterLink {
        title: "Contact Us",
        href: "./contact-us",
    },
];

pub struct HomeState {
    scroll: u16,
}

impl HomeState {
    pub fn new() -> Self {
        Self { scroll: 0 }
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

        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                true
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            KeyCode::Char('f') => {
                // "See Features"
                self.scroll = Self::features_offset();
                true
            }
            KeyCode::Enter | KeyCode::Char('g') => {
                let _ = services
                    .event_tx
                    .send(AppEvent::Action(Action::FocusWorkspaces));
                true
            }
            _ => false,
        }
    }

    /// Line where the features section starts.
    fn features_offset() -> u16 {
        let hero = Self::hero_lines();
        hero.len() as u16
    }

    fn hero_lines() -> Vec<Line<'static>> {
        vec![
            Line::raw(""),
            Line::from(Span::styled("Learn smarter, faster, easier.", theme::title())),
            Line::from(Span::styled(
                "Upload your content, and start your learning journey.",
                theme::muted(),
            )),
            Line::raw(""),
            Line::from(vec![
                Span::styled(" [f] See Features ", Style::default().fg(theme::PRIMARY_LIGHT)),
                Span::raw("   "),
                Span::styled(" [Enter] Get Started ", theme::brand_badge()),
            ]),
            Line::raw(""),
        ]
    }

    fn body_lines() -> Vec<Line<'static>> {
        let mut lines = Self::hero_lines();

        lines.push(Line::from(Span::styled("Understand and learn at ease", theme::heading())));
        lines.push(Line::from(Span::styled(
            "From key takeaways to specific questions, we've got you covered.",
            theme::muted(),
        )));
        lines.push(Line::raw(""));
        for feature in FEATURES {
            lines.push(Line::from(Span::styled(
                format!("◆ {}", feature.title),
                Style::default().fg(theme::TEXT),
            )));
            lines.push(Line::from(Span::styled(feature.desc, theme::dim())));
        }
        lines.push(Line::raw(""));

        lines.push(Line::from(Span::styled("Getting Started", theme::heading())));
        lines.push(Line::from(Span::styled(
            "by following just 3 simple steps",
            theme::muted(),
        )));
        lines.push(Line::raw(""));
        for (i, step) in STEPS.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), theme::title()),
                Span::styled(step.title, Style::default().fg(theme::TEXT)),
            ]));
            if !step.desc.is_empty() {
                lines.push(Line::from(Span::styled(step.desc, theme::dim())));
            }
        }
        lines.push(Line::raw(""));

        lines.push(Line::from(Span::styled("Save hours, learn smarter.", theme::heading())));
        lines.push(Line::from(Span::styled(
            "Enjoy endless content uploads, chats, recorded lectures, and more.",
            theme::muted(),
        )));
        for tier in PRICES {
            let title_style = if tier.is_primary {
                theme::title()
            } else {
                Style::default().fg(theme::TEXT)
            };
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                Span::styled(tier.title, title_style),
                Span::raw("  "),
                Span::styled(format!("${}", tier.price), theme::highlight()),
            ]));
            lines.push(Line::from(Span::styled(tier.desc, theme::muted())));
            for feature in tier.features {
                lines.push(Line::from(Span::styled(format!("✓ {feature}"), theme::dim())));
            }
        }
        lines.push(Line::raw(""));

        lines.push(Line::from(Span::styled("Loved by learners", theme::heading())));
        for testimonial in TESTIMONIALS {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                format!("\u{201c}{}\u{201d}", testimonial.text),
                Style::default().fg(theme::TEXT),
            )));
            lines.push(Line::from(vec![
                Span::styled(testimonial.name, theme::title()),
                Span::styled(format!("  @{}", testimonial.handle), theme::dim()),
            ]));
        }
        lines.push(Line::raw(""));

        let mut footer = Vec::new();
        for (i, link) in FOOTER_LINKS.iter().enumerate() {
            if i > 0 {
                footer.push(Span::styled("  ·  ", theme::dim()));
            }
            footer.push(Span::styled(link.title, theme::muted()));
            footer.push(Span::styled(format!(" ({})", link.href), theme::dim()));
        }
        lines.push(Line::from(footer));
        lines.push(Line::from(Span::styled(
            "© Copyright 2025 Neura Inc.",
            theme::dim(),
        )));
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("Neura");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = Self::body_lines();
        let max_scroll = (lines.len() as u16).saturating_sub(inner.height);
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .scroll((self.scroll.min(max_scroll), 0)),
            inner,
        );
    }
}

impl Default for HomeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_sections_present() {
        let text: String = HomeState::body_lines()
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Getting Started"));
        assert!(text.contains("Pro (annual)"));
        for feature in FEATURES {
            assert!(text.contains(feature.title));
        }
    }

    #[test]
    fn test_testimonials_and_footer_follow_pricing() {
        let lines: Vec<String> = HomeState::body_lines().iter().map(|l| l.to_string()).collect();
        let position = |needle: &str| lines.iter().position(|l| l.contains(needle)).unwrap();

        let pricing = position("Pro (annual)");
        let testimonials = position("Loved by learners");
        assert!(testimonials > pricing);
        for testimonial in TESTIMONIALS {
            assert!(position(&format!("@{}", testimonial.handle)) > testimonials);
        }

        let footer = position("Privacy Policy");
        assert!(lines[footer].contains("Terms & Conditions"));
        assert!(lines[footer].contains("Contact Us"));
        assert!(footer > position("@katedoe"));
        assert!(lines.last().unwrap().contains("Copyright"));
    }

    #[test]
    fn test_features_offset_points_past_hero() {
        let lines = HomeState::body_lines();
        let offset = HomeState::features_offset() as usize;
        assert_eq!(lines[offset].to_string(), "Understand and learn at ease");
    }
}
