//! Markdown → ratatui Lines renderer for study-guide explanations.
//!
//! Handles GFM tables and strikethrough, `$inline$` and `$$display$$` math
//! (shown verbatim in the math color), and fenced code highlighted with the
//! syntect sets loaded in `core::logging`.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use syntect::easy::HighlightLines;
use syntect::util::LinesWithEndings;

use crate::core::logging::{get_syntax_set, get_theme_set};
use crate::tui::theme;

const CODE_THEME: &str = "base16-ocean.dark";

/// Math delimiter state carried across text events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathMode {
    Off,
    Inline,
    Display,
}

struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    math: MathMode,
    math_buffer: String,
    in_code_block: bool,
    code_lang: String,
    code_buffer: String,
    list_depth: usize,
    in_heading: bool,
    table_cells: Vec<String>,
    in_table_cell: bool,
}

/// Convert markdown text to ratatui Lines.
pub fn markdown_to_lines(md: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut r = Renderer {
        lines: Vec::new(),
        spans: Vec::new(),
        style_stack: vec![Style::default().fg(theme::TEXT)],
        math: MathMode::Off,
        math_buffer: String::new(),
        in_code_block: false,
        code_lang: String::new(),
        code_buffer: String::new(),
        list_depth: 0,
        in_heading: false,
        table_cells: Vec::new(),
        in_table_cell: false,
    };

    for event in Parser::new_ext(md, options) {
        r.event(event);
    }

    r.close_math();
    r.flush();
    while r
        .lines
        .last()
        .is_some_and(|l| l.spans.is_empty() || l.to_string().is_empty())
    {
        r.lines.pop();
    }
    r.lines
}

impl Renderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush();
                let style = match level {
                    pulldown_cmark::HeadingLevel::H1 => theme::title(),
                    pulldown_cmark::HeadingLevel::H2 => theme::heading(),
                    pulldown_cmark::HeadingLevel::H3 => Style::default().fg(theme::SUCCESS),
                    _ => Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
                };
                self.style_stack.push(style);
                self.in_heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                self.style_stack.pop();
                self.flush();
                self.in_heading = false;
            }

            Event::Start(Tag::Strong) => self.push_modifier(Modifier::BOLD),
            Event::Start(Tag::Emphasis) => self.push_modifier(Modifier::ITALIC),
            Event::Start(Tag::Strikethrough) => self.push_modifier(Modifier::CROSSED_OUT),
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough) => {
                self.style_stack.pop();
            }

            Event::Code(code) => {
                if self.in_table_cell {
                    self.push_cell_text(&code);
                } else {
                    self.spans.push(Span::styled(
                        format!(" {code} "),
                        Style::default().fg(theme::TEXT).bg(theme::BG_SURFACE),
                    ));
                }
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush();
                self.in_code_block = true;
                self.code_lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_buffer.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                if !self.code_buffer.is_empty() {
                    render_code_block(&self.code_buffer, &self.code_lang, &mut self.lines);
                }
                self.lines.push(Line::raw(""));
                self.in_code_block = false;
            }

            Event::Start(Tag::List(_)) => self.list_depth += 1,
            Event::End(TagEnd::List(_)) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.lines.push(Line::raw(""));
                }
            }
            Event::Start(Tag::Item) => {
                self.flush();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.spans.push(Span::styled(
                    format!("{indent}• "),
                    Style::default().fg(theme::PRIMARY_LIGHT),
                ));
            }
            Event::End(TagEnd::Item) => self.flush(),

            Event::Start(Tag::Link { .. }) => {
                self.style_stack.push(
                    Style::default()
                        .fg(theme::INFO)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            Event::End(TagEnd::Link) => {
                self.style_stack.pop();
            }

            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                self.close_math();
                self.flush();
                if !self.in_heading {
                    self.lines.push(Line::raw(""));
                }
            }

            // ── Tables: one line per row, cells joined with a rule ──
            Event::Start(Tag::Table(_)) => self.flush(),
            Event::End(TagEnd::Table) => self.lines.push(Line::raw("")),
            Event::Start(Tag::TableHead | Tag::TableRow) => self.table_cells.clear(),
            Event::End(TagEnd::TableHead) => self.flush_row(true),
            Event::End(TagEnd::TableRow) => self.flush_row(false),
            Event::Start(Tag::TableCell) => {
                self.in_table_cell = true;
                self.table_cells.push(String::new());
            }
            Event::End(TagEnd::TableCell) => self.in_table_cell = false,

            Event::Text(text) => {
                if self.in_code_block {
                    self.code_buffer.push_str(&text);
                } else if self.in_table_cell {
                    self.push_cell_text(&text);
                } else {
                    self.push_text(&text);
                }
            }

            Event::SoftBreak => {
                if self.math != MathMode::Off {
                    self.math_buffer.push(' ');
                } else if !self.in_code_block {
                    self.spans.push(Span::raw(" "));
                }
            }
            Event::HardBreak => self.flush(),

            Event::Rule => {
                self.flush();
                self.lines
                    .push(Line::styled("─".repeat(40), theme::dim()));
                self.lines.push(Line::raw(""));
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush();
                let base = self.current_style();
                self.style_stack
                    .push(base.fg(theme::TEXT_MUTED).add_modifier(Modifier::ITALIC));
                self.spans.push(Span::styled("│ ", theme::dim()));
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush();
                self.style_stack.pop();
            }

            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let base = self.current_style();
        self.style_stack.push(base.add_modifier(modifier));
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    /// Split text on `$` / `$$` delimiters, styling math segments.
    fn push_text(&mut self, text: &str) {
        let mut rest = text;
        while !rest.is_empty() {
            let Some(pos) = rest.find('$') else {
                self.push_segment(rest);
                return;
            };
            self.push_segment(&rest[..pos]);
            let display = rest[pos..].starts_with("$$");
            rest = &rest[pos + if display { 2 } else { 1 }..];

            match (self.math, display) {
                (MathMode::Off, true) => {
                    self.flush();
                    self.math = MathMode::Display;
                }
                (MathMode::Off, false) => self.math = MathMode::Inline,
                (MathMode::Display, true) | (MathMode::Inline, false) => self.close_math(),
                // Mismatched delimiter inside math is literal.
                (_, true) => self.math_buffer.push_str("$$"),
                (_, false) => self.math_buffer.push('$'),
            }
        }
    }

    fn push_segment(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        if self.math == MathMode::Off {
            let style = self.current_style();
            self.spans.push(Span::styled(segment.to_string(), style));
        } else {
            self.math_buffer.push_str(segment);
        }
    }

    /// Emit any pending math. An unterminated delimiter closes at the end of
    /// its paragraph.
    fn close_math(&mut self) {
        let mode = std::mem::replace(&mut self.math, MathMode::Off);
        let body = std::mem::take(&mut self.math_buffer);
        let style = Style::default().fg(theme::MATH);
        match mode {
            MathMode::Off => {}
            MathMode::Inline => {
                self.spans.push(Span::styled(body.trim().to_string(), style));
            }
            MathMode::Display => {
                self.flush();
                self.lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(body.trim().to_string(), style.add_modifier(Modifier::ITALIC)),
                ]));
            }
        }
    }

    fn push_cell_text(&mut self, text: &str) {
        if let Some(cell) = self.table_cells.last_mut() {
            cell.push_str(text);
        }
    }

    fn flush_row(&mut self, header: bool) {
        let cells = std::mem::take(&mut self.table_cells);
        let row = cells.join(" │ ");
        let style = if header {
            theme::heading()
        } else {
            Style::default().fg(theme::TEXT)
        };
        let width = row.chars().count();
        self.lines.push(Line::styled(format!("  {row}"), style));
        if header {
            self.lines
                .push(Line::styled(format!("  {}", "─".repeat(width)), theme::dim()));
        }
    }
}

/// Render a code block with syntect highlighting.
fn render_code_block(code: &str, lang: &str, lines: &mut Vec<Line<'static>>) {
    let ss = get_syntax_set();
    let ts = get_theme_set();

    let syntax = if lang.is_empty() {
        ss.find_syntax_plain_text()
    } else {
        ss.find_syntax_by_token(lang)
            .unwrap_or_else(|| ss.find_syntax_plain_text())
    };

    let Some(code_theme) = ts.themes.get(CODE_THEME) else {
        for line in code.lines() {
            lines.push(Line::styled(
                line.to_string(),
                Style::default().fg(theme::TEXT).bg(theme::BG_CODE),
            ));
        }
        return;
    };
    let mut highlighter = HighlightLines::new(syntax, code_theme);

    for line_str in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line_str, ss) {
            Ok(ranges) => {
                let spans: Vec<Span<'static>> = ranges
                    .into_iter()
                    .map(|(style, text)| {
                        let fg = style.foreground;
                        Span::styled(
                            text.trim_end_matches('\n').to_string(),
                            Style::default()
                                .fg(Color::Rgb(fg.r, fg.g, fg.b))
                                .bg(theme::BG_CODE),
                        )
                    })
                    .collect();
                lines.push(Line::from(spans));
            }
            Err(_) => {
                lines.push(Line::styled(
                    line_str.trim_end_matches('\n').to_string(),
                    Style::default().fg(theme::TEXT).bg(theme::BG_CODE),
                ));
            }
        }
    }
}
