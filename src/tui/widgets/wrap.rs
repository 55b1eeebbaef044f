//! Word wrap for styled lines.
//!
//! Paragraph's own wrapping hides where each source line lands, which the
//! overview needs for section anchors. This wraps up front and reports the
//! first wrapped row of every source line.

use ratatui::text::{Line, Span};

/// Wrap `lines` to `width` columns.
///
/// Returns the wrapped rows and, for each input line, the index of its first
/// row. Words longer than `width` are split hard. Widths count chars.
pub fn wrap_lines(lines: &[Line<'static>], width: usize) -> (Vec<Line<'static>>, Vec<usize>) {
    let mut out = Vec::with_capacity(lines.len());
    let mut starts = Vec::with_capacity(lines.len());

    for line in lines {
        starts.push(out.len());
        out.extend(wrap_line(line, width));
    }
    (out, starts)
}

fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line_width(line) <= width {
        return vec![line.clone()];
    }

    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut used = 0usize;

    for span in &line.spans {
        for word in span.content.split_inclusive(' ') {
            let mut word: String = word.to_string();
            let mut len = word.chars().count();

            if used > 0 && used + len > width {
                let trimmed = word.trim_end().chars().count();
                if used + trimmed > width {
                    rows.push(Vec::new());
                    used = 0;
                } else {
                    // Only trailing spaces overhang; drop them.
                    word.truncate(word.trim_end().len());
                    len = trimmed;
                }
            }

            while len > width - used {
                let take = width - used;
                let head: String = word.chars().take(take).collect();
                let tail: String = word.chars().skip(take).collect();
                push_span(&mut rows, Span::styled(head, span.style));
                rows.push(Vec::new());
                used = 0;
                word = tail;
                len = word.chars().count();
            }

            if !word.is_empty() {
                push_span(&mut rows, Span::styled(word, span.style));
                used += len;
            }
        }
    }

    rows.into_iter()
        .filter(|spans| !spans.is_empty())
        .map(|spans| Line::from(spans).style(line.style))
        .collect()
}

fn push_span(rows: &mut Vec<Vec<Span<'static>>>, span: Span<'static>) {
    if let Some(row) = rows.last_mut() {
        row.push(span);
    }
}

fn line_width(line: &Line<'_>) -> usize {
    line.spans.iter().map(|s| s.content.chars().count()).sum()
}
