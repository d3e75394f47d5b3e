//! Word wrapping and measurement for text elements.
//!
//! Wrapping is greedy and deliberately approximate: a candidate line is
//! measured with the style at the current line's *start* index, not per
//! glyph. Height computation and rendering are fully style-aware; only the
//! break decision uses the approximation. True shaping (kerning, ligatures,
//! bidi) is out of scope.

use crate::element::{CanvasElement, TextElement};
use crate::foundation::core::Point;
use crate::style::{ResolvedStyle, TextAlign};
use crate::text::measure::TextMeasurer;

/// One display line produced by wrapping. `start_index` is the char offset of
/// the line's first character in the element's full text.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    pub start_index: usize,
}

impl WrappedLine {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Maximal run of consecutive characters within a line sharing one resolved
/// style; the atomic unit for measurement and drawing.
#[derive(Clone, Debug)]
pub struct StyleRun {
    pub text: String,
    /// Char offset of the run's first character in the element's full text.
    pub start_index: usize,
    pub style: ResolvedStyle,
}

/// Split `el.text` into wrapped lines no wider than `el.width`.
///
/// Paragraphs (`\n`) never merge; an empty paragraph yields one empty line
/// consuming exactly the newline's char position. The produced `start_index`
/// values partition the text: every line's characters slice the full text at
/// `[start_index, start_index + char_len)` and consecutive lines are
/// separated by exactly one consumed separator (space or newline).
pub fn wrap_text(el: &TextElement, measurer: &mut dyn TextMeasurer) -> Vec<WrappedLine> {
    let max_width = el.width;
    let mut lines = Vec::new();
    let mut cursor = 0usize;

    for paragraph in el.text.split('\n') {
        let para_len = paragraph.chars().count();
        if paragraph.is_empty() {
            lines.push(WrappedLine {
                text: String::new(),
                start_index: cursor,
            });
            cursor += 1;
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        let mut line_start = cursor;

        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            let style = el.style_at(line_start);
            if measurer.measure(&candidate, &style) > max_width && !current.is_empty() {
                lines.push(WrappedLine {
                    text: current,
                    start_index: line_start,
                });
                line_start += current_len + 1;
                current = word.to_string();
                current_len = word.chars().count();
            } else {
                current_len = candidate.chars().count();
                current = candidate;
            }
        }
        lines.push(WrappedLine {
            text: current,
            start_index: line_start,
        });
        cursor += para_len + 1;
    }

    lines
}

/// Largest font size among the line's characters; an empty line takes the
/// style at its start index.
pub fn line_max_font_size(el: &TextElement, line: &WrappedLine) -> f64 {
    if line.text.is_empty() {
        return el.style_at(line.start_index).font_size;
    }
    let mut max = 0.0f64;
    for (i, _) in line.text.chars().enumerate() {
        max = max.max(el.style_at(line.start_index + i).font_size);
    }
    max
}

// Height computation resolves an empty line through the character *before*
// it, so a trailing blank paragraph inherits the size the user was typing in.
fn metrics_line_font_size(el: &TextElement, line: &WrappedLine) -> f64 {
    if !line.text.is_empty() {
        return line_max_font_size(el, line);
    }
    if line.start_index > 0 {
        el.style_at(line.start_index - 1).font_size
    } else {
        el.font_size
    }
}

/// Derived height of a text element under the current text/styles/width.
///
/// Each line contributes `max_font * line_height`; the last line's
/// inter-line spacing is then removed, so a single-line element is exactly
/// as tall as its effective font size regardless of `line_height`. Floored
/// at the base font size.
pub fn text_height(el: &TextElement, measurer: &mut dyn TextMeasurer) -> f64 {
    let lines = wrap_text(el, measurer);
    if lines.is_empty() {
        return el.font_size;
    }

    let mut total = 0.0;
    for line in &lines {
        total += metrics_line_font_size(el, line) * el.line_height;
    }
    if let Some(last) = lines.last() {
        total -= metrics_line_font_size(el, last) * (el.line_height - 1.0);
    }

    el.font_size.max(total)
}

/// Resolved placement of an element: stored geometry plus derived height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementMetrics {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementMetrics {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Current bounding geometry for any element variant. Text height is always
/// recomputed from layout; image/banner use their stored height.
pub fn element_metrics(el: &CanvasElement, measurer: &mut dyn TextMeasurer) -> ElementMetrics {
    match el {
        CanvasElement::Text(t) => ElementMetrics {
            x: t.x,
            y: t.y,
            width: t.width,
            height: text_height(t, measurer),
        },
        CanvasElement::Image(i) => ElementMetrics {
            x: i.x,
            y: i.y,
            width: i.width,
            height: i.height,
        },
        CanvasElement::Banner(b) => ElementMetrics {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        },
    }
}

/// Split a wrapped line into style-homogeneous runs.
pub fn line_runs(el: &TextElement, line: &WrappedLine) -> Vec<StyleRun> {
    let mut runs: Vec<StyleRun> = Vec::new();
    for (i, ch) in line.text.chars().enumerate() {
        let style = el.style_at(line.start_index + i);
        match runs.last_mut() {
            Some(run) if run.style == style => run.text.push(ch),
            _ => runs.push(StyleRun {
                text: ch.to_string(),
                start_index: line.start_index + i,
                style,
            }),
        }
    }
    runs
}

/// Total measured width of a line's runs.
pub fn runs_width(runs: &[StyleRun], measurer: &mut dyn TextMeasurer) -> f64 {
    runs.iter()
        .map(|run| measurer.measure(&run.text, &run.style))
        .sum()
}

/// Left edge of a line in element-local coordinates (origin at the element
/// center), honoring the element's alignment within its width.
pub fn line_start_x(align: TextAlign, element_width: f64, line_width: f64) -> f64 {
    let left = -element_width / 2.0;
    match align {
        TextAlign::Left => left,
        TextAlign::Center => left + (element_width - line_width) / 2.0,
        TextAlign::Right => left + element_width - line_width,
    }
}
