//! Mapping a canvas-space point to a character index inside a text element.

use crate::element::TextElement;
use crate::foundation::core::Point;
use crate::geometry::rotate_point;
use crate::text::layout::{line_runs, line_start_x, runs_width, text_height, wrap_text};
use crate::text::measure::TextMeasurer;

/// Resolve `point` (canvas coordinates) to a caret position in `el.text`.
///
/// The point is mapped into element-local space by undoing rotation and then
/// shear. Returns `None` when the shear matrix is singular. A point past a
/// line's last glyph maps to the line end, before its first glyph to the
/// line start; a point outside every line maps to the text length, so the
/// result is always a valid caret position.
pub fn char_index_at_point(
    el: &TextElement,
    point: Point,
    measurer: &mut dyn TextMeasurer,
) -> Option<usize> {
    let height = text_height(el, measurer);
    let center = Point::new(el.x + el.width / 2.0, el.y + height / 2.0);

    let unrotated = rotate_point(point, center, -el.rotation);
    let local = unrotated - center;
    let local = el.skew().invert(local.to_point())?;

    let lines = wrap_text(el, measurer);
    let mut cumulative_y = -height / 2.0;

    for line in &lines {
        let max_font = crate::text::layout::line_max_font_size(el, line);
        let line_height = max_font * el.line_height;

        if local.y >= cumulative_y && local.y <= cumulative_y + line_height {
            let runs = line_runs(el, line);
            let total_width = runs_width(&runs, measurer);
            let mut x = line_start_x(el.text_align, el.width, total_width);

            let mut line_char_index = 0usize;
            for run in &runs {
                for (i, ch) in run.text.chars().enumerate() {
                    let char_width = measurer.measure(&ch.to_string(), &run.style);
                    if local.x >= x && local.x < x + char_width {
                        let after = if local.x > x + char_width / 2.0 { 1 } else { 0 };
                        return Some(line.start_index + line_char_index + i + after);
                    }
                    x += char_width;
                }
                line_char_index += run.text.chars().count();
            }
            if local.x >= x {
                return Some(line.start_index + line.char_len());
            }
            if local.x < -el.width / 2.0 {
                return Some(line.start_index);
            }
        }
        cumulative_y += line_height;
    }

    Some(el.char_len())
}

/// The inclusive caret range covering both endpoints, in either drag order.
pub fn selection_range(anchor: usize, focus: usize) -> (usize, usize) {
    (anchor.min(focus), anchor.max(focus))
}
