//! Per-character style resolution for text elements.
//!
//! A text element carries a base style plus append-only override ranges.
//! Ranges are half-open `[start, end)` over character indices and may
//! overlap; resolution scans them in insertion order and each matching range
//! overwrites the field, so the last-inserted covering range wins. This is a
//! documented contract, not an accident: there is no priority field, and the
//! editing operations rely on "newest edit on top".

use crate::foundation::core::Rgba8;

/// Color override over a half-open character interval.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorRange {
    pub start: usize,
    pub end: usize,
    pub color: Rgba8,
}

/// Font-size override over a half-open character interval.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FontSizeRange {
    pub start: usize,
    pub end: usize,
    pub font_size: f64,
}

/// Horizontal alignment of wrapped lines within the element width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Fully-resolved style of a single character.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub font_size: f64,
    pub font_family: String,
    pub color: Rgba8,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_underline: bool,
}

/// Resolve the effective style at character `index` from `base` plus the
/// override ranges. Ranges not covering `index` (including any lying outside
/// the text) simply never match; linear in range count.
pub fn resolve_style_at(
    base: &ResolvedStyle,
    color_ranges: &[ColorRange],
    font_size_ranges: &[FontSizeRange],
    index: usize,
) -> ResolvedStyle {
    let mut style = base.clone();
    for range in color_ranges {
        if index >= range.start && index < range.end {
            style.color = range.color;
        }
    }
    for range in font_size_ranges {
        if index >= range.start && index < range.end {
            style.font_size = range.font_size;
        }
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ResolvedStyle {
        ResolvedStyle {
            font_size: 16.0,
            font_family: "Arial".to_string(),
            color: Rgba8::black(),
            is_bold: false,
            is_italic: false,
            is_underline: false,
        }
    }

    const RED: Rgba8 = Rgba8::opaque(255, 0, 0);
    const BLUE: Rgba8 = Rgba8::opaque(0, 0, 255);

    #[test]
    fn inside_range_overrides_base() {
        let ranges = [ColorRange { start: 0, end: 5, color: RED }];
        let s = resolve_style_at(&base(), &ranges, &[], 2);
        assert_eq!(s.color, RED);
    }

    #[test]
    fn outside_range_keeps_base() {
        let ranges = [ColorRange { start: 0, end: 5, color: RED }];
        let s = resolve_style_at(&base(), &ranges, &[], 7);
        assert_eq!(s.color, Rgba8::black());
    }

    #[test]
    fn later_overlapping_range_wins() {
        let ranges = [
            ColorRange { start: 0, end: 5, color: RED },
            ColorRange { start: 3, end: 8, color: BLUE },
        ];
        assert_eq!(resolve_style_at(&base(), &ranges, &[], 4).color, BLUE);
        assert_eq!(resolve_style_at(&base(), &ranges, &[], 1).color, RED);
        assert_eq!(resolve_style_at(&base(), &ranges, &[], 6).color, BLUE);
    }

    #[test]
    fn end_is_exclusive() {
        let ranges = [FontSizeRange { start: 2, end: 4, font_size: 40.0 }];
        assert_eq!(resolve_style_at(&base(), &[], &ranges, 3).font_size, 40.0);
        assert_eq!(resolve_style_at(&base(), &[], &ranges, 4).font_size, 16.0);
    }

    #[test]
    fn color_and_size_ranges_are_independent() {
        let colors = [ColorRange { start: 0, end: 2, color: RED }];
        let sizes = [FontSizeRange { start: 1, end: 3, font_size: 9.0 }];
        let s = resolve_style_at(&base(), &colors, &sizes, 1);
        assert_eq!(s.color, RED);
        assert_eq!(s.font_size, 9.0);
        assert!(!s.is_bold);
    }
}
