use crate::style::ResolvedStyle;

/// Width measurement seam for the layout engine.
///
/// Layout, hit-testing, and the manipulation code only need "how wide is this
/// string in this style"; the production implementation shapes through parley
/// ([`crate::text::TextShaper`]) while tests use [`FixedAdvanceMeasurer`] for
/// deterministic geometry.
pub trait TextMeasurer {
    /// Measured advance width of `text` rendered in `style`, in pixels.
    fn measure(&mut self, text: &str, style: &ResolvedStyle) -> f64;
}

/// Deterministic measurer: every character advances `advance_em * font_size`.
///
/// No shaping, no font data. Good enough for headless callers and exact
/// enough for layout math to be asserted in tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedAdvanceMeasurer {
    pub advance_em: f64,
}

impl FixedAdvanceMeasurer {
    pub fn new(advance_em: f64) -> Self {
        Self { advance_em }
    }
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        // Roughly the average advance of a proportional latin face.
        Self { advance_em: 0.6 }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure(&mut self, text: &str, style: &ResolvedStyle) -> f64 {
        text.chars().count() as f64 * style.font_size * self.advance_em
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgba8;

    fn style(size: f64) -> ResolvedStyle {
        ResolvedStyle {
            font_size: size,
            font_family: "Test".to_string(),
            color: Rgba8::black(),
            is_bold: false,
            is_italic: false,
            is_underline: false,
        }
    }

    #[test]
    fn width_scales_with_font_size_and_length() {
        let mut m = FixedAdvanceMeasurer::new(0.5);
        assert_eq!(m.measure("abcd", &style(10.0)), 20.0);
        assert_eq!(m.measure("abcd", &style(20.0)), 40.0);
        assert_eq!(m.measure("", &style(20.0)), 0.0);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let mut m = FixedAdvanceMeasurer::new(1.0);
        assert_eq!(m.measure("äöü", &style(10.0)), 30.0);
    }
}
