//! Parley-backed shaping for style-homogeneous text runs.
//!
//! Fonts are registered explicitly from bytes; nothing is loaded from the
//! system. Each element style maps to a registered family by name, falling
//! back to the first registered family when the requested one is unknown.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{CollageError, CollageResult};
use crate::style::ResolvedStyle;
use crate::text::measure::TextMeasurer;

/// One run of positioned glyphs sharing a font and size, ready for the
/// renderer to fill.
pub struct ShapedRun {
    pub font: vello_cpu::peniko::FontData,
    pub font_size: f32,
    pub glyphs: Vec<vello_cpu::Glyph>,
}

/// A shaped single-line layout: its advance width plus the glyph runs.
pub struct ShapedLine {
    pub width: f64,
    pub runs: Vec<ShapedRun>,
}

struct RegisteredFamily {
    /// Family name as Parley resolved it from the font data.
    resolved_name: String,
    font: vello_cpu::peniko::FontData,
}

/// Stateful helper for shaping text with explicitly registered fonts.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    families: HashMap<String, RegisteredFamily>,
    fallback: Option<String>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
            fallback: None,
        }
    }

    /// Register a font under `family`, the name elements refer to it by.
    /// The first registration becomes the fallback for unknown families.
    pub fn register_font(&mut self, family: &str, font_bytes: Vec<u8>) -> CollageResult<()> {
        let blob = parley::fontique::Blob::from(font_bytes.clone());
        let registered = self.font_ctx.collection.register_fonts(blob, None);
        let family_id = registered
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CollageError::asset("no font families registered from font bytes"))?;
        let resolved_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CollageError::asset("registered font family has no name"))?
            .to_string();

        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        let key = family.to_ascii_lowercase();
        if self.fallback.is_none() {
            self.fallback = Some(key.clone());
        }
        self.families.insert(
            key,
            RegisteredFamily {
                resolved_name,
                font,
            },
        );
        Ok(())
    }

    pub fn has_fonts(&self) -> bool {
        !self.families.is_empty()
    }

    fn family_for(&self, requested: &str) -> CollageResult<&RegisteredFamily> {
        let key = requested.to_ascii_lowercase();
        if let Some(fam) = self.families.get(&key) {
            return Ok(fam);
        }
        self.fallback
            .as_ref()
            .and_then(|k| self.families.get(k))
            .ok_or_else(|| CollageError::asset("no fonts registered"))
    }

    /// Shape one style-homogeneous run as a single unbroken line.
    pub fn shape_run(&mut self, text: &str, style: &ResolvedStyle) -> CollageResult<ShapedLine> {
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(CollageError::validation(
                "text font_size must be finite and > 0",
            ));
        }
        let (resolved_name, font) = {
            let fam = self.family_for(&style.font_family)?;
            (fam.resolved_name.clone(), fam.font.clone())
        };

        let mut builder = self.layout_ctx.ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(resolved_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            style.font_size as f32,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(style.color));
        if style.is_bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }
        if style.is_italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);

        let mut runs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run
                    .glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                runs.push(ShapedRun {
                    font: font.clone(),
                    font_size: run.run().font_size(),
                    glyphs,
                });
            }
        }

        Ok(ShapedLine {
            width: layout.full_width() as f64,
            runs,
        })
    }
}

impl TextMeasurer for TextShaper {
    fn measure(&mut self, text: &str, style: &ResolvedStyle) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        match self.shape_run(text, style) {
            Ok(line) => line.width,
            Err(err) => {
                tracing::warn!(family = %style.font_family, %err, "measure failed, using zero width");
                0.0
            }
        }
    }
}
