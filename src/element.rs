//! The element model: tagged variants for text, image, and banner layers.
//!
//! All variants share base geometry (`x`, `y`, `width`, rotation in degrees,
//! X/Y shear factors). Image and banner store their height; text height is
//! derived from layout metrics and never stored. The model is fully
//! serializable; decoded bitmaps for image elements live in a side-table
//! ([`crate::assets::BitmapStore`]) keyed by element id, never inside the
//! element itself.

use crate::foundation::core::{Point, Rgba8};
use crate::geometry::Shear;
use crate::style::{ColorRange, FontSizeRange, ResolvedStyle, TextAlign, resolve_style_at};

/// Identifier unique within one engine instance.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ElementId(pub u64);

/// Monotonic id source owned by the engine.
///
/// Replaces wall-clock ids: creation rate can never cause a collision, and
/// [`IdGenerator::observe`] seeds the counter past ids arriving from a
/// persisted element list.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId(self.next);
        self.next += 1;
        id
    }

    /// Make sure future ids never collide with an existing one.
    pub fn observe(&mut self, id: ElementId) {
        self.next = self.next.max(id.0 + 1);
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop-shadow parameters. Blur/offsets are in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shadow {
    pub enabled: bool,
    pub color: Rgba8,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgba8::black(),
            blur: 5.0,
            offset_x: 5.0,
            offset_y: 5.0,
        }
    }
}

/// Outline parameters. For text the renderer doubles the width so the stroke
/// reads as an outline around the fill.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    pub enabled: bool,
    pub color: Rgba8,
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgba8::white(),
            width: 2.0,
        }
    }
}

/// The three fixed banner primitives. No general path support by design.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerShape {
    Rectangle,
    Ellipse,
    Diamond,
}

/// Rich-text layer with per-character style overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextElement {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    /// Full text; `\n` separates paragraphs. Range indices are char offsets.
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub color: Rgba8,
    #[serde(default)]
    pub color_ranges: Vec<ColorRange>,
    #[serde(default)]
    pub font_size_ranges: Vec<FontSizeRange>,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub is_underline: bool,
    #[serde(default)]
    pub text_align: TextAlign,
    pub line_height: f64,
    #[serde(default)]
    pub shadow: Shadow,
    #[serde(default)]
    pub stroke: Stroke,
}

impl TextElement {
    pub fn base_style(&self) -> ResolvedStyle {
        ResolvedStyle {
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            color: self.color,
            is_bold: self.is_bold,
            is_italic: self.is_italic,
            is_underline: self.is_underline,
        }
    }

    /// Effective style at char `index`; later-inserted ranges win.
    pub fn style_at(&self, index: usize) -> ResolvedStyle {
        resolve_style_at(
            &self.base_style(),
            &self.color_ranges,
            &self.font_size_ranges,
            index,
        )
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn skew(&self) -> Shear {
        Shear::new(self.skew_x, self.skew_y)
    }
}

/// Bitmap layer. `src` is the persisted reference; pixels are hydrated into
/// the engine's bitmap store and never serialized with the element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageElement {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub src: String,
    /// Locked width/height ratio; every resize preserves it.
    pub aspect_ratio: f64,
    #[serde(default)]
    pub shadow: Shadow,
    #[serde(default)]
    pub stroke: Stroke,
}

impl ImageElement {
    pub fn skew(&self) -> Shear {
        Shear::new(self.skew_x, self.skew_y)
    }
}

/// Solid-filled primitive shape layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BannerElement {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub shape: BannerShape,
    pub background_color: Rgba8,
    #[serde(default)]
    pub shadow: Shadow,
    #[serde(default)]
    pub stroke: Stroke,
}

impl BannerElement {
    pub fn skew(&self) -> Shear {
        Shear::new(self.skew_x, self.skew_y)
    }
}

/// Closed variant set; the renderer and export pipeline are total over it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanvasElement {
    Text(TextElement),
    Image(ImageElement),
    Banner(BannerElement),
}

impl CanvasElement {
    pub fn id(&self) -> ElementId {
        match self {
            CanvasElement::Text(el) => el.id,
            CanvasElement::Image(el) => el.id,
            CanvasElement::Banner(el) => el.id,
        }
    }

    pub fn origin(&self) -> Point {
        match self {
            CanvasElement::Text(el) => Point::new(el.x, el.y),
            CanvasElement::Image(el) => Point::new(el.x, el.y),
            CanvasElement::Banner(el) => Point::new(el.x, el.y),
        }
    }

    pub fn set_origin(&mut self, x: f64, y: f64) {
        match self {
            CanvasElement::Text(el) => {
                el.x = x;
                el.y = y;
            }
            CanvasElement::Image(el) => {
                el.x = x;
                el.y = y;
            }
            CanvasElement::Banner(el) => {
                el.x = x;
                el.y = y;
            }
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            CanvasElement::Text(el) => el.width,
            CanvasElement::Image(el) => el.width,
            CanvasElement::Banner(el) => el.width,
        }
    }

    pub fn rotation(&self) -> f64 {
        match self {
            CanvasElement::Text(el) => el.rotation,
            CanvasElement::Image(el) => el.rotation,
            CanvasElement::Banner(el) => el.rotation,
        }
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        match self {
            CanvasElement::Text(el) => el.rotation = rotation,
            CanvasElement::Image(el) => el.rotation = rotation,
            CanvasElement::Banner(el) => el.rotation = rotation,
        }
    }

    pub fn skew(&self) -> Shear {
        match self {
            CanvasElement::Text(el) => Shear::new(el.skew_x, el.skew_y),
            CanvasElement::Image(el) => Shear::new(el.skew_x, el.skew_y),
            CanvasElement::Banner(el) => Shear::new(el.skew_x, el.skew_y),
        }
    }

    pub fn set_skew(&mut self, skew: Shear) {
        match self {
            CanvasElement::Text(el) => {
                el.skew_x = skew.x;
                el.skew_y = skew.y;
            }
            CanvasElement::Image(el) => {
                el.skew_x = skew.x;
                el.skew_y = skew.y;
            }
            CanvasElement::Banner(el) => {
                el.skew_x = skew.x;
                el.skew_y = skew.y;
            }
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            CanvasElement::Text(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextElement> {
        match self {
            CanvasElement::Text(el) => Some(el),
            _ => None,
        }
    }
}
