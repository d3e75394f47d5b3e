//! Display→full-resolution rescaling and flattening.
//!
//! The editing session runs at display resolution; export re-draws every
//! element at the base image's native resolution by scaling the stored
//! geometry, never by resampling rendered pixels.

use crate::assets::{BitmapStore, PreparedBitmap};
use crate::element::CanvasElement;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CollageError, CollageResult};
use crate::render::{FrameOptions, Renderer};
use crate::text::shaper::TextShaper;

/// Scale an element's geometry and typography from display space into
/// `(sx, sy)`-scaled space.
///
/// Per-field table: `x`/`width`/`shadow.offset_x` scale by `sx`; `y`,
/// `font_size` (base and every range), `shadow.blur`, `shadow.offset_y`,
/// and `stroke.width` scale by `sy`; image/banner `height` scales by `sy`.
/// Rotation and skew are dimensionless and pass through.
pub fn scale_element(el: &CanvasElement, sx: f64, sy: f64) -> CanvasElement {
    let mut out = el.clone();
    match &mut out {
        CanvasElement::Text(t) => {
            t.x *= sx;
            t.y *= sy;
            t.width *= sx;
            t.font_size *= sy;
            for range in &mut t.font_size_ranges {
                range.font_size *= sy;
            }
            t.shadow.blur *= sy;
            t.shadow.offset_x *= sx;
            t.shadow.offset_y *= sy;
            t.stroke.width *= sy;
        }
        CanvasElement::Image(i) => {
            i.x *= sx;
            i.y *= sy;
            i.width *= sx;
            i.height *= sy;
        }
        CanvasElement::Banner(b) => {
            b.x *= sx;
            b.y *= sy;
            b.width *= sx;
            b.height *= sy;
            b.shadow.blur *= sy;
            b.shadow.offset_x *= sx;
            b.shadow.offset_y *= sy;
            b.stroke.width *= sy;
        }
    }
    out
}

/// The Apply contract: the flattened full-resolution bitmap plus the
/// unscaled element list. Image elements in the list carry only their `src`;
/// decoded pixels never leave the engine's side-table.
pub struct ExportOutput {
    pub flattened: image::RgbaImage,
    pub elements: Vec<CanvasElement>,
}

/// Flatten the composition onto the base image at its native resolution.
///
/// `display` is the canvas size the elements were edited at; `overlay`, if
/// given, is a premultiplied RGBA8 buffer at full base resolution (the
/// freehand brush collaborator's raster) composited on top at the end.
#[tracing::instrument(skip_all, fields(base_w = base.width, base_h = base.height))]
pub fn flatten(
    base: &PreparedBitmap,
    elements: &[CanvasElement],
    bitmaps: &BitmapStore,
    shaper: &mut TextShaper,
    display: Canvas,
    overlay: Option<&[u8]>,
) -> CollageResult<ExportOutput> {
    if display.width == 0 || display.height == 0 {
        return Err(CollageError::validation(
            "display canvas dimensions must be non-zero",
        ));
    }
    let sx = f64::from(base.width) / f64::from(display.width);
    let sy = f64::from(base.height) / f64::from(display.height);

    let scaled: Vec<CanvasElement> = elements
        .iter()
        .map(|el| scale_element(el, sx, sy))
        .collect();

    let mut renderer = Renderer::new(base.width, base.height)?;
    renderer.render(
        Some(base),
        &scaled,
        bitmaps,
        shaper,
        &FrameOptions::default(),
    )?;

    if let Some(overlay) = overlay {
        renderer.composite_overlay(overlay)?;
    }

    let flattened = unpremultiply_to_image(renderer.data(), base.width, base.height)?;

    Ok(ExportOutput {
        flattened,
        elements: elements.to_vec(),
    })
}

fn unpremultiply_to_image(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CollageResult<image::RgbaImage> {
    let mut out = Vec::with_capacity(rgba8_premul.len());
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let a16 = u16::from(a);
        out.push(((u16::from(px[0]) * 255 + a16 / 2) / a16).min(255) as u8);
        out.push(((u16::from(px[1]) * 255 + a16 / 2) / a16).min(255) as u8);
        out.push(((u16::from(px[2]) * 255 + a16 / 2) / a16).min(255) as u8);
        out.push(a);
    }
    image::RgbaImage::from_raw(width, height, out)
        .ok_or_else(|| CollageError::render("flattened buffer size mismatch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{
        BannerElement, BannerShape, ElementId, Shadow, Stroke, TextElement,
    };
    use crate::foundation::core::Rgba8;
    use crate::style::{FontSizeRange, TextAlign};

    fn text_el() -> CanvasElement {
        CanvasElement::Text(TextElement {
            id: ElementId(1),
            x: 10.0,
            y: 20.0,
            width: 100.0,
            rotation: 30.0,
            skew_x: 0.1,
            skew_y: -0.1,
            text: "hi".to_string(),
            font_size: 20.0,
            font_family: "Test".to_string(),
            color: Rgba8::black(),
            color_ranges: vec![],
            font_size_ranges: vec![FontSizeRange {
                start: 0,
                end: 1,
                font_size: 40.0,
            }],
            is_bold: false,
            is_italic: false,
            is_underline: false,
            text_align: TextAlign::Center,
            line_height: 1.2,
            shadow: Shadow {
                enabled: true,
                color: Rgba8::black(),
                blur: 5.0,
                offset_x: 5.0,
                offset_y: 5.0,
            },
            stroke: Stroke {
                enabled: true,
                color: Rgba8::white(),
                width: 2.0,
            },
        })
    }

    #[test]
    fn scale_element_applies_the_per_field_table() {
        let scaled = scale_element(&text_el(), 2.0, 3.0);
        let CanvasElement::Text(t) = scaled else { panic!() };
        assert_eq!((t.x, t.y, t.width), (20.0, 60.0, 200.0));
        assert_eq!(t.font_size, 60.0);
        assert_eq!(t.font_size_ranges[0].font_size, 120.0);
        assert_eq!((t.shadow.offset_x, t.shadow.offset_y), (10.0, 15.0));
        assert_eq!(t.shadow.blur, 15.0);
        assert_eq!(t.stroke.width, 6.0);
        // dimensionless fields pass through
        assert_eq!((t.rotation, t.skew_x, t.skew_y), (30.0, 0.1, -0.1));
    }

    #[test]
    fn scale_by_one_is_identity() {
        let el = text_el();
        assert_eq!(scale_element(&el, 1.0, 1.0), el);

        let banner = CanvasElement::Banner(BannerElement {
            id: ElementId(2),
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            rotation: 5.0,
            skew_x: 0.0,
            skew_y: 0.0,
            shape: BannerShape::Diamond,
            background_color: Rgba8::white(),
            shadow: Shadow::default(),
            stroke: Stroke::default(),
        });
        assert_eq!(scale_element(&banner, 1.0, 1.0), banner);
    }

    #[test]
    fn unpremultiply_inverts_opaque_and_zero_alpha() {
        let premul = [100u8, 50, 25, 255, 0, 0, 0, 0, 64, 32, 16, 128];
        let img = unpremultiply_to_image(&premul, 3, 1).unwrap();
        let px = img.as_raw();
        assert_eq!(&px[0..4], &[100, 50, 25, 255]);
        assert_eq!(&px[4..8], &[0, 0, 0, 0]);
        assert_eq!(px[7 + 4], 128);
        assert!((i32::from(px[8]) - 127).abs() <= 1);
    }
}
