//! CPU renderer over `vello_cpu`.
//!
//! Each element is drawn in its own render pass and composited into a
//! persistent pixmap, so shadow passes (which run through the blur) can be
//! layered under their element. All pixel data is premultiplied RGBA8.

pub mod blur;
pub mod composite;

use crate::assets::{BitmapStore, PreparedBitmap};
use crate::element::{BannerElement, BannerShape, CanvasElement, ElementId, TextElement};
use crate::foundation::core::{Affine, BezPath, Point, Rgba8, Vec2};
use crate::foundation::error::{CollageError, CollageResult};
use crate::text::layout::{
    ElementMetrics, element_metrics, line_max_font_size, line_runs, line_start_x, runs_width,
    wrap_text,
};
use crate::text::measure::TextMeasurer;
use crate::text::shaper::TextShaper;

/// Selection chrome accent, #007bff.
pub const CHROME_COLOR: Rgba8 = Rgba8::opaque(0, 123, 255);
/// Text selection highlight, rgba(0, 123, 255, 0.4).
pub const HIGHLIGHT_COLOR: Rgba8 = Rgba8::new(0, 123, 255, 102);
/// Drawn size of a square handle, px.
pub const HANDLE_DRAW_SIZE: f64 = 8.0;
/// Rotate knob offset above the top edge, px.
pub const ROTATE_KNOB_OFFSET: f64 = 20.0;
/// Dash pattern for the selection bounding box.
pub const SELECTION_DASH: [f64; 2] = [4.0, 2.0];

/// What the frame should show besides the elements themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameOptions {
    /// Element whose chrome and text highlight are drawn.
    pub selected: Option<ElementId>,
    /// Active text selection range, highlighted inside the selected element.
    pub text_selection: Option<(usize, usize)>,
    /// Chrome is hidden while a text selection drag is in progress.
    pub show_chrome: bool,
}

pub struct Renderer {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> CollageResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| CollageError::render("canvas width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| CollageError::render("canvas height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(CollageError::render("canvas dimensions must be non-zero"));
        }
        Ok(Self {
            width: w,
            height: h,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Premultiplied RGBA8 pixels of the last rendered frame.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Render a full frame: base image, elements back-to-front, then
    /// selection chrome.
    pub fn render(
        &mut self,
        base: Option<&PreparedBitmap>,
        elements: &[CanvasElement],
        bitmaps: &BitmapStore,
        shaper: &mut TextShaper,
        options: &FrameOptions,
    ) -> CollageResult<()> {
        self.pixmap = vello_cpu::Pixmap::new(self.width, self.height);

        if let Some(base) = base {
            self.draw_base(base)?;
        }

        for el in elements {
            match el {
                CanvasElement::Text(t) => self.draw_text(t, shaper, options)?,
                CanvasElement::Image(i) => {
                    // An unhydrated image element stays blank, not fatal.
                    if let Some(bitmap) = bitmaps.get(i.id) {
                        self.draw_image(i, bitmap)?;
                    }
                }
                CanvasElement::Banner(b) => self.draw_banner(b)?,
            }
        }

        if options.show_chrome
            && let Some(selected) = options.selected
            && let Some(el) = elements.iter().find(|el| el.id() == selected)
        {
            self.draw_chrome(el, shaper)?;
        }

        Ok(())
    }

    /// Composite a premultiplied RGBA8 overlay of the canvas size on top.
    pub fn composite_overlay(&mut self, overlay_rgba8_premul: &[u8]) -> CollageResult<()> {
        composite::over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            overlay_rgba8_premul,
            1.0,
        )
    }

    fn ctx(&self) -> vello_cpu::RenderContext {
        vello_cpu::RenderContext::new(self.width, self.height)
    }

    /// Render a finished pass and composite it over the accumulated frame.
    /// Rendering directly into the persistent pixmap would replace it, wiping
    /// the base image and every earlier pass.
    fn flush_into_pixmap(&mut self, mut ctx: vello_cpu::RenderContext) -> CollageResult<()> {
        ctx.flush();
        let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut scratch);
        composite::over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
            1.0,
        )
    }

    fn draw_base(&mut self, base: &PreparedBitmap) -> CollageResult<()> {
        let paint = bitmap_paint(base)?;
        let sx = f64::from(self.width) / f64::from(base.width.max(1));
        let sy = f64::from(self.height) / f64::from(base.height.max(1));

        let mut ctx = self.ctx();
        ctx.set_transform(affine_to_cpu(Affine::scale_non_uniform(sx, sy)));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(base.width),
            f64::from(base.height),
        ));
        self.flush_into_pixmap(ctx)
    }

    fn draw_image(
        &mut self,
        el: &crate::element::ImageElement,
        bitmap: &PreparedBitmap,
    ) -> CollageResult<()> {
        let center = Point::new(el.x + el.width / 2.0, el.y + el.height / 2.0);
        let local = element_transform(center, el.rotation, el.skew())
            * Affine::translate(Vec2::new(-el.width / 2.0, -el.height / 2.0))
            * Affine::scale_non_uniform(
                el.width / f64::from(bitmap.width.max(1)),
                el.height / f64::from(bitmap.height.max(1)),
            );

        let mut ctx = self.ctx();
        ctx.set_transform(affine_to_cpu(local));
        ctx.set_paint(bitmap_paint(bitmap)?);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(bitmap.width),
            f64::from(bitmap.height),
        ));
        self.flush_into_pixmap(ctx)
    }

    fn draw_banner(&mut self, el: &BannerElement) -> CollageResult<()> {
        let center = Point::new(el.x + el.width / 2.0, el.y + el.height / 2.0);
        let transform = element_transform(center, el.rotation, el.skew());
        let path = banner_path(el.shape, el.width, el.height);

        if el.shadow.enabled {
            self.draw_shadow_silhouette(&path, transform, &el.shadow)?;
        }

        let mut ctx = self.ctx();
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(color_paint(el.background_color));
        let cpu_path = bezpath_to_cpu(&path);
        ctx.fill_path(&cpu_path);

        // Shadow never applies to the stroke pass.
        if el.stroke.enabled && el.stroke.width > 0.0 {
            ctx.set_paint(color_paint(el.stroke.color));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(el.stroke.width));
            ctx.stroke_path(&cpu_path);
        }
        self.flush_into_pixmap(ctx)
    }

    fn draw_text(
        &mut self,
        el: &TextElement,
        shaper: &mut TextShaper,
        options: &FrameOptions,
    ) -> CollageResult<()> {
        let metrics = element_metrics(&CanvasElement::Text(el.clone()), shaper);
        let transform = element_transform(metrics.center(), el.rotation, el.skew());

        if el.shadow.enabled {
            let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
            let mut ctx = self.ctx();
            self.draw_text_runs(&mut ctx, el, &metrics, shaper, transform, TextPass::Shadow)?;
            ctx.flush();
            ctx.render_to_pixmap(&mut scratch);

            let sigma = (el.shadow.blur as f32 / 2.0).max(0.01);
            let radius = el.shadow.blur.ceil().max(0.0) as u32;
            let blurred = blur::blur_rgba8_premul(
                scratch.data_as_u8_slice(),
                u32::from(self.width),
                u32::from(self.height),
                radius,
                sigma,
            )?;
            composite::over_in_place(self.pixmap.data_as_u8_slice_mut(), &blurred, 1.0)?;
        }

        let highlight = match (options.selected, options.text_selection) {
            (Some(id), Some((start, end))) if id == el.id && start != end => Some((start, end)),
            _ => None,
        };

        let mut ctx = self.ctx();
        if let Some((start, end)) = highlight {
            self.draw_text_highlight(&mut ctx, el, &metrics, shaper, transform, start, end);
        }
        self.draw_text_runs(&mut ctx, el, &metrics, shaper, transform, TextPass::Fill)?;
        self.flush_into_pixmap(ctx)
    }

    fn draw_text_highlight(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        el: &TextElement,
        metrics: &ElementMetrics,
        shaper: &mut TextShaper,
        transform: Affine,
        start: usize,
        end: usize,
    ) {
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(color_paint(HIGHLIGHT_COLOR));

        let lines = wrap_text(el, shaper);
        let mut line_y = -metrics.height / 2.0;
        for line in &lines {
            let line_height = line_max_font_size(el, line) * el.line_height;
            let runs = line_runs(el, line);
            let total = runs_width(&runs, shaper);
            let mut x = line_start_x(el.text_align, el.width, total);

            for run in &runs {
                for (i, ch) in run.text.chars().enumerate() {
                    let char_width = shaper.measure(&ch.to_string(), &run.style);
                    let index = run.start_index + i;
                    if index >= start && index < end {
                        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                            x,
                            line_y,
                            x + char_width,
                            line_y + line_height,
                        ));
                    }
                    x += char_width;
                }
            }
            line_y += line_height;
        }
    }

    fn draw_text_runs(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        el: &TextElement,
        metrics: &ElementMetrics,
        shaper: &mut TextShaper,
        transform: Affine,
        pass: TextPass,
    ) -> CollageResult<()> {
        let lines = wrap_text(el, shaper);
        let mut line_y = -metrics.height / 2.0;

        for line in &lines {
            let line_height = line_max_font_size(el, line) * el.line_height;
            let runs = line_runs(el, line);
            let total = runs_width(&runs, shaper);
            let mut x = line_start_x(el.text_align, el.width, total);

            for run in &runs {
                let shaped = shaper.shape_run(&run.text, &run.style)?;
                let run_transform = transform * Affine::translate(Vec2::new(x, line_y));
                ctx.set_transform(affine_to_cpu(run_transform));

                match pass {
                    TextPass::Shadow => {
                        // Silhouette in the shadow color, pre-offset; the
                        // caller blurs and composites it under the element.
                        let offset = Affine::translate(Vec2::new(
                            el.shadow.offset_x,
                            el.shadow.offset_y,
                        ));
                        ctx.set_transform(affine_to_cpu(offset * run_transform));
                        ctx.set_paint(color_paint(el.shadow.color));
                        for sr in &shaped.runs {
                            ctx.glyph_run(&sr.font)
                                .font_size(sr.font_size)
                                .fill_glyphs(sr.glyphs.iter().copied());
                        }
                    }
                    TextPass::Fill => {
                        // Outline first so the fill sits on top of it.
                        if el.stroke.enabled && el.stroke.width > 0.0 {
                            ctx.set_paint(color_paint(el.stroke.color));
                            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(el.stroke.width * 2.0));
                            for sr in &shaped.runs {
                                ctx.glyph_run(&sr.font)
                                    .font_size(sr.font_size)
                                    .stroke_glyphs(sr.glyphs.iter().copied());
                            }
                        }

                        ctx.set_paint(color_paint(run.style.color));
                        for sr in &shaped.runs {
                            ctx.glyph_run(&sr.font)
                                .font_size(sr.font_size)
                                .fill_glyphs(sr.glyphs.iter().copied());
                        }

                        if run.style.is_underline {
                            let underline_y = line_y + run.style.font_size + 2.0;
                            let rule = vello_cpu::kurbo::Stroke::new(
                                (run.style.font_size / 15.0).max(1.0),
                            );
                            let mut path = vello_cpu::kurbo::BezPath::new();
                            path.move_to(vello_cpu::kurbo::Point::new(0.0, 0.0));
                            path.line_to(vello_cpu::kurbo::Point::new(shaped.width, 0.0));
                            ctx.set_transform(affine_to_cpu(
                                transform * Affine::translate(Vec2::new(x, underline_y)),
                            ));
                            ctx.set_paint(color_paint(run.style.color));
                            ctx.set_stroke(rule);
                            ctx.stroke_path(&path);
                        }
                    }
                }
                x += shaped.width;
            }
            line_y += line_height;
        }
        Ok(())
    }

    /// Dashed bounding box, eight square handles, and the rotate knob.
    /// Chrome follows rotation only; shear is deliberately not applied so
    /// handles stay square under distortion.
    fn draw_chrome(&mut self, el: &CanvasElement, shaper: &mut TextShaper) -> CollageResult<()> {
        use kurbo::Shape as _;

        let metrics = element_metrics(el, shaper);
        let center = metrics.center();
        let (hw, hh) = (metrics.width / 2.0, metrics.height / 2.0);
        let transform =
            Affine::translate(center.to_vec2()) * Affine::rotate(el.rotation().to_radians());

        let mut ctx = self.ctx();
        ctx.set_transform(affine_to_cpu(transform));

        ctx.set_paint(color_paint(CHROME_COLOR));
        ctx.set_stroke(
            vello_cpu::kurbo::Stroke::new(1.0).with_dashes(0.0, SELECTION_DASH),
        );
        ctx.stroke_rect(&vello_cpu::kurbo::Rect::new(-hw, -hh, hw, hh));

        let handles = [
            Point::new(-hw, -hh),
            Point::new(hw, -hh),
            Point::new(-hw, hh),
            Point::new(hw, hh),
            Point::new(0.0, -hh),
            Point::new(0.0, hh),
            Point::new(-hw, 0.0),
            Point::new(hw, 0.0),
        ];
        let half = HANDLE_DRAW_SIZE / 2.0;
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0));
        for p in handles {
            let rect = vello_cpu::kurbo::Rect::new(p.x - half, p.y - half, p.x + half, p.y + half);
            ctx.set_paint(color_paint(CHROME_COLOR));
            ctx.stroke_rect(&rect);
            ctx.set_paint(color_paint(Rgba8::white()));
            ctx.fill_rect(&rect);
        }

        // Stem and knob above the top edge.
        let mut stem = vello_cpu::kurbo::BezPath::new();
        stem.move_to(vello_cpu::kurbo::Point::new(0.0, -hh));
        stem.line_to(vello_cpu::kurbo::Point::new(0.0, -hh - ROTATE_KNOB_OFFSET));
        ctx.set_paint(color_paint(CHROME_COLOR));
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0));
        ctx.stroke_path(&stem);

        let knob = kurbo::Circle::new(
            Point::new(0.0, -hh - ROTATE_KNOB_OFFSET),
            HANDLE_DRAW_SIZE / 2.0,
        )
        .to_path(0.1);
        let knob = bezpath_to_cpu(&knob);
        ctx.set_paint(color_paint(Rgba8::white()));
        ctx.fill_path(&knob);
        ctx.set_paint(color_paint(CHROME_COLOR));
        ctx.stroke_path(&knob);

        self.flush_into_pixmap(ctx)
    }

    fn draw_shadow_silhouette(
        &mut self,
        path: &BezPath,
        transform: Affine,
        shadow: &crate::element::Shadow,
    ) -> CollageResult<()> {
        let offset = Affine::translate(Vec2::new(shadow.offset_x, shadow.offset_y));

        let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
        let mut ctx = self.ctx();
        ctx.set_transform(affine_to_cpu(offset * transform));
        ctx.set_paint(color_paint(shadow.color));
        ctx.fill_path(&bezpath_to_cpu(path));
        ctx.flush();
        ctx.render_to_pixmap(&mut scratch);

        let sigma = (shadow.blur as f32 / 2.0).max(0.01);
        let radius = shadow.blur.ceil().max(0.0) as u32;
        let blurred = blur::blur_rgba8_premul(
            scratch.data_as_u8_slice(),
            u32::from(self.width),
            u32::from(self.height),
            radius,
            sigma,
        )?;
        composite::over_in_place(self.pixmap.data_as_u8_slice_mut(), &blurred, 1.0)
    }
}

#[derive(Clone, Copy)]
enum TextPass {
    Shadow,
    Fill,
}

/// Local-frame placement: translate to the center, rotate, then shear.
pub fn element_transform(center: Point, rotation_deg: f64, shear: crate::geometry::Shear) -> Affine {
    Affine::translate(center.to_vec2()) * Affine::rotate(rotation_deg.to_radians()) * shear.to_affine()
}

/// Shape outline in local coordinates centered at the origin.
pub fn banner_path(shape: BannerShape, width: f64, height: f64) -> BezPath {
    use kurbo::Shape as _;
    match shape {
        BannerShape::Rectangle => {
            kurbo::Rect::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0).to_path(0.1)
        }
        BannerShape::Ellipse => {
            kurbo::Ellipse::new(Point::ZERO, Vec2::new(width / 2.0, height / 2.0), 0.0).to_path(0.1)
        }
        BannerShape::Diamond => {
            let mut path = BezPath::new();
            path.move_to(Point::new(0.0, -height / 2.0));
            path.line_to(Point::new(width / 2.0, 0.0));
            path.line_to(Point::new(0.0, height / 2.0));
            path.line_to(Point::new(-width / 2.0, 0.0));
            path.close_path();
            path
        }
    }
}

fn color_paint(color: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn bitmap_paint(bitmap: &PreparedBitmap) -> CollageResult<vello_cpu::Image> {
    let pixmap =
        premul_bytes_to_pixmap(bitmap.rgba8_premul.as_slice(), bitmap.width, bitmap.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CollageResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CollageError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CollageError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CollageError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_rejects_degenerate_sizes() {
        assert!(Renderer::new(0, 10).is_err());
        assert!(Renderer::new(10, 0).is_err());
        assert!(Renderer::new(70_000, 10).is_err());
        assert!(Renderer::new(640, 480).is_ok());
    }

    #[test]
    fn banner_paths_cover_expected_extents() {
        use kurbo::Shape as _;
        for shape in [
            BannerShape::Rectangle,
            BannerShape::Ellipse,
            BannerShape::Diamond,
        ] {
            let bbox = banner_path(shape, 100.0, 40.0).bounding_box();
            assert!((bbox.width() - 100.0).abs() < 1.0, "{shape:?}");
            assert!((bbox.height() - 40.0).abs() < 1.0, "{shape:?}");
        }
    }

    #[test]
    fn element_transform_maps_local_origin_to_center() {
        let t = element_transform(Point::new(30.0, 40.0), 137.0, crate::geometry::Shear::new(0.3, -0.2));
        let mapped = t * Point::ZERO;
        assert!((mapped.x - 30.0).abs() < 1e-9);
        assert!((mapped.y - 40.0).abs() < 1e-9);
    }
}
