//! CPU render smoke tests over a synthetic base image. Text is exercised
//! elsewhere; these frames stay font-free so they are fully deterministic.

use std::sync::Arc;

use collage::{
    BannerElement, BannerShape, BitmapStore, CanvasElement, ElementId, FrameOptions,
    PreparedBitmap, Renderer, Rgba8, TextShaper,
};

fn solid_base(width: u32, height: u32, px: [u8; 4]) -> PreparedBitmap {
    PreparedBitmap {
        width,
        height,
        rgba8_premul: Arc::new(px.repeat((width * height) as usize)),
    }
}

fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}

fn red_banner() -> CanvasElement {
    CanvasElement::Banner(BannerElement {
        id: ElementId(1),
        x: 16.0,
        y: 12.0,
        width: 32.0,
        height: 24.0,
        rotation: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
        shape: BannerShape::Rectangle,
        background_color: Rgba8::opaque(255, 0, 0),
        shadow: Default::default(),
        stroke: Default::default(),
    })
}

#[test]
fn banner_pixels_land_over_the_base_image() {
    let base = solid_base(64, 48, [0, 0, 255, 255]);
    let mut renderer = Renderer::new(64, 48).unwrap();
    let mut shaper = TextShaper::new();

    renderer
        .render(
            Some(&base),
            &[red_banner()],
            &BitmapStore::new(),
            &mut shaper,
            &FrameOptions::default(),
        )
        .unwrap();

    let data = renderer.data();
    // banner interior
    assert_eq!(pixel(data, 64, 32, 24), [255, 0, 0, 255]);
    // base shows through outside the banner
    assert_eq!(pixel(data, 64, 2, 2), [0, 0, 255, 255]);
    assert_eq!(pixel(data, 64, 62, 46), [0, 0, 255, 255]);
}

#[test]
fn overlapping_elements_keep_lower_layers_visible() {
    let base = solid_base(64, 48, [0, 0, 255, 255]);
    let mut green = red_banner();
    if let CanvasElement::Banner(b) = &mut green {
        b.id = ElementId(2);
        b.x = 28.0;
        b.y = 18.0;
        b.width = 16.0;
        b.height = 12.0;
        b.background_color = Rgba8::opaque(0, 255, 0);
    }

    let mut renderer = Renderer::new(64, 48).unwrap();
    let mut shaper = TextShaper::new();
    renderer
        .render(
            Some(&base),
            &[red_banner(), green],
            &BitmapStore::new(),
            &mut shaper,
            &FrameOptions::default(),
        )
        .unwrap();

    let data = renderer.data();
    // topmost banner where the two overlap
    assert_eq!(pixel(data, 64, 32, 24), [0, 255, 0, 255]);
    // the lower banner stays visible outside the topmost one
    assert_eq!(pixel(data, 64, 20, 24), [255, 0, 0, 255]);
    // and the base stays visible outside every element
    assert_eq!(pixel(data, 64, 2, 2), [0, 0, 255, 255]);
}

#[test]
fn renders_are_deterministic() {
    let base = solid_base(64, 48, [10, 20, 30, 255]);
    let elements = [red_banner()];
    let mut shaper = TextShaper::new();

    let mut first = Renderer::new(64, 48).unwrap();
    first
        .render(
            Some(&base),
            &elements,
            &BitmapStore::new(),
            &mut shaper,
            &FrameOptions::default(),
        )
        .unwrap();
    let a = first.data().to_vec();

    let mut second = Renderer::new(64, 48).unwrap();
    second
        .render(
            Some(&base),
            &elements,
            &BitmapStore::new(),
            &mut shaper,
            &FrameOptions::default(),
        )
        .unwrap();

    assert_eq!(a, second.data());
}

#[test]
fn shadowed_banner_darkens_pixels_beyond_its_offset_edge() {
    let base = solid_base(64, 48, [255, 255, 255, 255]);
    let mut el = red_banner();
    if let CanvasElement::Banner(b) = &mut el {
        b.shadow.enabled = true;
        b.shadow.blur = 4.0;
        b.shadow.offset_x = 6.0;
        b.shadow.offset_y = 6.0;
    }

    let mut renderer = Renderer::new(64, 48).unwrap();
    let mut shaper = TextShaper::new();
    renderer
        .render(
            Some(&base),
            &[el],
            &BitmapStore::new(),
            &mut shaper,
            &FrameOptions::default(),
        )
        .unwrap();

    // Just right of the banner's right edge, inside the shadow offset band.
    let px = pixel(renderer.data(), 64, 51, 30);
    assert!(px[0] < 255, "shadow should darken the base, got {px:?}");
}

#[test]
fn unhydrated_image_element_is_skipped_without_error() {
    use collage::ImageElement;
    let base = solid_base(32, 32, [0, 255, 0, 255]);
    let el = CanvasElement::Image(ImageElement {
        id: ElementId(9),
        x: 4.0,
        y: 4.0,
        width: 16.0,
        height: 16.0,
        rotation: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
        src: "missing.png".to_string(),
        aspect_ratio: 1.0,
        shadow: Default::default(),
        stroke: Default::default(),
    });

    let mut renderer = Renderer::new(32, 32).unwrap();
    let mut shaper = TextShaper::new();
    renderer
        .render(
            Some(&base),
            &[el],
            &BitmapStore::new(),
            &mut shaper,
            &FrameOptions::default(),
        )
        .unwrap();

    // nothing drawn; base untouched everywhere
    assert_eq!(pixel(renderer.data(), 32, 10, 10), [0, 255, 0, 255]);
}
