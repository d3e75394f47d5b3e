//! Flatten at base resolution and check the returned element list survives
//! unscaled, including through a JSON round trip of the tagged model.

use std::sync::Arc;

use collage::{
    BannerElement, BannerShape, BitmapStore, Canvas, CanvasElement, ElementId, ImageElement,
    PreparedBitmap, Rgba8, TextShaper, flatten,
};

fn solid_base(width: u32, height: u32, px: [u8; 4]) -> PreparedBitmap {
    PreparedBitmap {
        width,
        height,
        rgba8_premul: Arc::new(px.repeat((width * height) as usize)),
    }
}

fn sample_elements() -> Vec<CanvasElement> {
    vec![
        CanvasElement::Banner(BannerElement {
            id: ElementId(1),
            x: 8.0,
            y: 8.0,
            width: 24.0,
            height: 16.0,
            rotation: 15.0,
            skew_x: 0.1,
            skew_y: 0.0,
            shape: BannerShape::Ellipse,
            background_color: Rgba8::opaque(200, 40, 40),
            shadow: Default::default(),
            stroke: Default::default(),
        }),
        CanvasElement::Image(ImageElement {
            id: ElementId(2),
            x: 30.0,
            y: 20.0,
            width: 20.0,
            height: 10.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            src: "photos/cat.png".to_string(),
            aspect_ratio: 2.0,
            shadow: Default::default(),
            stroke: Default::default(),
        }),
    ]
}

#[test]
fn flatten_at_display_resolution_returns_elements_unchanged() {
    let base = solid_base(64, 48, [0, 0, 0, 255]);
    let elements = sample_elements();
    let mut shaper = TextShaper::new();

    let out = flatten(
        &base,
        &elements,
        &BitmapStore::new(),
        &mut shaper,
        Canvas::new(64, 48),
        None,
    )
    .unwrap();

    assert_eq!(out.flattened.width(), 64);
    assert_eq!(out.flattened.height(), 48);
    assert_eq!(out.elements, elements);
}

#[test]
fn flatten_scales_coordinates_but_not_the_returned_list() {
    // Edited at 32x24, exported at 64x48: both axes scale by 2.
    let base = solid_base(64, 48, [255, 255, 255, 255]);
    let elements = vec![CanvasElement::Banner(BannerElement {
        id: ElementId(1),
        x: 4.0,
        y: 3.0,
        width: 8.0,
        height: 6.0,
        rotation: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
        shape: BannerShape::Rectangle,
        background_color: Rgba8::opaque(0, 128, 0),
        shadow: Default::default(),
        stroke: Default::default(),
    })];
    let mut shaper = TextShaper::new();

    let out = flatten(
        &base,
        &elements,
        &BitmapStore::new(),
        &mut shaper,
        Canvas::new(32, 24),
        None,
    )
    .unwrap();

    // banner footprint doubled to (8,6)..(24,12)
    assert_eq!(out.flattened.get_pixel(16, 9).0, [0, 128, 0, 255]);
    assert_eq!(out.flattened.get_pixel(4, 3).0, [255, 255, 255, 255]);
    assert_eq!(out.elements, elements);
}

#[test]
fn overlay_composites_on_top_of_every_element() {
    let base = solid_base(16, 16, [0, 0, 0, 255]);
    // opaque magenta overlay at full base resolution
    let overlay: Vec<u8> = [255, 0, 255, 255].repeat(16 * 16);
    let mut shaper = TextShaper::new();

    let out = flatten(
        &base,
        &sample_elements(),
        &BitmapStore::new(),
        &mut shaper,
        Canvas::new(16, 16),
        Some(&overlay),
    )
    .unwrap();

    assert_eq!(out.flattened.get_pixel(8, 8).0, [255, 0, 255, 255]);
}

#[test]
fn element_model_round_trips_through_json() {
    let elements = sample_elements();
    let json = serde_json::to_string(&elements).unwrap();
    assert!(json.contains("\"type\":\"banner\""));
    assert!(json.contains("\"type\":\"image\""));

    let back: Vec<CanvasElement> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, elements);
}
