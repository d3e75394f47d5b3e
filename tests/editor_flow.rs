//! End to end editor scenarios: hydration on load, the pointer protocol, and
//! export through `apply`.

use std::io::Cursor;
use std::sync::Arc;

use collage::{
    BannerElement, BannerShape, Canvas, CanvasElement, Editor, ElementId, ImageElement,
    MemoryResolver, Point, PreparedBitmap, Rgba8,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(px));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn banner_at(id: u64, x: f64, y: f64) -> CanvasElement {
    CanvasElement::Banner(BannerElement {
        id: ElementId(id),
        x,
        y,
        width: 200.0,
        height: 100.0,
        rotation: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
        shape: BannerShape::Rectangle,
        background_color: Rgba8::white(),
        shadow: Default::default(),
        stroke: Default::default(),
    })
}

#[test]
fn load_hydrates_images_and_keeps_fresh_ids_unique() {
    init_tracing();
    let mut editor = Editor::new(Canvas::new(800, 600)).unwrap();

    let mut resolver = MemoryResolver::default();
    resolver.insert("photos/cat.png", png_bytes(4, 2, [120, 80, 40, 255]));

    editor.load_elements(
        vec![
            banner_at(7, 100.0, 100.0),
            CanvasElement::Image(ImageElement {
                id: ElementId(12),
                x: 400.0,
                y: 400.0,
                width: 50.0,
                height: 25.0,
                rotation: 0.0,
                skew_x: 0.0,
                skew_y: 0.0,
                src: "photos/cat.png".to_string(),
                aspect_ratio: 2.0,
                shadow: Default::default(),
                stroke: Default::default(),
            }),
        ],
        &resolver,
    );

    assert_eq!(editor.elements().len(), 2);

    // new elements never reuse a loaded id
    let fresh = editor.add_banner(BannerShape::Diamond);
    assert!(fresh.0 > 12, "fresh id {} collides with loaded ids", fresh.0);
}

#[test]
fn reload_reusing_an_id_picks_up_the_new_image_source() {
    init_tracing();
    let mut editor = Editor::new(Canvas::new(32, 32)).unwrap();

    let mut resolver = MemoryResolver::default();
    resolver.insert("red.png", png_bytes(2, 2, [255, 0, 0, 255]));
    resolver.insert("green.png", png_bytes(2, 2, [0, 255, 0, 255]));

    let full_canvas_image = |src: &str| {
        CanvasElement::Image(ImageElement {
            id: ElementId(12),
            x: 0.0,
            y: 0.0,
            width: 32.0,
            height: 32.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            src: src.to_string(),
            aspect_ratio: 1.0,
            shadow: Default::default(),
            stroke: Default::default(),
        })
    };

    editor.load_elements(vec![full_canvas_image("red.png")], &resolver);
    // A second session reuses the same element id with a different source.
    editor.load_elements(vec![full_canvas_image("green.png")], &resolver);

    let frame = editor.render().unwrap();
    let i = (16 * 32 + 16) * 4;
    assert_eq!(&frame[i..i + 4], &[0, 255, 0, 255]);
}

#[test]
fn drag_on_the_body_moves_the_element() {
    let mut editor = Editor::new(Canvas::new(800, 600)).unwrap();
    editor.load_elements(vec![banner_at(1, 100.0, 100.0)], &MemoryResolver::default());

    // press at the center, well clear of every handle
    editor.pointer_down(Point::new(200.0, 150.0), 0);
    assert_eq!(editor.selected_id(), Some(ElementId(1)));

    editor.pointer_move(Point::new(230.0, 170.0), false);
    editor.pointer_up();

    match &editor.elements()[0] {
        CanvasElement::Banner(b) => {
            assert_eq!((b.x, b.y), (130.0, 120.0));
        }
        other => panic!("unexpected element {other:?}"),
    }
}

#[test]
fn pointer_down_on_empty_canvas_deselects() {
    let mut editor = Editor::new(Canvas::new(800, 600)).unwrap();
    editor.load_elements(vec![banner_at(1, 100.0, 100.0)], &MemoryResolver::default());

    editor.pointer_down(Point::new(200.0, 150.0), 0);
    editor.pointer_up();
    assert!(editor.selected_id().is_some());

    editor.pointer_down(Point::new(700.0, 20.0), 100);
    assert_eq!(editor.selected_id(), None);
}

#[test]
fn apply_flattens_at_base_resolution_with_scaled_placement() {
    // Edited at 80x60, base photo is 160x120: everything scales by 2.
    let mut editor = Editor::new(Canvas::new(80, 60)).unwrap();
    editor.set_base(PreparedBitmap {
        width: 160,
        height: 120,
        rgba8_premul: Arc::new([0, 0, 255, 255].repeat(160 * 120)),
    });

    let mut red = banner_at(1, 10.0, 10.0);
    if let CanvasElement::Banner(b) = &mut red {
        b.width = 20.0;
        b.height = 10.0;
        b.background_color = Rgba8::opaque(255, 0, 0);
    }
    editor.load_elements(vec![red], &MemoryResolver::default());

    let out = editor.apply(None).unwrap();
    assert_eq!(out.flattened.width(), 160);
    assert_eq!(out.flattened.height(), 120);
    // banner footprint doubled to (20,20)..(60,40)
    assert_eq!(out.flattened.get_pixel(40, 30).0, [255, 0, 0, 255]);
    assert_eq!(out.flattened.get_pixel(5, 5).0, [0, 0, 255, 255]);
    // the element list comes back in edit-space coordinates
    assert_eq!(out.elements, editor.elements());
}
