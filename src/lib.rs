//! Collage is a layered composition canvas engine.
//!
//! A session edits text, image, and vector-shape layers over one base image:
//! rich per-character text styling, affine placement (rotation plus X/Y
//! shear), handle-driven manipulation, and a flatten step that re-draws the
//! composition at the base image's native resolution.
//!
//! # Pipeline overview
//!
//! 1. **Model**: serializable [`CanvasElement`] list owned by an [`Editor`]
//! 2. **Interact**: pointer events → hit classification → snapshot-based drags
//! 3. **Render**: CPU rasterization over `vello_cpu`, premultiplied RGBA8
//! 4. **Apply**: geometry rescaled to full resolution, flattened onto the base
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No IO in the renderer**: decoding is front-loaded into [`BitmapStore`].
//! - **Snapshot drags**: every pointer move recomputes from the pointer-down
//!   state, so drags never accumulate rounding error.
#![forbid(unsafe_code)]

mod assets;
mod editor;
mod element;
mod export;
mod foundation;
mod geometry;
mod history;
mod interact;
mod render;
mod style;
mod text;

pub use assets::{
    AssetResolver, BitmapStore, FsResolver, MemoryResolver, PreparedBitmap, decode_bitmap,
    normalize_rel_path,
};
pub use editor::Editor;
pub use element::{
    BannerElement, BannerShape, CanvasElement, ElementId, IdGenerator, ImageElement, Shadow,
    Stroke, TextElement,
};
pub use export::{ExportOutput, flatten, scale_element};
pub use foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8, Vec2};
pub use foundation::error::{CollageError, CollageResult};
pub use geometry::{Shear, rotate_point};
pub use history::EditHistory;
pub use interact::{
    ActionKind, DOUBLE_CLICK_MS, DragAction, HANDLE_HIT_TOLERANCE, InteractionState,
    MIN_DIMENSION, MIN_FONT_SIZE, SKEW_FACTOR, apply_drag, classify_pointer_down,
};
pub use render::{
    CHROME_COLOR, FrameOptions, HANDLE_DRAW_SIZE, HIGHLIGHT_COLOR, ROTATE_KNOB_OFFSET, Renderer,
    SELECTION_DASH, banner_path, element_transform,
};
pub use render::{blur::blur_rgba8_premul, composite::over_in_place};
pub use style::{ColorRange, FontSizeRange, ResolvedStyle, TextAlign, resolve_style_at};
pub use text::{
    ElementMetrics, FixedAdvanceMeasurer, StyleRun, TextMeasurer, TextShaper, WrappedLine,
    char_index_at_point, element_metrics, line_runs, selection_range, text_height, wrap_text,
};
