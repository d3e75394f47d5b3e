//! Handle classification and drag application.
//!
//! A drag never mutates incrementally: every pointer move recomputes the
//! target geometry from the snapshot captured at pointer-down, so repeated
//! moves cannot accumulate rounding drift.

use crate::element::{CanvasElement, ElementId};
use crate::foundation::core::Point;
use crate::geometry::rotate_point;
use crate::render::ROTATE_KNOB_OFFSET;
use crate::text::layout::element_metrics;
use crate::text::measure::TextMeasurer;

/// Square tolerance around a handle center, px.
pub const HANDLE_HIT_TOLERANCE: f64 = 10.0;
/// Two pointer-downs on the same element within this window are a double click.
pub const DOUBLE_CLICK_MS: u64 = 300;
/// Skew factor change per local pixel of drag.
pub const SKEW_FACTOR: f64 = 0.005;
/// Resizes floor width and height here to prevent collapsed geometry.
pub const MIN_DIMENSION: f64 = 20.0;
/// Proportional text resize floors the base font size here.
pub const MIN_FONT_SIZE: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Move,
    Rotate,
    ResizeTopLeft,
    ResizeTopRight,
    ResizeBottomLeft,
    ResizeBottomRight,
    SkewX,
    SkewY,
}

impl ActionKind {
    pub fn is_resize(self) -> bool {
        matches!(
            self,
            Self::ResizeTopLeft
                | Self::ResizeTopRight
                | Self::ResizeBottomLeft
                | Self::ResizeBottomRight
        )
    }

    fn touches_left(self) -> bool {
        matches!(self, Self::ResizeTopLeft | Self::ResizeBottomLeft)
    }

    fn touches_right(self) -> bool {
        matches!(self, Self::ResizeTopRight | Self::ResizeBottomRight)
    }

    fn touches_top(self) -> bool {
        matches!(self, Self::ResizeTopLeft | Self::ResizeTopRight)
    }

    fn touches_bottom(self) -> bool {
        matches!(self, Self::ResizeBottomLeft | Self::ResizeBottomRight)
    }
}

/// A drag in progress: the action, its target, and the fixed pointer-down
/// snapshot all geometry is recomputed from.
#[derive(Clone, Debug)]
pub struct DragAction {
    pub kind: ActionKind,
    pub start_pos: Point,
    pub snapshot: CanvasElement,
}

/// The engine's single interaction state value; transitions are driven by
/// the pointer protocol in [`crate::editor::Editor`].
#[derive(Clone, Debug, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragAction),
    /// Character-level selection inside a text element; `anchor` is the
    /// caret where the double click landed.
    SelectingText { element: ElementId, anchor: usize },
}

impl InteractionState {
    pub fn is_selecting_text(&self) -> bool {
        matches!(self, Self::SelectingText { .. })
    }
}

/// Classify a pointer-down against all elements, topmost first.
///
/// Per element the pointer is unrotated into the local frame, then tested
/// against the rotate knob, the four corner handles, the skew midpoints,
/// and finally the body box, in that precedence order. Shear is not undone
/// here: handles live on the unrotated (but sheared-as-drawn) box, matching
/// the chrome.
pub fn classify_pointer_down(
    elements: &[CanvasElement],
    pos: Point,
    measurer: &mut dyn TextMeasurer,
) -> Option<(ActionKind, ElementId)> {
    for el in elements.iter().rev() {
        let metrics = element_metrics(el, measurer);
        let center = metrics.center();
        let unrotated = rotate_point(pos, center, -el.rotation());

        let hw = metrics.width / 2.0;
        let hh = metrics.height / 2.0;
        let lx = unrotated.x - center.x;
        let ly = unrotated.y - center.y;
        let tol = HANDLE_HIT_TOLERANCE;

        if lx.abs() < tol && (ly + hh + ROTATE_KNOB_OFFSET).abs() < tol {
            return Some((ActionKind::Rotate, el.id()));
        }

        if (lx + hw).abs() < tol && (ly + hh).abs() < tol {
            return Some((ActionKind::ResizeTopLeft, el.id()));
        }
        if (lx - hw).abs() < tol && (ly + hh).abs() < tol {
            return Some((ActionKind::ResizeTopRight, el.id()));
        }
        if (lx + hw).abs() < tol && (ly - hh).abs() < tol {
            return Some((ActionKind::ResizeBottomLeft, el.id()));
        }
        if (lx - hw).abs() < tol && (ly - hh).abs() < tol {
            return Some((ActionKind::ResizeBottomRight, el.id()));
        }

        if lx.abs() < tol && ((ly + hh).abs() < tol || (ly - hh).abs() < tol) {
            return Some((ActionKind::SkewY, el.id()));
        }
        if ly.abs() < tol && ((lx + hw).abs() < tol || (lx - hw).abs() < tol) {
            return Some((ActionKind::SkewX, el.id()));
        }

        if unrotated.x >= center.x - hw
            && unrotated.x <= center.x + hw
            && unrotated.y >= center.y - hh
            && unrotated.y <= center.y + hh
        {
            return Some((ActionKind::Move, el.id()));
        }
    }
    None
}

/// Produce the element as it should be after dragging to `pos`, computed
/// entirely from the pointer-down snapshot.
pub fn apply_drag(
    action: &DragAction,
    pos: Point,
    shift: bool,
    measurer: &mut dyn TextMeasurer,
) -> CanvasElement {
    let snapshot = &action.snapshot;
    let dx = pos.x - action.start_pos.x;
    let dy = pos.y - action.start_pos.y;

    let (sin, cos) = snapshot.rotation().to_radians().sin_cos();
    let local_dx = dx * cos + dy * sin;
    let local_dy = -dx * sin + dy * cos;

    let mut el = snapshot.clone();
    match action.kind {
        ActionKind::Move => {
            let origin = snapshot.origin();
            el.set_origin(origin.x + dx, origin.y + dy);
        }
        ActionKind::Rotate => {
            let center = element_metrics(snapshot, measurer).center();
            let start_angle =
                (action.start_pos.y - center.y).atan2(action.start_pos.x - center.x);
            let current_angle = (pos.y - center.y).atan2(pos.x - center.x);
            let delta = (current_angle - start_angle).to_degrees();
            el.set_rotation((snapshot.rotation() + delta).rem_euclid(360.0));
        }
        ActionKind::SkewX => {
            let mut skew = snapshot.skew();
            skew.x += local_dx * SKEW_FACTOR;
            el.set_skew(skew);
        }
        ActionKind::SkewY => {
            let mut skew = snapshot.skew();
            skew.y -= local_dy * SKEW_FACTOR;
            el.set_skew(skew);
        }
        ActionKind::ResizeTopLeft
        | ActionKind::ResizeTopRight
        | ActionKind::ResizeBottomLeft
        | ActionKind::ResizeBottomRight => {
            el = resize(action, action.kind, pos, shift, local_dx, local_dy, measurer);
        }
    }
    el
}

fn resize(
    action: &DragAction,
    kind: ActionKind,
    pos: Point,
    shift: bool,
    local_dx: f64,
    local_dy: f64,
    measurer: &mut dyn TextMeasurer,
) -> CanvasElement {
    match &action.snapshot {
        CanvasElement::Text(t) => {
            CanvasElement::Text(resize_text(action, t, kind, pos, shift, local_dx, measurer))
        }
        CanvasElement::Image(i) => {
            let box_ = resize_box(
                i.x,
                i.y,
                i.width,
                i.height,
                i.rotation,
                kind,
                local_dx,
                local_dy,
                // Images keep their intrinsic aspect on every resize.
                Some(i.aspect_ratio),
            );
            let mut out = i.clone();
            (out.x, out.y, out.width, out.height) = box_;
            CanvasElement::Image(out)
        }
        CanvasElement::Banner(b) => {
            let box_ = resize_box(
                b.x,
                b.y,
                b.width,
                b.height,
                b.rotation,
                kind,
                local_dx,
                local_dy,
                // Banners lock aspect only while shift is held.
                shift.then_some(b.width / b.height),
            );
            let mut out = b.clone();
            (out.x, out.y, out.width, out.height) = box_;
            CanvasElement::Banner(out)
        }
    }
}

fn resize_text(
    action: &DragAction,
    snapshot: &crate::element::TextElement,
    kind: ActionKind,
    pos: Point,
    shift: bool,
    local_dx: f64,
    measurer: &mut dyn TextMeasurer,
) -> crate::element::TextElement {
    let initial_metrics = element_metrics(&action.snapshot, measurer);
    let center = initial_metrics.center();
    let mut el = snapshot.clone();

    if shift {
        // Proportional: scale width and base font by the pointer's distance
        // ratio from the center.
        let initial_dist = action.start_pos.distance(center);
        let current_dist = pos.distance(center);
        if initial_dist == 0.0 {
            return el;
        }
        let scale = current_dist / initial_dist;
        el.width = (snapshot.width * scale).max(MIN_DIMENSION);
        el.font_size = (snapshot.font_size * scale).max(MIN_FONT_SIZE);
        let new_height = crate::text::layout::text_height(&el, measurer);
        el.x = center.x - el.width / 2.0;
        el.y = center.y - new_height / 2.0;
    } else {
        // Freeform: only width changes; the opposite edge stays fixed by
        // shifting the center along the rotated x axis.
        let mut new_width = snapshot.width;
        if kind.touches_right() {
            new_width = (snapshot.width + local_dx).max(MIN_DIMENSION);
        }
        if kind.touches_left() {
            new_width = (snapshot.width - local_dx).max(MIN_DIMENSION);
        }

        let dw = new_width - snapshot.width;
        let mut shift_x = 0.0;
        if kind.touches_right() {
            shift_x += dw / 2.0;
        }
        if kind.touches_left() {
            shift_x -= dw / 2.0;
        }

        let (sin, cos) = snapshot.rotation.to_radians().sin_cos();
        let new_center = Point::new(center.x + shift_x * cos, center.y + shift_x * sin);

        el.width = new_width;
        el.x = new_center.x - new_width / 2.0;
        el.y = new_center.y - initial_metrics.height / 2.0;
    }
    el
}

/// Shared box resize: apply the per-edge deltas, optionally lock the
/// aspect, then keep the opposite corner anchored by shifting the center
/// through the rotation matrix. Returns `(x, y, width, height)`.
#[allow(clippy::too_many_arguments)]
fn resize_box(
    init_x: f64,
    init_y: f64,
    init_w: f64,
    init_h: f64,
    rotation_deg: f64,
    kind: ActionKind,
    local_dx: f64,
    local_dy: f64,
    lock_aspect: Option<f64>,
) -> (f64, f64, f64, f64) {
    let mut new_w = init_w;
    let mut new_h = init_h;
    if kind.touches_right() {
        new_w = (init_w + local_dx).max(MIN_DIMENSION);
    }
    if kind.touches_left() {
        new_w = (init_w - local_dx).max(MIN_DIMENSION);
    }
    if kind.touches_bottom() {
        new_h = (init_h + local_dy).max(MIN_DIMENSION);
    }
    if kind.touches_top() {
        new_h = (init_h - local_dy).max(MIN_DIMENSION);
    }

    if let Some(ratio) = lock_aspect {
        if kind.touches_left() || kind.touches_right() {
            new_h = new_w / ratio;
        } else {
            new_w = new_h * ratio;
        }
    }

    let dw = new_w - init_w;
    let dh = new_h - init_h;
    let mut shift_x = 0.0;
    let mut shift_y = 0.0;
    if kind.touches_right() {
        shift_x += dw / 2.0;
    }
    if kind.touches_left() {
        shift_x -= dw / 2.0;
    }
    if kind.touches_bottom() {
        shift_y += dh / 2.0;
    }
    if kind.touches_top() {
        shift_y -= dh / 2.0;
    }

    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let old_center = Point::new(init_x + init_w / 2.0, init_y + init_h / 2.0);
    let new_center = Point::new(
        old_center.x + shift_x * cos - shift_y * sin,
        old_center.y + shift_x * sin + shift_y * cos,
    );

    (
        new_center.x - new_w / 2.0,
        new_center.y - new_h / 2.0,
        new_w,
        new_h,
    )
}
