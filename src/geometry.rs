//! Geometry kernel shared by rendering, hit-testing, and manipulation.
//!
//! Elements are positioned with an affine chain: translate to center, rotate,
//! then shear. Hit-testing runs the chain backwards, so rotation and shear
//! both need exact inverses here.

use crate::foundation::core::{Affine, Point};

/// Rotate `point` around `center` by `angle_deg` degrees (counter-clockwise in
/// a y-down frame matches the on-screen clockwise convention used throughout).
pub fn rotate_point(point: Point, center: Point, angle_deg: f64) -> Point {
    let angle = angle_deg.to_radians();
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Independent X/Y shear factors (linear coefficients, not angles).
///
/// Applied as the 2x2 matrix `[[1, x], [y, 1]]`: the sheared image of a local
/// point `(lx, ly)` is `(lx + x*ly, y*lx + ly)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shear {
    pub x: f64,
    pub y: f64,
}

impl Shear {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_identity(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Determinant of the shear matrix; zero means the shear collapses the
    /// plane and cannot be inverted.
    pub fn det(self) -> f64 {
        1.0 - self.x * self.y
    }

    /// The shear as an affine map over local (center-origin) coordinates.
    ///
    /// kurbo coefficient order is `[a, b, c, d, e, f]` with
    /// `x' = a*x + c*y + e`, matching `[[1, x], [y, 1]]` column by column.
    pub fn to_affine(self) -> Affine {
        Affine::new([1.0, self.y, self.x, 1.0, 0.0, 0.0])
    }

    /// Map a local point through the shear.
    pub fn apply(self, local: Point) -> Point {
        Point::new(local.x + self.x * local.y, self.y * local.x + local.y)
    }

    /// Invert the shear for a local point, or `None` when the matrix is
    /// singular (`det == 0`). Callers treat `None` as "no hit".
    pub fn invert(self, sheared: Point) -> Option<Point> {
        let det = self.det();
        if det == 0.0 {
            return None;
        }
        Some(Point::new(
            (sheared.x - self.x * sheared.y) / det,
            (-self.y * sheared.x + sheared.y) / det,
        ))
    }
}
