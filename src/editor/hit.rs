//! Point-in-rotated-rectangle hit-testing.

use super::layer::{Layer, LayerStack};

/// A position in canvas pixels (y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rotate `point` around `center` by `angle` radians.
pub fn rotate_point(point: Point, center: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Express a canvas point in the layer's local frame: origin at the layer
/// center, axes aligned with the unrotated box.
pub fn to_local(point: Point, layer: &Layer) -> Point {
    let center = layer.center();
    let local = rotate_point(point, center, -layer.rotation);
    Point::new(local.x - center.x, local.y - center.y)
}

/// Whether `point` lies strictly inside the layer's rotated box.
pub fn point_in_layer(point: Point, layer: &Layer) -> bool {
    let local = to_local(point, layer);
    local.x.abs() < layer.width / 2.0 && local.y.abs() < layer.height / 2.0
}

/// The topmost layer containing `point`, if any.
pub fn topmost_hit(stack: &LayerStack, point: Point) -> Option<&Layer> {
    stack.iter_top_down().find(|layer| point_in_layer(point, layer))
}
