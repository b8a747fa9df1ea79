//! Immediate-mode rasterizer for the editor state.
//!
//! Draw order: the base image stretched over the whole canvas, then every
//! layer bottom to top. Each layer is inverse-mapped into its rotated box and
//! blended source-over with bilinear sampling. The selected layer gets a
//! stroked outline drawn right after its own pixels, so layers above it still
//! cover the outline.

use super::controller::Editor;
use super::hit::{Point, rotate_point, to_local};
use super::layer::Layer;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Outline width of the selection highlight, centered on the box edge.
pub const SELECTION_LINE_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_selection: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_selection: true,
        }
    }
}

impl RenderOptions {
    /// Options for exported output: no selection highlight.
    pub fn export() -> Self {
        Self {
            show_selection: false,
        }
    }
}

/// Render the editor to a new raster. `None` without a base image.
pub fn render(editor: &Editor, options: RenderOptions) -> Option<RgbaImage> {
    let base = editor.base()?;
    let canvas = editor.canvas()?;

    let mut surface = if base.image.dimensions() == (canvas.width, canvas.height) {
        (*base.image).clone()
    } else {
        imageops::resize(&*base.image, canvas.width, canvas.height, FilterType::Triangle)
    };

    let selected = editor.selected().filter(|_| options.show_selection);
    let color = editor.settings().selection_color;
    for layer in editor.layers().iter() {
        draw_layer(&mut surface, layer);
        if selected == Some(&layer.id) {
            stroke_layer(&mut surface, layer, color, SELECTION_LINE_WIDTH);
        }
    }
    Some(surface)
}

/// Pixel-space bounding box of a layer's rotated box grown by `margin`,
/// clipped to the surface. Returns `(x0, y0, x1, y1)` with exclusive ends.
fn clipped_bounds(surface: &RgbaImage, layer: &Layer, margin: f64) -> Option<(u32, u32, u32, u32)> {
    let center = layer.center();
    let hw = layer.width / 2.0 + margin;
    let hh = layer.height / 2.0 + margin;
    let corners = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
        .map(|(dx, dy)| rotate_point(Point::new(center.x + dx, center.y + dy), center, layer.rotation));

    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let (w, h) = (surface.width() as f64, surface.height() as f64);
    let x0 = min_x.floor().clamp(0.0, w) as u32;
    let y0 = min_y.floor().clamp(0.0, h) as u32;
    let x1 = max_x.ceil().clamp(0.0, w) as u32;
    let y1 = max_y.ceil().clamp(0.0, h) as u32;
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

fn draw_layer(surface: &mut RgbaImage, layer: &Layer) {
    if layer.width <= 0.0 || layer.height <= 0.0 || layer.image.width() == 0 || layer.image.height() == 0 {
        return;
    }
    let Some((x0, y0, x1, y1)) = clipped_bounds(surface, layer, 0.0) else {
        return;
    };
    let (hw, hh) = (layer.width / 2.0, layer.height / 2.0);
    let sx = layer.image.width() as f64 / layer.width;
    let sy = layer.image.height() as f64 / layer.height;

    for py in y0..y1 {
        for px in x0..x1 {
            let local = to_local(Point::new(px as f64 + 0.5, py as f64 + 0.5), layer);
            if local.x.abs() > hw || local.y.abs() > hh {
                continue;
            }
            let u = (local.x + hw) * sx;
            let v = (local.y + hh) * sy;
            let src = sample_bilinear(&layer.image, u, v);
            blend_over(surface.get_pixel_mut(px, py), src);
        }
    }
}

fn stroke_layer(surface: &mut RgbaImage, layer: &Layer, color: Rgba<u8>, line_width: f64) {
    let half = line_width / 2.0;
    let Some((x0, y0, x1, y1)) = clipped_bounds(surface, layer, half + 1.0) else {
        return;
    };
    let (hw, hh) = (layer.width / 2.0, layer.height / 2.0);
    let src = premultiply(color);

    for py in y0..y1 {
        for px in x0..x1 {
            let local = to_local(Point::new(px as f64 + 0.5, py as f64 + 0.5), layer);
            let (ax, ay) = (local.x.abs(), local.y.abs());
            let outer = ax <= hw + half && ay <= hh + half;
            let inner = ax < hw - half && ay < hh - half;
            if outer && !inner {
                blend_over(surface.get_pixel_mut(px, py), src);
            }
        }
    }
}

/// Premultiplied RGBA in `0.0..=1.0`.
type Premul = [f64; 4];

fn premultiply(p: Rgba<u8>) -> Premul {
    let a = p[3] as f64 / 255.0;
    [
        p[0] as f64 / 255.0 * a,
        p[1] as f64 / 255.0 * a,
        p[2] as f64 / 255.0 * a,
        a,
    ]
}

/// Sample at continuous image coordinates (pixel centers at `n + 0.5`),
/// clamping to the edge. Interpolates in premultiplied space.
fn sample_bilinear(img: &RgbaImage, u: f64, v: f64) -> Premul {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;
    let fx = u - 0.5;
    let fy = v - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let at = |x: f64, y: f64| -> Premul {
        let xi = (x as i64).clamp(0, max_x) as u32;
        let yi = (y as i64).clamp(0, max_y) as u32;
        premultiply(*img.get_pixel(xi, yi))
    };
    let p00 = at(x0, y0);
    let p10 = at(x0 + 1.0, y0);
    let p01 = at(x0, y0 + 1.0);
    let p11 = at(x0 + 1.0, y0 + 1.0);

    let mut out = [0.0; 4];
    for c in 0..4 {
        let top = p00[c] * (1.0 - tx) + p10[c] * tx;
        let bottom = p01[c] * (1.0 - tx) + p11[c] * tx;
        out[c] = top * (1.0 - ty) + bottom * ty;
    }
    out
}

/// Source-over compositing of a premultiplied source onto a straight-alpha pixel.
fn blend_over(dst: &mut Rgba<u8>, src: Premul) {
    let sa = src[3];
    if sa <= 0.0 {
        return;
    }
    let d = premultiply(*dst);
    let inv = 1.0 - sa;
    let out_a = sa + d[3] * inv;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let premul = src[c] + d[c] * inv;
        let straight = if out_a > 0.0 { premul / out_a } else { 0.0 };
        out[c] = to_byte(straight);
    }
    out[3] = to_byte(out_a);
    *dst = Rgba(out);
}

fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
