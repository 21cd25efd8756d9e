//! Triangle binning and rasterization.
//!
//! Vertices arrive in 16.8 fixed-point window coordinates, wound clockwise
//! as seen on the display (counter-clockwise or degenerate triangles draw
//! nothing). The triangle's bounding box selects the overlapped tiles; each
//! tile's coverage is then evaluated with signed-area edge functions sampled
//! at pixel centers and emitted through that tile's command buffer only.
//!
//! The coverage algorithm is this implementation's own choice: integer edge
//! functions with a top-left fill rule, so triangles sharing an edge cover
//! every pixel along it exactly once. Accumulators are i64, which holds the
//! full range of 16.8 cross products exactly.

use crate::fixed_point::{pixel_of, FRAC_BITS, HALF_PIXEL};
use crate::framebuffer::Framebuffer;
use crate::swizzle::{
    bit_deposit, step_swizzled, TILE_WIDTH, TILE_X_SWIZZLE_MASK, TILE_Y_SWIZZLE_MASK,
};

/// One raw 16.8 pixel in edge-function space.
const PIXEL_STEP: i64 = 1 << FRAC_BITS;

/// Rendering state passed explicitly into every draw call: one active fill
/// color at a time, packed in the backbuffer's BGRA layout.
#[derive(Clone, Copy, Debug)]
pub struct DrawState {
    pub color: u32,
}

impl DrawState {
    pub fn new(color: u32) -> Self {
        Self { color }
    }

    /// State from RGBA channel bytes.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            color: pack_color(r, g, b, a),
        }
    }
}

/// Pack RGBA bytes into the backbuffer's 32-bit pixel layout: B in bits
/// 0..8, G in 8..16, R in 16..24, A in 24..32.
pub fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// A vertex position in unsigned 16.8 window coordinates plus depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowVertex {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl WindowVertex {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Vertex from f32 pixel coordinates (saturating 16.8 conversion).
    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: crate::fixed_point::f32_to_16_8(x),
            y: crate::fixed_point::f32_to_16_8(y),
            z: crate::fixed_point::f32_to_16_8(z),
        }
    }
}

/// Twice the signed area of triangle `abc`. Positive for clockwise winding
/// in y-down window coordinates.
#[inline]
fn orient2d(ax: i64, ay: i64, bx: i64, by: i64, cx: i64, cy: i64) -> i64 {
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Edge function for one triangle edge, with the fill-rule bias folded in so
/// coverage is simply `value >= 0`.
#[derive(Clone, Copy)]
struct Edge {
    /// Value at the current sample point (bias included).
    value: i64,
    /// Change per one-pixel step in +x.
    step_x: i64,
    /// Change per one-pixel step in +y.
    step_y: i64,
}

impl Edge {
    /// Set up the edge from `a` to `b`, evaluated at sample point `(sx, sy)`.
    ///
    /// Top-left rule: pixels exactly on a top edge (horizontal, pointing +x
    /// in clockwise order) or a left edge (pointing -y) count as covered;
    /// pixels on other edges do not. The non-top-left bias of -1 excludes
    /// the exact-zero case without affecting any interior sample.
    fn new(ax: i64, ay: i64, bx: i64, by: i64, sx: i64, sy: i64) -> Self {
        let dx = bx - ax;
        let dy = by - ay;
        let top_left = (dy == 0 && dx > 0) || dy < 0;
        let bias = if top_left { 0 } else { -1 };
        Self {
            value: orient2d(ax, ay, bx, by, sx, sy) + bias,
            step_x: -dy * PIXEL_STEP,
            step_y: dx * PIXEL_STEP,
        }
    }
}

/// Sample point (pixel center) of a pixel index, in raw 16.8 units.
#[inline]
fn center(px: u32) -> i64 {
    ((px as i64) << FRAC_BITS) + HALF_PIXEL as i64
}

/// Rasterize one clockwise triangle into the framebuffer.
///
/// Coverage and color writes are deferred through the command buffers of the
/// tiles the triangle overlaps; call [`Framebuffer::resolve`] before reading
/// pixels back. Per-vertex depth is carried per the draw contract but no
/// depth storage exists in the framebuffer, so overlapping writes are
/// last-writer-wins in submission order.
pub fn rasterize_triangle(
    fb: &mut Framebuffer,
    state: &DrawState,
    v0: WindowVertex,
    v1: WindowVertex,
    v2: WindowVertex,
) {
    let (x0, y0) = (v0.x as i64, v0.y as i64);
    let (x1, y1) = (v1.x as i64, v1.y as i64);
    let (x2, y2) = (v2.x as i64, v2.y as i64);

    // Degenerate or counter-clockwise: nothing to draw.
    if orient2d(x0, y0, x1, y1, x2, y2) <= 0 {
        return;
    }

    // Pixel-space bounding box, clamped to the padded surface. Padding
    // pixels are safe to write; they are never observed by pack_row_major.
    let padded_width = fb.width_in_tiles() * TILE_WIDTH;
    let padded_height = fb.height_in_tiles() * TILE_WIDTH;
    let min_px = pixel_of(v0.x.min(v1.x).min(v2.x));
    let min_py = pixel_of(v0.y.min(v1.y).min(v2.y));
    let max_px = pixel_of(v0.x.max(v1.x).max(v2.x)).min(padded_width - 1);
    let max_py = pixel_of(v0.y.max(v1.y).max(v2.y)).min(padded_height - 1);
    if min_px > max_px || min_py > max_py {
        return;
    }

    // Tiles overlapped by the bounding box.
    let tile_x_min = min_px / TILE_WIDTH;
    let tile_y_min = min_py / TILE_WIDTH;
    let tile_x_max = max_px / TILE_WIDTH;
    let tile_y_max = max_py / TILE_WIDTH;

    for tile_y in tile_y_min..=tile_y_max {
        for tile_x in tile_x_min..=tile_x_max {
            // Bounding box clipped to this tile.
            let px_min = min_px.max(tile_x * TILE_WIDTH);
            let py_min = min_py.max(tile_y * TILE_WIDTH);
            let px_max = max_px.min(tile_x * TILE_WIDTH + TILE_WIDTH - 1);
            let py_max = max_py.min(tile_y * TILE_WIDTH + TILE_WIDTH - 1);

            fb.enqueue_set_color(tile_x, tile_y, state.color);

            let (sx, sy) = (center(px_min), center(py_min));
            let mut row = [
                Edge::new(x0, y0, x1, y1, sx, sy),
                Edge::new(x1, y1, x2, y2, sx, sy),
                Edge::new(x2, y2, x0, y0, sx, sy),
            ];

            let mut y_bits = bit_deposit(py_min, TILE_Y_SWIZZLE_MASK);
            for _py in py_min..=py_max {
                let mut w = [row[0].value, row[1].value, row[2].value];

                let mut x_bits = bit_deposit(px_min, TILE_X_SWIZZLE_MASK);
                for _px in px_min..=px_max {
                    if w[0] >= 0 && w[1] >= 0 && w[2] >= 0 {
                        fb.enqueue_pixel(tile_x, tile_y, y_bits | x_bits);
                    }
                    w[0] += row[0].step_x;
                    w[1] += row[1].step_x;
                    w[2] += row[2].step_x;
                    x_bits = step_swizzled(x_bits, TILE_X_SWIZZLE_MASK);
                }

                row[0].value += row[0].step_y;
                row[1].value += row[1].step_y;
                row[2].value += row[2].step_y;
                y_bits = step_swizzled(y_bits, TILE_Y_SWIZZLE_MASK);
            }
        }
    }
}
