//! Draw entry points: decompose vertex streams into triangles.
//!
//! Pure orchestration over [`rasterize_triangle`]. Vertex streams are
//! caller-owned flat arrays of 16.8 fixed-point `(x, y, z)` scalars, three
//! scalars per vertex, three vertices per triangle, processed sequentially
//! in input order.

use crate::framebuffer::Framebuffer;
use crate::raster::{rasterize_triangle, DrawState, WindowVertex};

#[inline]
fn vertex_at(vertices: &[u32], scalar_index: usize) -> WindowVertex {
    WindowVertex::new(
        vertices[scalar_index],
        vertices[scalar_index + 1],
        vertices[scalar_index + 2],
    )
}

/// Draw a linear vertex stream, three vertices per triangle.
///
/// # Panics
/// Panics if the stream is not a whole number of triangles (nine scalars
/// each).
pub fn draw(fb: &mut Framebuffer, state: &DrawState, vertices: &[u32]) {
    assert!(
        vertices.len() % 9 == 0,
        "vertex stream must hold a whole number of triangles"
    );

    for triangle in vertices.chunks_exact(9) {
        rasterize_triangle(
            fb,
            state,
            vertex_at(triangle, 0),
            vertex_at(triangle, 3),
            vertex_at(triangle, 6),
        );
    }
}

/// Draw an indexed vertex stream. Each index addresses a vertex triple, so
/// index `i` reads scalars `i * 3 .. i * 3 + 3`.
///
/// # Panics
/// Panics if the index count is not a multiple of 3 or an index points past
/// the vertex stream.
pub fn draw_indexed(fb: &mut Framebuffer, state: &DrawState, vertices: &[u32], indices: &[u32]) {
    assert!(
        indices.len() % 3 == 0,
        "index count must be a multiple of 3"
    );

    for triangle in indices.chunks_exact(3) {
        rasterize_triangle(
            fb,
            state,
            vertex_at(vertices, triangle[0] as usize * 3),
            vertex_at(vertices, triangle[1] as usize * 3),
            vertex_at(vertices, triangle[2] as usize * 3),
        );
    }
}
