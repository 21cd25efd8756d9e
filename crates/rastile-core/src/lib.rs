//! Tile-binned software triangle rasterizer.
//!
//! The framebuffer is split into 128x128 pixel tiles. Pixels within a tile
//! are stored in Morton (Z-order) swizzled order for cache locality; the
//! tiles themselves are laid out row major. Each tile owns a small circular
//! command buffer so per-tile work can be deferred and batched, in the style
//! of wide-SIMD tiled GPU architectures.

/// Morton-order swizzle addressing within a tile.
pub mod swizzle;

/// 16.8 fixed-point window coordinate helpers.
pub mod fixed_point;

/// Per-tile circular command buffer.
pub mod cmdbuf;

/// Tiled, swizzled framebuffer with per-tile command queues.
pub mod framebuffer;

/// Triangle binning and edge-function rasterization.
pub mod raster;

/// Draw entry points over vertex and index streams.
pub mod draw;

pub use cmdbuf::{TileCmdBuf, CMDBUF_CAPACITY};
pub use draw::{draw, draw_indexed};
pub use framebuffer::{Framebuffer, PixelFormat};
pub use raster::{rasterize_triangle, DrawState, WindowVertex};
pub use swizzle::{PIXELS_PER_TILE, TILE_WIDTH};
