//! Tiled, swizzled framebuffer.
//!
//! The backbuffer is one contiguous allocation of packed 32-bit pixels,
//! organized as a row-major grid of 128x128 tiles with Morton-swizzled
//! pixels inside each tile. The requested dimensions are padded up to whole
//! tiles so the rasterizer never needs per-pixel bounds checks once a
//! triangle has been binned to a tile. One circular command buffer per tile
//! defers per-tile work until flush or resolve time.

use crate::cmdbuf::{self, TileCmdBuf, CMDBUF_CAPACITY};
use crate::fixed_point::MAX_DIMENSION;
use crate::swizzle::{
    bit_deposit, step_swizzled, swizzle_offset, PIXELS_PER_TILE, TILE_WIDTH,
    TILE_X_SWIZZLE_MASK, TILE_Y_SWIZZLE_MASK,
};

/// Output pixel formats for [`Framebuffer::pack_row_major`].
///
/// Both are byte-order permutations of the packed 32-bit pixel, which stores
/// B in bits 0..8, G in 8..16, R in 16..24 and A in 24..32.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    R8G8B8A8Unorm,
    B8G8R8A8Unorm,
}

/// A tiled framebuffer with per-tile deferred command queues.
///
/// Exclusively owns its backbuffer and command pool for its whole lifetime;
/// dropping the framebuffer releases everything.
pub struct Framebuffer {
    backbuffer: Vec<u32>,
    cmd_pool: Vec<u32>,
    cmdbufs: Vec<TileCmdBuf>,

    width_in_pixels: u32,
    height_in_pixels: u32,
    width_in_tiles: u32,
    height_in_tiles: u32,

    /// padded width * tile width: pixels covered by one row of tiles.
    pixels_per_row_of_tiles: u32,
    /// pixels_per_row_of_tiles * number of tile rows: total backing pixels.
    pixels_per_slice: u32,
}

impl Framebuffer {
    /// Allocate a framebuffer for the given logical dimensions.
    ///
    /// The backing store is padded up to whole tiles in each dimension and
    /// cleared to transparent black; every tile's command buffer starts
    /// empty.
    ///
    /// # Panics
    /// Panics if either dimension is zero or reaches 16384, the bound that
    /// keeps downstream fixed-point edge arithmetic exact.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "framebuffer dimensions must be nonzero");
        assert!(
            width < MAX_DIMENSION && height < MAX_DIMENSION,
            "framebuffer dimensions must be below {MAX_DIMENSION}"
        );

        let padded_width = (width + (TILE_WIDTH - 1)) & !(TILE_WIDTH - 1);
        let padded_height = (height + (TILE_WIDTH - 1)) & !(TILE_WIDTH - 1);
        let width_in_tiles = padded_width / TILE_WIDTH;
        let height_in_tiles = padded_height / TILE_WIDTH;
        let total_tiles = (width_in_tiles * height_in_tiles) as usize;

        let pixels_per_row_of_tiles = padded_width * TILE_WIDTH;
        let pixels_per_slice = height_in_tiles * pixels_per_row_of_tiles;

        log::debug!(
            "framebuffer {width}x{height}: padded {padded_width}x{padded_height}, \
             {width_in_tiles}x{height_in_tiles} tiles"
        );

        Self {
            backbuffer: vec![0; pixels_per_slice as usize],
            cmd_pool: vec![0; total_tiles * CMDBUF_CAPACITY],
            cmdbufs: vec![TileCmdBuf::new(); total_tiles],
            width_in_pixels: width,
            height_in_pixels: height,
            width_in_tiles,
            height_in_tiles,
            pixels_per_row_of_tiles,
            pixels_per_slice,
        }
    }

    /// Logical width in pixels, as requested by the caller.
    pub fn width(&self) -> u32 {
        self.width_in_pixels
    }

    /// Logical height in pixels, as requested by the caller.
    pub fn height(&self) -> u32 {
        self.height_in_pixels
    }

    /// Padded width in whole tiles.
    pub fn width_in_tiles(&self) -> u32 {
        self.width_in_tiles
    }

    /// Padded height in whole tiles.
    pub fn height_in_tiles(&self) -> u32 {
        self.height_in_tiles
    }

    /// Pixels covered by one row of tiles.
    pub fn pixels_per_row_of_tiles(&self) -> u32 {
        self.pixels_per_row_of_tiles
    }

    /// Total pixels in the padded backing store.
    pub fn pixels_per_slice(&self) -> u32 {
        self.pixels_per_slice
    }

    /// The swizzled backing store.
    pub fn backbuffer(&self) -> &[u32] {
        &self.backbuffer
    }

    /// Mutable access to the swizzled backing store.
    pub fn backbuffer_mut(&mut self) -> &mut [u32] {
        &mut self.backbuffer
    }

    /// Linear tile index of a tile coordinate.
    #[inline]
    pub fn tile_index(&self, tile_x: u32, tile_y: u32) -> usize {
        debug_assert!(tile_x < self.width_in_tiles && tile_y < self.height_in_tiles);
        (tile_y * self.width_in_tiles + tile_x) as usize
    }

    /// Backbuffer offset of a tile's first pixel.
    #[inline]
    pub fn tile_base(&self, tile_x: u32, tile_y: u32) -> usize {
        (tile_y * self.pixels_per_row_of_tiles + tile_x * PIXELS_PER_TILE) as usize
    }

    /// Queue a color change on one tile's command buffer.
    pub fn enqueue_set_color(&mut self, tile_x: u32, tile_y: u32, color: u32) {
        let tile = self.tile_index(tile_x, tile_y);
        let base = self.tile_base(tile_x, tile_y);
        let slab = &mut self.cmd_pool[tile * CMDBUF_CAPACITY..][..CMDBUF_CAPACITY];
        let pixels = &mut self.backbuffer[base..][..PIXELS_PER_TILE as usize];
        self.cmdbufs[tile].push_all(slab, pixels, &[cmdbuf::encode_set_color(), color]);
    }

    /// Queue a pixel write (at a swizzled within-tile offset) on one tile's
    /// command buffer. Flushes the tile first if the buffer is full.
    pub fn enqueue_pixel(&mut self, tile_x: u32, tile_y: u32, offset: u32) {
        let tile = self.tile_index(tile_x, tile_y);
        let base = self.tile_base(tile_x, tile_y);
        let slab = &mut self.cmd_pool[tile * CMDBUF_CAPACITY..][..CMDBUF_CAPACITY];
        let pixels = &mut self.backbuffer[base..][..PIXELS_PER_TILE as usize];
        self.cmdbufs[tile].push(slab, pixels, cmdbuf::encode_pixel(offset));
    }

    /// Drain one tile's command buffer into its pixels.
    pub fn flush_tile(&mut self, tile_x: u32, tile_y: u32) {
        let tile = self.tile_index(tile_x, tile_y);
        let base = self.tile_base(tile_x, tile_y);
        let slab = &self.cmd_pool[tile * CMDBUF_CAPACITY..][..CMDBUF_CAPACITY];
        let pixels = &mut self.backbuffer[base..][..PIXELS_PER_TILE as usize];
        self.cmdbufs[tile].flush(slab, pixels);
    }

    /// Command buffer state of one tile, for inspection.
    pub fn tile_cmdbuf(&self, tile_x: u32, tile_y: u32) -> &TileCmdBuf {
        &self.cmdbufs[self.tile_index(tile_x, tile_y)]
    }

    /// Finalize all deferred per-tile work so subsequent reads observe final
    /// pixel values. Must be called before [`Framebuffer::pack_row_major`].
    pub fn resolve(&mut self) {
        for tile_y in 0..self.height_in_tiles {
            for tile_x in 0..self.width_in_tiles {
                self.flush_tile(tile_x, tile_y);
            }
        }
    }

    /// Convert a rectangle of the swizzled backbuffer into a tightly packed
    /// byte buffer in the requested format.
    ///
    /// The traversal is tile-outer, pixel-inner: each covered tile's overlap
    /// with the rectangle is emitted as a block of row-major pixels, with the
    /// swizzled source offsets advanced incrementally per pixel. Source reads
    /// therefore stay cache coherent however ragged the rectangle is
    /// relative to tile boundaries.
    ///
    /// # Panics
    /// Panics if the rectangle leaves the logical (unpadded) bounds or if
    /// `dst` is smaller than `width * height * 4` bytes.
    pub fn pack_row_major(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
        dst: &mut [u8],
    ) {
        assert!(x < self.width_in_pixels && y < self.height_in_pixels);
        assert!(width <= self.width_in_pixels && height <= self.height_in_pixels);
        assert!(x + width <= self.width_in_pixels);
        assert!(y + height <= self.height_in_pixels);
        assert!(dst.len() >= (width * height * 4) as usize, "destination too small");

        let topleft_tile_x = x / TILE_WIDTH;
        let topleft_tile_y = y / TILE_WIDTH;
        let bottomright_tile_x = (x + width - 1) / TILE_WIDTH;
        let bottomright_tile_y = (y + height - 1) / TILE_WIDTH;

        let mut dst_i = 0usize;
        let mut tile_row_start =
            (topleft_tile_y * self.pixels_per_row_of_tiles + topleft_tile_x * PIXELS_PER_TILE)
                as usize;

        for tile_y in topleft_tile_y..=bottomright_tile_y {
            let mut tile_start = tile_row_start;

            for tile_x in topleft_tile_x..=bottomright_tile_x {
                let topleft_x = tile_x * TILE_WIDTH;
                let topleft_y = tile_y * TILE_WIDTH;

                // Clip the requested rectangle to this tile.
                let pixel_x_min = topleft_x.max(x);
                let pixel_y_min = topleft_y.max(y);
                let pixel_x_max = (topleft_x + TILE_WIDTH).min(x + width);
                let pixel_y_max = (topleft_y + TILE_WIDTH).min(y + height);

                let mut y_bits = bit_deposit(pixel_y_min, TILE_Y_SWIZZLE_MASK);
                for _pixel_y in pixel_y_min..pixel_y_max {
                    let mut x_bits = bit_deposit(pixel_x_min, TILE_X_SWIZZLE_MASK);
                    for _pixel_x in pixel_x_min..pixel_x_max {
                        let src = self.backbuffer[tile_start + (y_bits | x_bits) as usize];
                        let out = &mut dst[dst_i * 4..dst_i * 4 + 4];
                        match format {
                            PixelFormat::R8G8B8A8Unorm => {
                                out[0] = ((src >> 16) & 0xFF) as u8;
                                out[1] = ((src >> 8) & 0xFF) as u8;
                                out[2] = (src & 0xFF) as u8;
                                out[3] = ((src >> 24) & 0xFF) as u8;
                            }
                            PixelFormat::B8G8R8A8Unorm => {
                                out[0] = (src & 0xFF) as u8;
                                out[1] = ((src >> 8) & 0xFF) as u8;
                                out[2] = ((src >> 16) & 0xFF) as u8;
                                out[3] = ((src >> 24) & 0xFF) as u8;
                            }
                        }
                        dst_i += 1;
                        x_bits = step_swizzled(x_bits, TILE_X_SWIZZLE_MASK);
                    }
                    y_bits = step_swizzled(y_bits, TILE_Y_SWIZZLE_MASK);
                }

                tile_start += PIXELS_PER_TILE as usize;
            }

            tile_row_start += self.pixels_per_row_of_tiles as usize;
        }
    }

    /// Swizzled backbuffer offset of an absolute pixel coordinate (may lie
    /// in the padded region).
    #[inline]
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        let tile_base = self.tile_base(x / TILE_WIDTH, y / TILE_WIDTH);
        tile_base + swizzle_offset(x, y) as usize
    }
}
