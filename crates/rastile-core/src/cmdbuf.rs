//! Per-tile circular command buffer.
//!
//! Each tile owns a fixed 128-word slab inside the framebuffer's command
//! pool plus read/write indices into it. Rasterization appends encoded
//! commands; a full buffer is a backpressure signal that forces a flush of
//! that tile before the push proceeds, never an error and never a drop.
//! Buffers of different tiles are fully independent.

use crate::swizzle::PIXELS_PER_TILE;

/// Command buffer capacity in 32-bit words. One slot is sacrificed to
/// disambiguate full from empty.
pub const CMDBUF_CAPACITY: usize = 128;

/// Opcode field position within a command word.
pub const OP_SHIFT: u32 = 30;

/// Write one pixel: low 14 bits hold the swizzled offset within the tile.
pub const OP_PIXEL: u32 = 0;

/// Change the current write color: the next word is a raw packed color.
pub const OP_SET_COLOR: u32 = 1;

/// Mask for the swizzled offset payload of an [`OP_PIXEL`] word.
pub const PIXEL_OFFSET_MASK: u32 = PIXELS_PER_TILE - 1;

/// Encode an [`OP_PIXEL`] command word.
#[inline]
pub fn encode_pixel(offset: u32) -> u32 {
    debug_assert!(offset < PIXELS_PER_TILE);
    (OP_PIXEL << OP_SHIFT) | offset
}

/// Encode the opcode word of an [`OP_SET_COLOR`] command. The raw color
/// follows as a separate payload word.
#[inline]
pub fn encode_set_color() -> u32 {
    OP_SET_COLOR << OP_SHIFT
}

/// Circular command queue bound to one tile.
///
/// Invariant: `read` lags or equals `write` in circular order. Empty iff
/// `read == write`; full iff advancing `write` would equal `read`.
#[derive(Clone, Copy, Debug)]
pub struct TileCmdBuf {
    read: usize,
    write: usize,
    /// Executor color state. Persists across flushes so a pixel run split by
    /// a capacity flush keeps its color.
    color: u32,
}

impl TileCmdBuf {
    /// An empty queue with black write color.
    pub fn new() -> Self {
        Self {
            read: 0,
            write: 0,
            color: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    pub fn is_full(&self) -> bool {
        (self.write + 1) % CMDBUF_CAPACITY == self.read
    }

    /// Queued command words.
    pub fn len(&self) -> usize {
        (self.write + CMDBUF_CAPACITY - self.read) % CMDBUF_CAPACITY
    }

    /// Free slots before the queue reports full.
    pub fn free(&self) -> usize {
        CMDBUF_CAPACITY - 1 - self.len()
    }

    /// Queue a single command word, flushing first if the buffer is full.
    ///
    /// `slab` is this tile's command-pool window; `tile_pixels` is this
    /// tile's swizzled pixel storage, needed in case the push forces a flush.
    pub fn push(&mut self, slab: &mut [u32], tile_pixels: &mut [u32], word: u32) {
        if self.is_full() {
            log::trace!("tile command buffer full, forcing flush");
            self.flush(slab, tile_pixels);
        }
        slab[self.write] = word;
        self.write = (self.write + 1) % CMDBUF_CAPACITY;
    }

    /// Queue a multi-word command atomically: if fewer than `words.len()`
    /// slots are free, flush first so a flush can never land between an
    /// opcode word and its payload.
    pub fn push_all(&mut self, slab: &mut [u32], tile_pixels: &mut [u32], words: &[u32]) {
        debug_assert!(words.len() < CMDBUF_CAPACITY);
        if self.free() < words.len() {
            self.flush(slab, tile_pixels);
        }
        for &word in words {
            slab[self.write] = word;
            self.write = (self.write + 1) % CMDBUF_CAPACITY;
        }
    }

    /// Drain all queued commands, applying their effect to the tile's
    /// pixels. Leaves the queue empty (`read == write`).
    pub fn flush(&mut self, slab: &[u32], tile_pixels: &mut [u32]) {
        while self.read != self.write {
            let word = self.pop(slab);
            match word >> OP_SHIFT {
                OP_SET_COLOR => {
                    // Payload word; push_all guarantees it is present.
                    debug_assert!(self.read != self.write, "set-color word without payload");
                    self.color = self.pop(slab);
                }
                _ => {
                    let offset = word & PIXEL_OFFSET_MASK;
                    tile_pixels[offset as usize] = self.color;
                }
            }
        }
    }

    #[inline]
    fn pop(&mut self, slab: &[u32]) -> u32 {
        let word = slab[self.read];
        self.read = (self.read + 1) % CMDBUF_CAPACITY;
        word
    }
}

impl Default for TileCmdBuf {
    fn default() -> Self {
        Self::new()
    }
}
