//! Unit tests for the per-tile circular command buffer.

use rastile_core::cmdbuf::{encode_pixel, encode_set_color, TileCmdBuf, CMDBUF_CAPACITY};
use rastile_core::swizzle::PIXELS_PER_TILE;
use rastile_core::{Framebuffer, TILE_WIDTH};

fn tile_storage() -> (Vec<u32>, Vec<u32>) {
    (
        vec![0u32; CMDBUF_CAPACITY],
        vec![0u32; PIXELS_PER_TILE as usize],
    )
}

mod queue_discipline {
    use super::*;

    #[test]
    fn starts_empty() {
        let buf = TileCmdBuf::new();
        assert!(buf.is_empty());
        assert!(!buf.is_full());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.free(), CMDBUF_CAPACITY - 1);
    }

    #[test]
    fn fills_at_capacity_minus_one() {
        let (mut slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();
        for i in 0..CMDBUF_CAPACITY - 1 {
            assert!(!buf.is_full(), "full after only {i} words");
            buf.push(&mut slab, &mut pixels, encode_pixel(i as u32));
        }
        assert!(buf.is_full());
    }

    /// Pushing past capacity flushes instead of overflowing or dropping.
    #[test]
    fn push_when_full_flushes_first() {
        let (mut slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();
        for i in 0..CMDBUF_CAPACITY {
            buf.push(&mut slab, &mut pixels, encode_pixel(i as u32));
        }
        // The final push forced a flush of the first 127 words, then queued
        // itself.
        assert_eq!(buf.len(), 1);
        assert!(!buf.is_full());
    }

    #[test]
    fn flush_leaves_read_equal_write() {
        let (mut slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();
        for i in 0..10 {
            buf.push(&mut slab, &mut pixels, encode_pixel(i));
        }
        assert_eq!(buf.len(), 10);
        buf.flush(&slab, &mut pixels);
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn flush_on_empty_is_noop() {
        let (slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();
        buf.flush(&slab, &mut pixels);
        assert!(buf.is_empty());
        assert!(pixels.iter().all(|&p| p == 0));
    }
}

mod execution {
    use super::*;

    #[test]
    fn set_color_then_pixels() {
        let (mut slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();

        buf.push_all(&mut slab, &mut pixels, &[encode_set_color(), 0xFF00_00FF]);
        buf.push(&mut slab, &mut pixels, encode_pixel(0));
        buf.push(&mut slab, &mut pixels, encode_pixel(42));
        buf.flush(&slab, &mut pixels);

        assert_eq!(pixels[0], 0xFF00_00FF);
        assert_eq!(pixels[42], 0xFF00_00FF);
        assert_eq!(pixels[1], 0);
    }

    /// Executor color state must survive a capacity-forced flush so a pixel
    /// run split across flushes keeps its color.
    #[test]
    fn color_persists_across_forced_flush() {
        let (mut slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();

        buf.push_all(&mut slab, &mut pixels, &[encode_set_color(), 0xAB]);
        // Enough pixel commands to force at least one intermediate flush.
        for offset in 0..(CMDBUF_CAPACITY as u32 * 3) {
            buf.push(&mut slab, &mut pixels, encode_pixel(offset));
        }
        buf.flush(&slab, &mut pixels);

        for offset in 0..(CMDBUF_CAPACITY * 3) {
            assert_eq!(pixels[offset], 0xAB, "pixel {offset} lost its color");
        }
    }

    /// A two-word command never straddles a forced flush.
    #[test]
    fn set_color_is_atomic_at_capacity_boundary() {
        let (mut slab, mut pixels) = tile_storage();
        let mut buf = TileCmdBuf::new();

        // Leave exactly one free slot, then push a two-word command.
        for i in 0..CMDBUF_CAPACITY - 2 {
            buf.push(&mut slab, &mut pixels, encode_pixel(i as u32));
        }
        assert_eq!(buf.free(), 1);
        buf.push_all(&mut slab, &mut pixels, &[encode_set_color(), 0xCD]);
        buf.push(&mut slab, &mut pixels, encode_pixel(100));
        buf.flush(&slab, &mut pixels);

        assert_eq!(pixels[100], 0xCD);
    }
}

mod tile_independence {
    use super::*;

    #[test]
    fn enqueue_touches_only_its_tile() {
        let mut fb = Framebuffer::new(TILE_WIDTH * 2, TILE_WIDTH * 2);
        fb.enqueue_set_color(0, 0, 0xFF);
        fb.enqueue_pixel(0, 0, 0);

        assert!(!fb.tile_cmdbuf(0, 0).is_empty());
        assert!(fb.tile_cmdbuf(1, 0).is_empty());
        assert!(fb.tile_cmdbuf(0, 1).is_empty());
        assert!(fb.tile_cmdbuf(1, 1).is_empty());
    }

    #[test]
    fn flush_drains_only_its_tile() {
        let mut fb = Framebuffer::new(TILE_WIDTH * 2, TILE_WIDTH);
        fb.enqueue_set_color(0, 0, 0x11);
        fb.enqueue_pixel(0, 0, 0);
        fb.enqueue_set_color(1, 0, 0x22);
        fb.enqueue_pixel(1, 0, 0);

        fb.flush_tile(0, 0);
        assert!(fb.tile_cmdbuf(0, 0).is_empty());
        assert!(!fb.tile_cmdbuf(1, 0).is_empty());

        // Tile 0's pixel landed; tile 1's is still deferred.
        assert_eq!(fb.backbuffer()[0], 0x11);
        let tile1_base = fb.tile_base(1, 0);
        assert_eq!(fb.backbuffer()[tile1_base], 0);
    }

    #[test]
    fn resolve_drains_every_tile() {
        let mut fb = Framebuffer::new(TILE_WIDTH * 2, TILE_WIDTH * 2);
        for tile_y in 0..2 {
            for tile_x in 0..2 {
                fb.enqueue_set_color(tile_x, tile_y, 0x99);
                fb.enqueue_pixel(tile_x, tile_y, 7);
            }
        }
        fb.resolve();

        for tile_y in 0..2 {
            for tile_x in 0..2 {
                assert!(fb.tile_cmdbuf(tile_x, tile_y).is_empty());
                let base = fb.tile_base(tile_x, tile_y);
                assert_eq!(fb.backbuffer()[base + 7], 0x99);
            }
        }
    }
}
