//! Morton-order (Z-curve) swizzle addressing within a tile.
//!
//! Pixels inside a tile are stored with their x and y coordinate bits
//! interleaved: even address bits carry x, odd address bits carry y. Pixels
//! close together in 2D therefore land close together in memory, which keeps
//! local-neighborhood access patterns (batch resolve, SIMD pixel groups)
//! cache friendly. Tiles themselves are stored row major.

/// Width of a tile in pixels. Tiles are square.
pub const TILE_WIDTH: u32 = 128;

/// Pixels per tile (tile width squared).
pub const PIXELS_PER_TILE: u32 = TILE_WIDTH * TILE_WIDTH;

/// Swizzle mask selecting the x bits of a within-tile address.
pub const TILE_X_SWIZZLE_MASK: u32 = 0x5555_5555 & (PIXELS_PER_TILE - 1);

/// Swizzle mask selecting the y bits of a within-tile address.
pub const TILE_Y_SWIZZLE_MASK: u32 = 0xAAAA_AAAA & (PIXELS_PER_TILE - 1);

/// Parallel bit deposit: scatter the low-order bits of `source` into the set
/// bit positions of `mask`, in increasing order. All other result bits are
/// zero.
///
/// Compiled with the `bmi2` target feature this lowers to the PDEP
/// instruction; the portable fallback is bit-identical.
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
#[inline]
pub fn bit_deposit(source: u32, mask: u32) -> u32 {
    // SAFETY: gated on the bmi2 target feature being statically enabled.
    unsafe { core::arch::x86_64::_pdep_u32(source, mask) }
}

/// Parallel bit deposit: scatter the low-order bits of `source` into the set
/// bit positions of `mask`, in increasing order. All other result bits are
/// zero.
#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
#[inline]
pub fn bit_deposit(source: u32, mask: u32) -> u32 {
    bit_deposit_portable(source, mask)
}

/// Bit-by-bit scatter loop, usable on any target.
///
/// Kept public (and compiled unconditionally) so tests can check it against
/// the hardware path: the two must agree bit for bit.
pub fn bit_deposit_portable(source: u32, mask: u32) -> u32 {
    let mut dst = 0u32;
    let mut src_i = 0u32;
    for mask_i in 0..32 {
        if mask & (1 << mask_i) != 0 {
            dst |= ((source >> src_i) & 1) << mask_i;
            src_i += 1;
        }
    }
    dst
}

/// Parallel bit extract: gather the bits of `source` selected by `mask` into
/// the low-order bits of the result. Inverse of [`bit_deposit`].
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
#[inline]
pub fn bit_extract(source: u32, mask: u32) -> u32 {
    // SAFETY: gated on the bmi2 target feature being statically enabled.
    unsafe { core::arch::x86_64::_pext_u32(source, mask) }
}

/// Parallel bit extract: gather the bits of `source` selected by `mask` into
/// the low-order bits of the result. Inverse of [`bit_deposit`].
#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
#[inline]
pub fn bit_extract(source: u32, mask: u32) -> u32 {
    bit_extract_portable(source, mask)
}

/// Bit-by-bit gather loop, usable on any target.
pub fn bit_extract_portable(source: u32, mask: u32) -> u32 {
    let mut dst = 0u32;
    let mut dst_i = 0u32;
    for mask_i in 0..32 {
        if mask & (1 << mask_i) != 0 {
            dst |= ((source >> mask_i) & 1) << dst_i;
            dst_i += 1;
        }
    }
    dst
}

/// Swizzled offset of a tile-relative pixel coordinate.
///
/// Only the low bits of `x` and `y` that address within a tile are used, so
/// callers may pass absolute framebuffer coordinates. The result lies in
/// `[0, PIXELS_PER_TILE)`.
#[inline]
pub fn swizzle_offset(x: u32, y: u32) -> u32 {
    bit_deposit(x, TILE_X_SWIZZLE_MASK) | bit_deposit(y, TILE_Y_SWIZZLE_MASK)
}

/// Recover the tile-relative `(x, y)` coordinate from a swizzled offset.
#[inline]
pub fn unswizzle_offset(offset: u32) -> (u32, u32) {
    (
        bit_extract(offset, TILE_X_SWIZZLE_MASK),
        bit_extract(offset, TILE_Y_SWIZZLE_MASK),
    )
}

/// Advance the masked coordinate bits by one pixel along their axis.
///
/// Subtracting the full mask from the current bits and re-masking increments
/// the coordinate within the mask's bit positions and wraps at the tile edge.
/// Sequential scans use this instead of redoing the bit deposit per pixel.
#[inline]
pub fn step_swizzled(bits: u32, mask: u32) -> u32 {
    bits.wrapping_sub(mask) & mask
}
