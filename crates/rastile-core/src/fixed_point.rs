//! 16.8 fixed-point window coordinates.
//!
//! Vertex positions arrive as unsigned 16.8 fixed-point values: 16 integer
//! bits, 8 fractional bits (1/256 pixel resolution). The framebuffer
//! dimension limit exists so that the 2D cross products taken between these
//! coordinates during edge setup stay within their accumulator range.

use fixed::types::extra::U8;
use fixed::FixedU32;

/// Unsigned 16.8 fixed-point window coordinate.
pub type WindowCoord = FixedU32<U8>;

/// Fractional bits of a window coordinate.
pub const FRAC_BITS: u32 = 8;

/// Half a pixel in raw 16.8 units. Coverage is sampled at pixel centers.
pub const HALF_PIXEL: u32 = 1 << (FRAC_BITS - 1);

/// Exclusive upper bound on framebuffer width and height, from the range
/// analysis of the cross product of two 16.8 coordinate deltas.
pub const MAX_DIMENSION: u32 = 16384;

/// Convert f32 pixels to raw 16.8 bits (saturating at the type's range).
pub fn f32_to_16_8(val: f32) -> u32 {
    WindowCoord::saturating_from_num(val.max(0.0)).to_bits()
}

/// Convert raw 16.8 bits back to f32 pixels.
pub fn fixed_16_8_to_f32(bits: u32) -> f32 {
    WindowCoord::from_bits(bits).to_num::<f32>()
}

/// Pixel index containing a 16.8 coordinate (truncate the fraction).
#[inline]
pub fn pixel_of(bits: u32) -> u32 {
    bits >> FRAC_BITS
}
