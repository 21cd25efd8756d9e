//! CLI harness for the rastile rasterizer.
//!
//! External collaborator over the library's public API: renders a demo scene
//! to PNG, and exposes the framebuffer layout self-test as an explicit
//! subcommand instead of a hidden first-allocation check.

use std::f32::consts::TAU;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glam::Vec2;

use rastile_core::swizzle::{self, TILE_X_SWIZZLE_MASK, TILE_Y_SWIZZLE_MASK};
use rastile_core::{draw, DrawState, Framebuffer, PixelFormat, PIXELS_PER_TILE, TILE_WIDTH};

#[derive(Parser)]
#[command(name = "rastile")]
#[command(about = "Tile-binned software rasterizer harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a demo triangle fan to a PNG file
    Render {
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Framebuffer width and height in pixels
        #[arg(long, default_value = "512")]
        size: u32,

        /// Number of fan segments
        #[arg(long, default_value = "12")]
        segments: u32,
    },
    /// Verify the swizzled layout against an independent per-pixel model
    Selftest,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            output,
            size,
            segments,
        } => render_demo(&output, size, segments),
        Commands::Selftest => layout_selftest(),
    }
}

/// Fan palette, cycled per segment.
const PALETTE: [[u8; 4]; 6] = [
    [0xE6, 0x3C, 0x3C, 0xFF],
    [0xE6, 0xA8, 0x3C, 0xFF],
    [0x3C, 0xE6, 0x5A, 0xFF],
    [0x3C, 0xB4, 0xE6, 0xFF],
    [0x5A, 0x3C, 0xE6, 0xFF],
    [0xE6, 0x3C, 0xB4, 0xFF],
];

fn render_demo(output: &PathBuf, size: u32, segments: u32) -> anyhow::Result<()> {
    if segments == 0 {
        bail!("--segments must be at least 1");
    }

    let mut fb = Framebuffer::new(size, size);
    let center = Vec2::splat(size as f32 / 2.0);
    let radius = size as f32 * 0.45;

    log::info!("rendering {segments}-segment fan at {size}x{size}");

    for segment in 0..segments {
        let a0 = segment as f32 / segments as f32 * TAU;
        let a1 = (segment + 1) as f32 / segments as f32 * TAU;
        let p0 = center + Vec2::from_angle(a0) * radius;
        let p1 = center + Vec2::from_angle(a1) * radius;

        // With y down, increasing angle walks the rim clockwise on screen.
        let vertices = triangle_stream(center, p0, p1);
        let [r, g, b, a] = PALETTE[segment as usize % PALETTE.len()];
        draw(&mut fb, &DrawState::from_rgba8(r, g, b, a), &vertices);
    }

    fb.resolve();

    let mut packed = vec![0u8; (size * size * 4) as usize];
    fb.pack_row_major(0, 0, size, size, PixelFormat::R8G8B8A8Unorm, &mut packed);

    let img = image::RgbaImage::from_raw(size, size, packed)
        .context("packed buffer has wrong length for image dimensions")?;
    img.save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    log::info!("wrote {}", output.display());
    Ok(())
}

/// Flatten one triangle into the 16.8 fixed-point scalar stream `draw`
/// consumes. Depth is constant; the fan is flat.
fn triangle_stream(v0: Vec2, v1: Vec2, v2: Vec2) -> Vec<u32> {
    [v0, v1, v2]
        .iter()
        .flat_map(|v| {
            [
                rastile_core::fixed_point::f32_to_16_8(v.x),
                rastile_core::fixed_point::f32_to_16_8(v.y),
                0,
            ]
        })
        .collect()
}

/// The layout-equivalence check: fill the padded backbuffer with sequential
/// indices, pack it, and verify every output pixel against an independently
/// computed swizzled offset and channel decode.
fn layout_selftest() -> anyhow::Result<()> {
    let w = TILE_WIDTH * 2;
    let h = TILE_WIDTH * 2;

    let mut fb = Framebuffer::new(w, h);
    for (i, px) in fb.backbuffer_mut().iter_mut().enumerate() {
        *px = i as u32;
    }

    let mut packed = vec![0u8; (w * h * 4) as usize];
    fb.pack_row_major(0, 0, w, h, PixelFormat::R8G8B8A8Unorm, &mut packed);

    for y in 0..h {
        let tile_y = y / TILE_WIDTH;
        for x in 0..w {
            let tile_x = x / TILE_WIDTH;
            let tile_i = tile_y * (fb.pixels_per_row_of_tiles() / PIXELS_PER_TILE) + tile_x;
            let topleft_pixel_i = tile_i * PIXELS_PER_TILE;

            let rel_x = x - tile_x * TILE_WIDTH;
            let rel_y = y - tile_y * TILE_WIDTH;
            let rowmajor_i = (topleft_pixel_i + rel_y * TILE_WIDTH + rel_x) as usize;

            let x_bits = swizzle::bit_deposit(x, TILE_X_SWIZZLE_MASK);
            let y_bits = swizzle::bit_deposit(y, TILE_Y_SWIZZLE_MASK);
            let src = fb.backbuffer()[(topleft_pixel_i + x_bits + y_bits) as usize];

            let expect = [
                ((src >> 16) & 0xFF) as u8,
                ((src >> 8) & 0xFF) as u8,
                (src & 0xFF) as u8,
                ((src >> 24) & 0xFF) as u8,
            ];
            let got = &packed[rowmajor_i * 4..rowmajor_i * 4 + 4];
            if got != expect {
                bail!(
                    "layout mismatch at ({x}, {y}): packed {:02x?}, expected {:02x?}",
                    got,
                    expect
                );
            }
        }
    }

    log::info!("layout self-test passed ({} pixels)", w * h);
    println!("ok: {} pixels verified", w * h);
    Ok(())
}
