//! Red "NO DATA" placeholder raster.
//!
//! Delivered when neither the network nor the tile store can serve a request,
//! so that a lost connection is obvious on the map instead of leaving blank
//! tiles. The raster is rendered once and shared by every placeholder tile.
//!
//! Text is drawn from a small built-in 5×7 bitmap font covering the glyphs
//! the message needs.

use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use image::{ImageFormat, Rgba, RgbaImage};

/// Edge length of the placeholder in pixels.
pub const PLACEHOLDER_SIZE: u32 = 256;

/// Message drawn on the placeholder, one entry per line.
pub const PLACEHOLDER_LINES: [&str; 2] = ["NO DATA", "CHECK INTERNET CONNECTION"];

/// Background fill.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Text colour.
pub const FOREGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character, in unscaled pixels.
const ADVANCE: u32 = GLYPH_WIDTH + 1;
const MARGIN: u32 = 8;

static PLACEHOLDER: OnceLock<Arc<RgbaImage>> = OnceLock::new();

/// The shared placeholder raster, rendered on first access.
pub fn placeholder_image() -> Arc<RgbaImage> {
    Arc::clone(PLACEHOLDER.get_or_init(|| Arc::new(render_placeholder())))
}

/// Render a fresh placeholder raster.
///
/// Each line is scaled up to the largest whole factor that fits the tile
/// width, and the block of lines is centred both ways.
pub fn render_placeholder() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, BACKGROUND);

    let scales: Vec<u32> = PLACEHOLDER_LINES
        .iter()
        .map(|line| line_scale(line, PLACEHOLDER_SIZE - 2 * MARGIN))
        .collect();

    // One unscaled glyph height of the larger line separates the two lines.
    let gap = GLYPH_HEIGHT * scales.iter().copied().max().unwrap_or(1) / 2;
    let block_height: u32 =
        scales.iter().map(|s| GLYPH_HEIGHT * s).sum::<u32>() + gap * (scales.len() as u32 - 1);

    let mut top = PLACEHOLDER_SIZE.saturating_sub(block_height) / 2;
    for (line, scale) in PLACEHOLDER_LINES.iter().zip(&scales) {
        let width = line_width(line, *scale);
        let left = PLACEHOLDER_SIZE.saturating_sub(width) / 2;
        draw_line(&mut image, line, left, top, *scale);
        top += GLYPH_HEIGHT * scale + gap;
    }

    image
}

/// Encode a raster as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn line_width(line: &str, scale: u32) -> u32 {
    let chars = line.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    // No trailing gap after the last glyph.
    (chars * ADVANCE - 1) * scale
}

fn line_scale(line: &str, available: u32) -> u32 {
    let unscaled = line_width(line, 1).max(1);
    (available / unscaled).max(1)
}

fn draw_line(image: &mut RgbaImage, line: &str, left: u32, top: u32, scale: u32) {
    for (i, ch) in line.chars().enumerate() {
        let origin_x = left + i as u32 * ADVANCE * scale;
        let Some(rows) = glyph(ch) else {
            continue;
        };
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x0 = origin_x + col * scale;
                let y0 = top + row as u32 * scale;
                fill(image, x0, y0, scale);
            }
        }
    }
}

fn fill(image: &mut RgbaImage, x0: u32, y0: u32, size: u32) {
    for y in y0..(y0 + size).min(image.height()) {
        for x in x0..(x0 + size).min(image.width()) {
            image.put_pixel(x, y, FOREGROUND);
        }
    }
}

/// 5×7 rows, most significant of the low five bits is the leftmost column.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        _ => return None,
    };
    Some(rows)
}
