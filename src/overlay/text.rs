//! Bitmap text drawn with the 8x8 glyphs from `font8x8`.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

pub const GLYPH_SIZE: u32 = 8;

/// Width in pixels of `text` at the given scale.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

pub fn text_height(scale: u32) -> u32 {
    GLYPH_SIZE * scale
}

/// Draw `text` with its top-left corner at `(x, y)`. Pixels outside the image are skipped.
pub fn draw_text(img: &mut RgbImage, x: i32, y: i32, scale: u32, color: Rgb<u8>, text: &str) {
    let scale = scale.max(1) as i32;
    let advance = GLYPH_SIZE as i32 * scale;
    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = x + i as i32 * advance;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col * scale;
                let py = y + row as i32 * scale;
                fill_block(img, px, py, scale, color);
            }
        }
    }
}

fn fill_block(img: &mut RgbImage, x: i32, y: i32, size: i32, color: Rgb<u8>) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for py in y.max(0)..(y + size).min(h) {
        for px in x.max(0)..(x + size).min(w) {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}
