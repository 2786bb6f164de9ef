//! Clipped rectangle primitives.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// Clip a rectangle to the image. Returns `(x0, y0, x1, y1)` with exclusive ends.
fn clip(img: &RgbImage, x: i32, y: i32, w: i32, h: i32) -> Option<(u32, u32, u32, u32)> {
    if w <= 0 || h <= 0 {
        return None;
    }
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(w).min(img.width() as i32);
    let y1 = y.saturating_add(h).min(img.height() as i32);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

/// Blend `color` over the rectangle with the given opacity. The underlying pixels stay visible.
pub fn blend_rect(img: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>, alpha: f32) {
    let Some((x0, y0, x1, y1)) = clip(img, x, y, w, h) else {
        return;
    };
    let alpha = alpha.clamp(0.0, 1.0);
    for py in y0..y1 {
        for px in x0..x1 {
            let pixel = img.get_pixel_mut(px, py);
            for c in 0..3 {
                let blended = pixel.0[c] as f32 * (1.0 - alpha) + color.0[c] as f32 * alpha;
                pixel.0[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

pub fn fill_rect(img: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>) {
    let Some((x0, y0, x1, y1)) = clip(img, x, y, w, h) else {
        return;
    };
    let rect = Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0);
    draw_filled_rect_mut(img, rect, color);
}

/// Rectangle outline `thickness` pixels wide, drawn inward from the given bounds.
pub fn outline_rect(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    thickness: i32,
    color: Rgb<u8>,
) {
    for inset in 0..thickness.max(1) {
        let (iw, ih) = (w - 2 * inset, h - 2 * inset);
        if iw <= 0 || ih <= 0 {
            break;
        }
        let rect = Rect::at(x + inset, y + inset).of_size(iw as u32, ih as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_darkens_without_replacing() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([100, 200, 50]));
        blend_rect(&mut img, 0, 0, 2, 4, Rgb([0, 0, 0]), 0.6);
        assert_eq!(img.get_pixel(0, 0).0, [40, 80, 20]);
        assert_eq!(img.get_pixel(3, 3).0, [100, 200, 50]);
    }

    #[test]
    fn degenerate_rects_are_ignored() {
        let mut img = RgbImage::new(4, 4);
        fill_rect(&mut img, 0, 0, 0, 4, Rgb([255, 255, 255]));
        fill_rect(&mut img, 10, 10, 5, 5, Rgb([255, 255, 255]));
        blend_rect(&mut img, -10, -10, 5, 5, Rgb([255, 255, 255]), 1.0);
        outline_rect(&mut img, 0, 0, 1, 0, 2, Rgb([255, 255, 255]));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn fill_is_clipped() {
        let mut img = RgbImage::new(4, 4);
        fill_rect(&mut img, 2, 2, 10, 10, Rgb([9, 9, 9]));
        assert_eq!(img.get_pixel(3, 3).0, [9, 9, 9]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
    }
}
