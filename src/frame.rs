//! Captured frames and pixel colors.
//!
//! A `Frame` is a fixed-size 3-channel image whose channel order is decided by the
//! capture source. Everything downstream (preprocessing, overlay, screenshots) asks the
//! frame for its order instead of assuming one.

use anyhow::{anyhow, Result};
use image::{imageops, Rgb, RgbImage};
use serde::Deserialize;

/// Order of the three color channels inside each pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Reorder a pixel stored in `self` order into `target` order.
    pub fn convert(self, pixel: [u8; 3], target: ChannelOrder) -> [u8; 3] {
        if self == target {
            pixel
        } else {
            [pixel[2], pixel[1], pixel[0]]
        }
    }
}

/// Display color, always expressed as RGB regardless of frame order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const ORANGE: Color = Color::new(255, 165, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// One captured frame. Owned by a single loop iteration and mutated in place by the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pixels: RgbImage,
    order: ChannelOrder,
    sequence: u64,
}

impl Frame {
    /// Build a frame from tightly packed 3-byte pixels.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, order: ChannelOrder) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer length mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        let pixels = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| anyhow!("frame buffer rejected for {}x{}", width, height))?;
        Ok(Self::from_image(pixels, order))
    }

    pub fn from_image(pixels: RgbImage, order: ChannelOrder) -> Self {
        Self {
            pixels,
            order,
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Capture sequence number assigned by the source (1-based, 0 when unknown).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Pixel storage. Channel semantics follow `order()`; the `Rgb` pixel type is only a container.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Encode an RGB color into this frame's native channel order.
    pub fn paint(&self, color: Color) -> Rgb<u8> {
        Rgb(ChannelOrder::Rgb.convert([color.r, color.g, color.b], self.order))
    }

    /// Flip left-to-right so the user sees a mirror view.
    pub fn mirror_horizontal(&mut self) {
        imageops::flip_horizontal_in_place(&mut self.pixels);
    }

    /// Copy of the frame with channels in RGB order, for encoders that expect RGB.
    pub fn to_rgb_image(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => self.pixels.clone(),
            ChannelOrder::Bgr => {
                let mut out = self.pixels.clone();
                for pixel in out.pixels_mut() {
                    pixel.0 = ChannelOrder::Bgr.convert(pixel.0, ChannelOrder::Rgb);
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_short_buffers() {
        let err = Frame::from_raw(4, 2, vec![0u8; 10], ChannelOrder::Rgb).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn mirror_swaps_columns() -> Result<()> {
        let data = vec![1, 1, 1, 2, 2, 2, 3, 3, 3];
        let mut frame = Frame::from_raw(3, 1, data, ChannelOrder::Rgb)?;
        frame.mirror_horizontal();
        assert_eq!(frame.as_bytes(), &[3, 3, 3, 2, 2, 2, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn paint_respects_bgr_order() -> Result<()> {
        let frame = Frame::from_raw(1, 1, vec![0, 0, 0], ChannelOrder::Bgr)?;
        assert_eq!(frame.paint(Color::ORANGE), Rgb([0, 165, 255]));
        Ok(())
    }

    #[test]
    fn bgr_frames_convert_back_to_rgb() -> Result<()> {
        let frame = Frame::from_raw(1, 1, vec![10, 20, 30], ChannelOrder::Bgr)?;
        assert_eq!(frame.to_rgb_image().as_raw(), &vec![30, 20, 10]);
        Ok(())
    }
}
