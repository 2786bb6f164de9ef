use anyhow::{anyhow, Context, Result};

use crate::frame::{ChannelOrder, Frame};

/// Pixel formats a V4L2 device may hand back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PixelFormat {
    Rgb24,
    Bgr24,
    Yuyv,
    Mjpeg,
}

impl PixelFormat {
    pub(crate) fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(PixelFormat::Rgb24),
            b"BGR3" => Some(PixelFormat::Bgr24),
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"MJPG" => Some(PixelFormat::Mjpeg),
            _ => None,
        }
    }
}

/// Turn a device buffer into a frame. Packed RGB/BGR keep their native order.
pub(crate) fn decode_frame(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Frame> {
    match format {
        PixelFormat::Rgb24 => packed(pixels, width, height, ChannelOrder::Rgb),
        PixelFormat::Bgr24 => packed(pixels, width, height, ChannelOrder::Bgr),
        PixelFormat::Yuyv => {
            let rgb = yuyv_to_rgb(pixels, width, height)?;
            Frame::from_raw(width, height, rgb, ChannelOrder::Rgb)
        }
        PixelFormat::Mjpeg => {
            let image = image::load_from_memory_with_format(pixels, image::ImageFormat::Jpeg)
                .context("decode MJPEG frame")?
                .to_rgb8();
            Ok(Frame::from_image(image, ChannelOrder::Rgb))
        }
    }
}

fn packed(pixels: &[u8], width: u32, height: u32, order: ChannelOrder) -> Result<Frame> {
    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
    // Some drivers pad the final buffer; only the leading image bytes are meaningful.
    if pixels.len() < expected {
        return Err(anyhow!(
            "packed frame too short: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }
    Frame::from_raw(width, height, pixels[..expected].to_vec(), order)
}

fn yuyv_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    let expected = w
        .checked_mul(h)
        .and_then(|v| v.checked_mul(2))
        .ok_or_else(|| anyhow!("YUYV frame dimensions overflow"))?;
    if pixels.len() < expected || w % 2 != 0 {
        return Err(anyhow!(
            "YUYV frame length mismatch: expected {} bytes for even width, got {} (width {})",
            expected,
            pixels.len(),
            w
        ));
    }

    let mut rgb = Vec::with_capacity(w * h * 3);
    for chunk in pixels[..expected].chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for y in [chunk[0], chunk[2]] {
            let y = y as f32;
            rgb.push(clamp_to_u8(y + 1.402_f32 * v));
            rgb.push(clamp_to_u8(y - 0.344_136_f32 * u - 0.714_136_f32 * v));
            rgb.push(clamp_to_u8(y + 1.772_f32 * u));
        }
    }
    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
