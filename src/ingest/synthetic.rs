//! Synthetic frame source (`stub://`).
//!
//! Produces a slowly shifting color gradient with a little sensor noise so the pipeline
//! can run without a camera. An optional frame limit simulates the camera going away.

use anyhow::{anyhow, Result};
use rand::Rng;

use super::{FrameSource, SourceStats};
use crate::frame::{ChannelOrder, Frame};

pub struct SyntheticSource {
    name: String,
    width: u32,
    height: u32,
    max_frames: Option<u64>,
    frame_count: u64,
    opened: bool,
}

impl SyntheticSource {
    pub fn new(name: impl Into<String>, width: u32, height: u32, max_frames: Option<u64>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            max_frames,
            frame_count: 0,
            opened: false,
        }
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let (w, h) = (self.width as u64, self.height as u64);
        let shift = self.frame_count * 3;
        let mut pixels = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let noise: i16 = rng.gen_range(-4..=4);
                let r = ((x * 255 / w.max(1) + shift) % 256) as i16;
                let g = ((y * 255 / h.max(1) + shift / 2) % 256) as i16;
                let b = (((x + y) * 128 / (w + h).max(1)) % 256) as i16;
                for channel in [r, g, b] {
                    pixels.push((channel + noise).clamp(0, 255) as u8);
                }
            }
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("stub://{} ({}x{})", self.name, self.width, self.height)
    }

    fn open(&mut self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "synthetic source {} has zero-sized frames",
                self.name
            ));
        }
        self.opened = true;
        log::info!("SyntheticSource: opened {}", self.describe());
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        if !self.opened {
            return Err(anyhow!("synthetic source {} is not open", self.name));
        }
        if self
            .max_frames
            .is_some_and(|limit| self.frame_count >= limit)
        {
            return Ok(None);
        }
        self.frame_count += 1;
        let frame = Frame::from_raw(
            self.width,
            self.height,
            self.generate_pixels(),
            ChannelOrder::Rgb,
        )?;
        Ok(Some(frame.with_sequence(self.frame_count)))
    }

    fn close(&mut self) {
        if self.opened {
            log::debug!("SyntheticSource: closed {}", self.describe());
        }
        self.opened = false;
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            description: self.describe(),
        }
    }
}
