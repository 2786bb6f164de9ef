//! Still-image source (`file://`).
//!
//! Decodes one image at open time and hands out a fresh copy per read, which makes a
//! photo of a fruit behave like a camera pointed at it.

use anyhow::{anyhow, Context, Result};
use image::RgbImage;

use super::{FrameSource, SourceStats};
use crate::frame::{ChannelOrder, Frame};

pub struct StillImageSource {
    path: String,
    image: Option<RgbImage>,
    frame_count: u64,
}

impl StillImageSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            image: None,
            frame_count: 0,
        }
    }
}

impl FrameSource for StillImageSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path)
    }

    fn open(&mut self) -> Result<()> {
        let image = image::open(&self.path)
            .with_context(|| format!("failed to open image {}", self.path))?
            .to_rgb8();
        log::info!(
            "StillImageSource: opened {} ({}x{})",
            self.path,
            image.width(),
            image.height()
        );
        self.image = Some(image);
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| anyhow!("image source {} is not open", self.path))?;
        self.frame_count += 1;
        Ok(Some(
            Frame::from_image(image.clone(), ChannelOrder::Rgb).with_sequence(self.frame_count),
        ))
    }

    fn close(&mut self) {
        self.image = None;
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            description: self.describe(),
        }
    }
}
