use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use std::borrow::Cow;

use crate::classify::tensor::{InputTensor, Scaling, TensorLayout};
use crate::frame::{ChannelOrder, Frame};

/// Turns captured frames into the tensor a classifier expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preprocessor {
    width: u32,
    height: u32,
    channel_order: ChannelOrder,
    layout: TensorLayout,
    scaling: Scaling,
}

impl Preprocessor {
    pub fn new(
        width: u32,
        height: u32,
        channel_order: ChannelOrder,
        layout: TensorLayout,
        scaling: Scaling,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!(
                "classifier input size must be non-zero, got {}x{}",
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            channel_order,
            layout,
            scaling,
        })
    }

    pub fn output_shape(&self) -> [usize; 4] {
        self.layout.shape(self.width, self.height)
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn preprocess(&self, frame: &Frame) -> Result<InputTensor> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(anyhow!(
                "cannot preprocess empty frame {}x{}",
                frame.width(),
                frame.height()
            ));
        }

        let resized = if frame.width() == self.width && frame.height() == self.height {
            Cow::Borrowed(frame.pixels())
        } else {
            Cow::Owned(imageops::resize(
                frame.pixels(),
                self.width,
                self.height,
                FilterType::Triangle,
            ))
        };

        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = vec![0.0f32; w * h * 3];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let ordered = frame.order().convert(pixel.0, self.channel_order);
            let (x, y) = (x as usize, y as usize);
            for (c, value) in ordered.iter().enumerate() {
                let idx = match self.layout {
                    TensorLayout::Nhwc => (y * w + x) * 3 + c,
                    TensorLayout::Nchw => c * h * w + y * w + x,
                };
                data[idx] = self.scaling.apply(*value);
            }
        }

        InputTensor::new(self.output_shape(), self.layout, data)
    }
}
