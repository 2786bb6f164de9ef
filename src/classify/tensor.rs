use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Memory layout of a batched image tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, the Keras/TensorFlow convention.
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`, the PyTorch/ONNX-zoo convention.
    Nchw,
}

impl TensorLayout {
    pub fn shape(self, width: u32, height: u32) -> [usize; 4] {
        let (w, h) = (width as usize, height as usize);
        match self {
            TensorLayout::Nhwc => [1, h, w, 3],
            TensorLayout::Nchw => [1, 3, h, w],
        }
    }
}

/// Value range fed to the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scaling {
    /// Pixel values as-is (0..=255). For models with their own rescaling layer.
    Raw,
    /// Pixel values divided by 255.
    UnitRange,
}

impl Scaling {
    pub fn from_rescales_internally(rescales_internally: bool) -> Self {
        if rescales_internally {
            Scaling::Raw
        } else {
            Scaling::UnitRange
        }
    }

    pub fn apply(self, value: u8) -> f32 {
        match self {
            Scaling::Raw => value as f32,
            Scaling::UnitRange => value as f32 / 255.0,
        }
    }
}

/// Batch-of-one f32 image tensor handed to a classifier.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTensor {
    shape: [usize; 4],
    layout: TensorLayout,
    data: Vec<f32>,
}

impl InputTensor {
    pub fn new(shape: [usize; 4], layout: TensorLayout, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(anyhow!(
                "tensor data length {} does not match shape {:?}",
                data.len(),
                shape
            ));
        }
        if shape[0] != 1 {
            return Err(anyhow!("tensor batch size must be 1, got {}", shape[0]));
        }
        Ok(Self {
            shape,
            layout,
            data,
        })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_shapes() {
        assert_eq!(TensorLayout::Nhwc.shape(224, 160), [1, 160, 224, 3]);
        assert_eq!(TensorLayout::Nchw.shape(224, 160), [1, 3, 160, 224]);
    }

    #[test]
    fn tensor_checks_length_and_batch() {
        assert!(InputTensor::new([1, 2, 2, 3], TensorLayout::Nhwc, vec![0.0; 11]).is_err());
        assert!(InputTensor::new([2, 1, 1, 3], TensorLayout::Nhwc, vec![0.0; 6]).is_err());
        assert!(InputTensor::new([1, 1, 1, 3], TensorLayout::Nhwc, vec![0.0; 3]).is_ok());
    }
}
