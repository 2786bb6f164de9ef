use anyhow::Result;

use crate::classify::tensor::{InputTensor, Scaling, TensorLayout};
use crate::frame::ChannelOrder;

/// Input contract a classifier declares about itself.
///
/// `scaling` and `num_classes` are optional: a backend that cannot know them (an arbitrary
/// ONNX file) leaves them `None` and the configured values are trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub channel_order: ChannelOrder,
    pub layout: TensorLayout,
    pub scaling: Option<Scaling>,
    pub num_classes: Option<usize>,
}

impl InputSpec {
    pub fn shape(&self) -> [usize; 4] {
        self.layout.shape(self.width, self.height)
    }
}

/// Image classifier backend.
///
/// Loaded once at startup, then asked for one probability vector per frame. The returned
/// vector has one non-negative entry per label, in label-set order, summing to roughly 1.
pub trait Classifier {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    fn input_spec(&self) -> InputSpec;

    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>>;

    /// Optional warm-up hook, run once before the first frame. Backends that only learn
    /// their class count by running may fill in `InputSpec::num_classes` here.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
