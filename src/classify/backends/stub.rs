use anyhow::{anyhow, Result};

use crate::classify::backend::{Classifier, InputSpec};
use crate::classify::tensor::InputTensor;

/// Deterministic classifier for tests and offline demos.
///
/// Returns the configured probability vectors in turn, one per call, wrapping around.
pub struct StubClassifier {
    spec: InputSpec,
    outputs: Vec<Vec<f32>>,
    cursor: usize,
}

impl StubClassifier {
    pub fn new(spec: InputSpec, outputs: Vec<Vec<f32>>) -> Result<Self> {
        let first_len = outputs
            .first()
            .map(Vec::len)
            .ok_or_else(|| anyhow!("stub classifier needs at least one output"))?;
        for (idx, output) in outputs.iter().enumerate() {
            if output.len() != first_len {
                return Err(anyhow!(
                    "stub output {} has {} entries, expected {}",
                    idx,
                    output.len(),
                    first_len
                ));
            }
            if output.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(anyhow!("stub output {} has negative or non-finite entries", idx));
            }
        }
        let spec = InputSpec {
            num_classes: Some(first_len),
            ..spec
        };
        Ok(Self {
            spec,
            outputs,
            cursor: 0,
        })
    }

    /// Always return the same vector.
    pub fn fixed(spec: InputSpec, probabilities: Vec<f32>) -> Result<Self> {
        Self::new(spec, vec![probabilities])
    }

    /// Walk through the classes, giving each in turn a clear majority.
    pub fn cycling(spec: InputSpec, num_classes: usize) -> Result<Self> {
        if num_classes == 0 {
            return Err(anyhow!("stub classifier needs at least one class"));
        }
        let peak = 0.75;
        let rest = if num_classes > 1 {
            (1.0 - peak) / (num_classes - 1) as f32
        } else {
            0.0
        };
        let outputs = (0..num_classes)
            .map(|winner| {
                (0..num_classes)
                    .map(|idx| {
                        if num_classes == 1 {
                            1.0
                        } else if idx == winner {
                            peak
                        } else {
                            rest
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(spec, outputs)
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn input_spec(&self) -> InputSpec {
        self.spec
    }

    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        if input.shape() != self.spec.shape() {
            return Err(anyhow!(
                "input shape {:?} does not match classifier input {:?}",
                input.shape(),
                self.spec.shape()
            ));
        }
        let output = self.outputs[self.cursor % self.outputs.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tensor::{Scaling, TensorLayout};
    use crate::frame::ChannelOrder;

    fn spec() -> InputSpec {
        InputSpec {
            width: 2,
            height: 2,
            channel_order: ChannelOrder::Rgb,
            layout: TensorLayout::Nhwc,
            scaling: Some(Scaling::Raw),
            num_classes: None,
        }
    }

    fn input() -> InputTensor {
        InputTensor::new([1, 2, 2, 3], TensorLayout::Nhwc, vec![0.0; 12]).unwrap()
    }

    #[test]
    fn cycles_through_outputs() -> Result<()> {
        let mut stub = StubClassifier::new(spec(), vec![vec![1.0, 0.0], vec![0.0, 1.0]])?;
        assert_eq!(stub.input_spec().num_classes, Some(2));
        assert_eq!(stub.classify(&input())?, vec![1.0, 0.0]);
        assert_eq!(stub.classify(&input())?, vec![0.0, 1.0]);
        assert_eq!(stub.classify(&input())?, vec![1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn cycling_outputs_sum_to_one() -> Result<()> {
        let mut stub = StubClassifier::cycling(spec(), 6)?;
        for winner in 0..6 {
            let probs = stub.classify(&input())?;
            let sum: f32 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert_eq!(crate::result::argmax(&probs), Some(winner));
        }
        Ok(())
    }

    #[test]
    fn rejects_mismatched_input() -> Result<()> {
        let mut stub = StubClassifier::fixed(spec(), vec![1.0])?;
        let wrong = InputTensor::new([1, 3, 3, 3], TensorLayout::Nhwc, vec![0.0; 27])?;
        assert!(stub.classify(&wrong).is_err());
        Ok(())
    }

    #[test]
    fn rejects_invalid_outputs() {
        assert!(StubClassifier::new(spec(), vec![]).is_err());
        assert!(StubClassifier::new(spec(), vec![vec![0.5, 0.5], vec![1.0]]).is_err());
        assert!(StubClassifier::fixed(spec(), vec![-0.1, 1.1]).is_err());
    }
}
