#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::backend::{Classifier, InputSpec};
use crate::classify::tensor::InputTensor;

/// Tract-based classifier for local ONNX models.
///
/// The input fact is pinned to the configured shape so a model that cannot accept it fails
/// while loading, not on the first frame.
pub struct TractClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    spec: InputSpec,
}

impl TractClassifier {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, spec: InputSpec) -> Result<Self> {
        let model_path = model_path.as_ref();
        let shape = spec.shape();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(shape[0], shape[1], shape[2], shape[3]),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "TractClassifier: loaded {} with input {:?}",
            model_path.display(),
            shape
        );

        Ok(Self { model, spec })
    }

    fn build_input(&self, input: &InputTensor) -> Result<Tensor> {
        if input.shape() != self.spec.shape() {
            return Err(anyhow!(
                "input shape {:?} does not match model input {:?}",
                input.shape(),
                self.spec.shape()
            ));
        }
        let array = tract_ndarray::Array4::from_shape_vec(
            (
                input.shape()[0],
                input.shape()[1],
                input.shape()[2],
                input.shape()[3],
            ),
            input.data().to_vec(),
        )
        .context("input tensor has inconsistent shape")?;
        Ok(array.into_tensor())
    }

    fn extract_probabilities(&self, outputs: TVec<TValue>) -> Result<Vec<f32>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .iter()
            .copied()
            .collect();
        if scores.is_empty() {
            return Err(anyhow!("model produced an empty output tensor"));
        }
        Ok(normalize_scores(scores))
    }
}

/// Models exported without a final softmax emit logits; turn those into probabilities.
fn normalize_scores(scores: Vec<f32>) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let looks_like_probabilities =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 0.05;
    if looks_like_probabilities {
        return scores;
    }
    log::debug!("TractClassifier: applying softmax to raw scores");
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_spec(&self) -> InputSpec {
        self.spec
    }

    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        let tensor = self.build_input(input)?;
        let outputs = self
            .model
            .run(tvec!(tensor.into_tvalue()))
            .context("ONNX inference failed")?;
        self.extract_probabilities(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let shape = self.spec.shape();
        let zeros = InputTensor::new(
            shape,
            self.spec.layout,
            vec![0.0; shape.iter().product()],
        )?;
        let outputs = self.classify(&zeros)?;
        log::debug!("TractClassifier: model emits {} classes", outputs.len());
        self.spec.num_classes = Some(outputs.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_fails_to_load() {
        let spec = InputSpec {
            width: 8,
            height: 8,
            channel_order: crate::frame::ChannelOrder::Rgb,
            layout: crate::classify::TensorLayout::Nhwc,
            scaling: None,
            num_classes: None,
        };
        let err = TractClassifier::new("/definitely/not/here.onnx", spec)
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("failed to load ONNX model"));
    }

    #[test]
    fn probabilities_pass_through() {
        let probs = vec![0.1, 0.7, 0.2];
        assert_eq!(normalize_scores(probs.clone()), probs);
    }

    #[test]
    fn logits_are_softmaxed() {
        let probs = normalize_scores(vec![2.0, 1.0, -1.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }
}
