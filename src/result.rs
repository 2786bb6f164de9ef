//! Probability vector → classification result.

use anyhow::{anyhow, Result};

use crate::labels::{DisplayEntry, DisplayTable, LabelSet, StatusCategory};

/// Outcome of classifying one frame. Built fresh every iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    /// Index into the label set.
    pub index: usize,
    pub label: String,
    /// Percentage in `[0, 100]`.
    pub confidence: f32,
    pub status: StatusCategory,
    /// One entry per label, in label-set order.
    pub probabilities: Vec<f32>,
}

/// Maps raw classifier output onto labels and display entries.
#[derive(Clone, Debug)]
pub struct ResultMapper {
    labels: LabelSet,
    table: DisplayTable,
}

impl ResultMapper {
    pub fn new(labels: LabelSet, table: DisplayTable) -> Self {
        Self { labels, table }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn table(&self) -> &DisplayTable {
        &self.table
    }

    pub fn map(&self, probabilities: &[f32]) -> Result<ClassificationResult> {
        if probabilities.len() != self.labels.len() {
            return Err(anyhow!(
                "classifier returned {} probabilities for {} labels",
                probabilities.len(),
                self.labels.len()
            ));
        }
        let index = argmax(probabilities)
            .ok_or_else(|| anyhow!("classifier returned no usable probabilities"))?;
        let label = self
            .labels
            .get(index)
            .ok_or_else(|| anyhow!("label index {} out of range", index))?
            .to_string();
        let confidence = (probabilities[index] * 100.0).clamp(0.0, 100.0);
        Ok(ClassificationResult {
            index,
            status: StatusCategory::from_label(&label),
            label,
            confidence,
            probabilities: probabilities.to_vec(),
        })
    }

    /// Display entry for the predicted label.
    pub fn display(&self, result: &ClassificationResult) -> DisplayEntry {
        self.table.lookup(&result.label)
    }
}

/// Index of the largest value; the first index wins ties and NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}
