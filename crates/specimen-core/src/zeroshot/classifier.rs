//! Zero-shot scoring of an image embedding against the class bank.

use crate::error::ModelError;
use crate::math;

use super::class_bank::ClassBank;

/// Highest-probability class for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Column of the winning class
    pub index: usize,
    /// Label of the winning class
    pub label: String,
    /// Softmax probability of the winning class, in `[0, 1]`
    pub confidence: f32,
}

/// Scores normalized image embeddings against a fixed label set.
///
/// `labels[i]` names column `i` of the bank.
#[derive(Debug, Clone)]
pub struct ZeroShotClassifier {
    labels: Vec<String>,
    bank: ClassBank,
    temperature: f32,
}

impl ZeroShotClassifier {
    pub fn new(labels: Vec<String>, bank: ClassBank, temperature: f32) -> Result<Self, ModelError> {
        if labels.len() != bank.class_count() {
            return Err(ModelError::LabelMismatch {
                labels: labels.len(),
                columns: bank.class_count(),
            });
        }
        Ok(Self {
            labels,
            bank,
            temperature,
        })
    }

    /// Probability distribution over all labels for a raw image embedding.
    ///
    /// The embedding is normalized here, so callers may pass encoder output
    /// directly.
    pub fn probabilities(&self, image_embedding: &[f32]) -> Result<Vec<f32>, ModelError> {
        if image_embedding.len() != self.bank.embedding_dim() {
            return Err(ModelError::ImageEncode {
                message: format!(
                    "image embedding has {} dimensions but the class bank has {}",
                    image_embedding.len(),
                    self.bank.embedding_dim()
                ),
            });
        }

        if !image_embedding.iter().all(|x| x.is_finite()) {
            return Err(ModelError::ImageEncode {
                message: "image embedding contains non-finite values".to_string(),
            });
        }

        let unit = math::l2_normalize(image_embedding);
        let logits: Vec<f32> = self
            .bank
            .similarities(&unit)
            .iter()
            .map(|s| s * self.temperature)
            .collect();
        let probs = math::softmax(&logits);
        if !probs.iter().all(|p| p.is_finite()) {
            return Err(ModelError::ImageEncode {
                message: "class probabilities are not finite".to_string(),
            });
        }
        Ok(probs)
    }

    /// Most probable label. Ties go to the lowest index.
    pub fn classify(&self, image_embedding: &[f32]) -> Result<Prediction, ModelError> {
        let probs = self.probabilities(image_embedding)?;
        let index = math::argmax(&probs).ok_or_else(|| ModelError::ImageEncode {
            message: "no classes to score".to_string(),
        })?;
        Ok(Prediction {
            index,
            label: self.labels[index].clone(),
            confidence: probs[index],
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn bank(&self) -> &ClassBank {
        &self.bank
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}
