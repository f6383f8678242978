//! Upload orchestration: validate, decode, classify.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::IntakeError;
use crate::types::Classification;
use crate::zeroshot::SpeciesClassifier;

use super::decode::{display_name, ImageDecoder};
use super::validate::Validator;

/// Turns raw image bytes into a [`Classification`].
///
/// Never returns an error: any intake or inference failure is reported as
/// [`Classification::Failed`] and logged at `warn`.
#[derive(Clone)]
pub struct ImageProcessor {
    classifier: Arc<SpeciesClassifier>,
    decoder: ImageDecoder,
    validator: Validator,
}

impl ImageProcessor {
    pub fn new(config: &Config, classifier: Arc<SpeciesClassifier>) -> Self {
        Self {
            classifier,
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
        }
    }

    /// Classify an uploaded image held in memory.
    pub async fn classify_bytes(&self, bytes: Vec<u8>, name: &str) -> Classification {
        let start = std::time::Instant::now();
        tracing::debug!("Classifying: {}", name);

        if let Err(e) = self.validator.validate_bytes(&bytes, name) {
            tracing::warn!("Rejected {}: {}", name, e);
            return Classification::failed(e.to_string());
        }

        let decode_start = std::time::Instant::now();
        let decoded = match self.decoder.decode_from_bytes(bytes, name).await {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Could not decode {}: {}", name, e);
                return Classification::failed(e.to_string());
            }
        };
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let classify_start = std::time::Instant::now();
        let classifier = Arc::clone(&self.classifier);
        let result =
            tokio::task::spawn_blocking(move || classifier.classify_image(&decoded.image)).await;
        tracing::trace!("  Classify: {:?}", classify_start.elapsed());

        let classification = match result {
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!("Classification task for {} failed: {}", name, e);
                Classification::failed(format!("Task join error: {}", e))
            }
        };

        tracing::debug!(
            "Classified {} as {} ({:.1}%) in {:?}",
            name,
            classification.label(),
            classification.confidence_percent(),
            start.elapsed()
        );
        classification
    }

    /// Classify an image file on disk.
    pub async fn classify_path(&self, path: &Path) -> Classification {
        let name = display_name(path);
        match tokio::fs::read(path).await {
            Ok(bytes) => self.classify_bytes(bytes, &name).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let e = IntakeError::FileNotFound(path.to_path_buf());
                tracing::warn!("{}", e);
                Classification::failed(e.to_string())
            }
            Err(e) => {
                tracing::warn!("Could not read {:?}: {}", path, e);
                Classification::failed(format!("Cannot read file: {}", e))
            }
        }
    }

    pub fn classifier(&self) -> &SpeciesClassifier {
        &self.classifier
    }
}
