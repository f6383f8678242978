//! Zero-shot species classification.
//!
//! Labels are turned into class embeddings once (prompt templates, text
//! encoder, averaging), cached on disk, and every image is scored against
//! the resulting matrix with a temperature-scaled softmax.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use specimen_core::embedding::ClipModel;
//! use specimen_core::{Config, SpeciesClassifier};
//!
//! let config = Config::load()?;
//! let model = Arc::new(ClipModel::load(&config.model, &config.model_dir())?);
//! let classifier = SpeciesClassifier::initialize(&config, model)?;
//! let result = classifier.classify_image(&image);
//! println!("{} ({:.1}%)", result.label(), result.confidence_percent());
//! ```

pub mod class_bank;
pub mod classifier;
pub mod species;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use image::DynamicImage;

use crate::config::{ClassifierConfig, Config};
use crate::embedding::EmbeddingModel;
use crate::error::{ModelError, Result};
use crate::types::Classification;

pub use class_bank::{CacheMeta, CachePolicy, ClassBank};
pub use classifier::{Prediction, ZeroShotClassifier};
pub use species::{CatalogSource, SpeciesCatalog};

/// Classification service: a model, its label set and the matching class
/// bank.
///
/// Built once at startup and shared behind an `Arc`; every method takes
/// `&self`.
pub struct SpeciesClassifier {
    model: Arc<dyn EmbeddingModel>,
    catalog: SpeciesCatalog,
    classifier: ZeroShotClassifier,
}

impl SpeciesClassifier {
    /// Load the species catalog and load or compute the class bank.
    pub fn initialize(config: &Config, model: Arc<dyn EmbeddingModel>) -> Result<Self> {
        Self::initialize_with_progress(config, model, &mut |_, _| {})
    }

    /// Same as [`initialize`](Self::initialize), reporting `(done, total)`
    /// while the class bank is being computed.
    pub fn initialize_with_progress(
        config: &Config,
        model: Arc<dyn EmbeddingModel>,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Self> {
        let catalog = SpeciesCatalog::load(&config.catalog, &config.species_file())?;
        let bank = ClassBank::load_or_compute(
            catalog.labels(),
            model.as_ref(),
            &config.cache_path(),
            &CachePolicy::from(&config.cache),
            progress,
        )?;
        Ok(Self::from_parts(model, catalog, bank, &config.classifier)?)
    }

    /// Assemble a service from already-built parts.
    pub fn from_parts(
        model: Arc<dyn EmbeddingModel>,
        catalog: SpeciesCatalog,
        bank: ClassBank,
        config: &ClassifierConfig,
    ) -> std::result::Result<Self, ModelError> {
        let classifier =
            ZeroShotClassifier::new(catalog.labels().to_vec(), bank, config.temperature)?;
        Ok(Self {
            model,
            catalog,
            classifier,
        })
    }

    /// Encode and score an image, surfacing any failure.
    pub fn try_classify_image(
        &self,
        image: &DynamicImage,
    ) -> std::result::Result<Prediction, ModelError> {
        let embedding = self.model.encode_image(image)?;
        self.classifier.classify(&embedding)
    }

    /// Encode and score an image. Failures become [`Classification::Failed`].
    pub fn classify_image(&self, image: &DynamicImage) -> Classification {
        match self.try_classify_image(image) {
            Ok(prediction) => {
                tracing::debug!(
                    "Predicted {} ({:.1}%)",
                    prediction.label,
                    prediction.confidence * 100.0
                );
                Classification::Identified {
                    label: prediction.label,
                    confidence: prediction.confidence,
                }
            }
            Err(e) => {
                tracing::warn!("Classification failed: {e}");
                Classification::failed(e.to_string())
            }
        }
    }

    /// Full probability vector, in label order.
    pub fn probabilities(&self, image: &DynamicImage) -> std::result::Result<Vec<f32>, ModelError> {
        let embedding = self.model.encode_image(image)?;
        self.classifier.probabilities(&embedding)
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    pub fn bank(&self) -> &ClassBank {
        self.classifier.bank()
    }

    pub fn temperature(&self) -> f32 {
        self.classifier.temperature()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecimenError;
    use image::{Rgb, RgbImage};
    use testing::KeywordModel;

    fn config_in(dir: &std::path::Path, species_json: Option<&str>) -> Config {
        let mut config = Config::default();
        config.general.data_dir = dir.to_path_buf();
        if let Some(json) = species_json {
            std::fs::write(dir.join("species.json"), json).unwrap();
        }
        config
    }

    fn image_for(index: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([index, 0, 0])))
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initialize_from_species_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            Some(r#"{"plants": ["oak", "fern"], "insects": ["bee"]}"#),
        );
        let names = labels(&["oak", "fern", "bee"]);
        let model = Arc::new(KeywordModel::new(&names));

        let service = SpeciesClassifier::initialize(&config, model.clone()).unwrap();
        assert_eq!(service.labels(), names.as_slice());
        assert_eq!(service.bank().class_count(), 3);
        assert_eq!(model.texts_encoded(), 3 * templates::TEMPLATE_COUNT);
        assert!(config.cache_path().exists());
    }

    #[test]
    fn test_second_start_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), Some(r#"{"plants": ["oak", "fern"]}"#));
        let names = labels(&["oak", "fern"]);

        SpeciesClassifier::initialize(&config, Arc::new(KeywordModel::new(&names))).unwrap();
        let model = Arc::new(KeywordModel::new(&names));
        SpeciesClassifier::initialize(&config, model.clone()).unwrap();
        assert_eq!(model.texts_encoded(), 0);
    }

    #[test]
    fn test_missing_species_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), None);
        let names = labels(&["black iris", "bee", "beetle"]);

        let service =
            SpeciesClassifier::initialize(&config, Arc::new(KeywordModel::new(&names))).unwrap();
        assert_eq!(service.labels(), names.as_slice());
        assert_eq!(service.catalog().source(), &CatalogSource::Fallback);
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), Some(r#"{"plants": [], "insects": []}"#));
        let result = SpeciesClassifier::initialize(&config, Arc::new(KeywordModel::new(&[])));
        assert!(matches!(result, Err(SpecimenError::Catalog(_))));
    }

    #[test]
    fn test_recompute_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), Some(r#"{"plants": ["oak", "fern"]}"#));
        let model = KeywordModel::new(&labels(&["oak", "fern"])).failing_text_on("fern");
        let result = SpeciesClassifier::initialize(&config, Arc::new(model));
        assert!(matches!(result, Err(SpecimenError::Model(_))));
    }

    #[test]
    fn test_classify_image_picks_matching_species() {
        let names = labels(&["oak", "fern", "bee"]);
        let model = Arc::new(KeywordModel::new(&names));
        let bank = ClassBank::compute(&names, model.as_ref(), &mut |_, _| {}).unwrap();
        let catalog = SpeciesCatalog::from_labels(names.clone()).unwrap();
        let service =
            SpeciesClassifier::from_parts(model, catalog, bank, &ClassifierConfig::default())
                .unwrap();

        let result = service.classify_image(&image_for(2));
        assert_eq!(result.label(), "bee");
        assert!(result.is_identified());
        assert!(result.confidence() > 0.5 && result.confidence() <= 1.0);

        let probs = service.probabilities(&image_for(0)).unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_encode_failure_yields_sentinel() {
        let names = labels(&["oak", "fern"]);
        let bank =
            ClassBank::compute(&names, &KeywordModel::new(&names), &mut |_, _| {}).unwrap();
        let model = Arc::new(KeywordModel::new(&names).failing_images());
        let catalog = SpeciesCatalog::from_labels(names).unwrap();
        let service =
            SpeciesClassifier::from_parts(model, catalog, bank, &ClassifierConfig::default())
                .unwrap();

        let result = service.classify_image(&image_for(0));
        assert_eq!(result.label(), Classification::FAILURE_LABEL);
        assert_eq!(result.confidence(), 0.0);
    }

    #[test]
    fn test_bank_from_other_model_yields_sentinel() {
        let small = labels(&["oak", "fern"]);
        // Two columns, but sized for a model with a wider embedding space.
        let wide_bank = ClassBank::from_columns(vec![vec![1.0, 0.0, 0.0, 0.0, 0.0]; 2]).unwrap();
        let model = Arc::new(KeywordModel::new(&small));
        let catalog = SpeciesCatalog::from_labels(small).unwrap();
        let service =
            SpeciesClassifier::from_parts(model, catalog, wide_bank, &ClassifierConfig::default())
                .unwrap();
        assert!(!service.classify_image(&image_for(0)).is_identified());
    }

    #[test]
    fn test_nan_embedding_yields_sentinel() {
        let names = labels(&["oak", "fern"]);
        let bank =
            ClassBank::compute(&names, &KeywordModel::new(&names), &mut |_, _| {}).unwrap();
        let model = Arc::new(KeywordModel::new(&names).non_finite_images());
        let catalog = SpeciesCatalog::from_labels(names).unwrap();
        let service = SpeciesClassifier::from_parts(
            model.clone(),
            catalog,
            bank,
            &ClassifierConfig::default(),
        )
        .unwrap();

        let result = service.classify_image(&image_for(1));
        assert!(matches!(result, Classification::Failed { .. }));
        assert_eq!(result.label(), Classification::FAILURE_LABEL);
        assert_eq!(result.confidence(), 0.0);
        assert_eq!(model.images_encoded(), 1);
    }
}
