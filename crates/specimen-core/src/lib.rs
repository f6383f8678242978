//! Specimen Core - zero-shot species classification for field observations.
//!
//! A user uploads a photo of a plant or insect; Specimen predicts its species
//! by comparing a pretrained vision-language embedding of the photo against
//! text embeddings of every known species name. No classifier is trained:
//! adding a species is adding a line to the species file.
//!
//! # Architecture
//!
//! ```text
//! species.json → SpeciesCatalog → prompt templates → text encoder → ClassBank (cached)
//! upload → Validator → ImageDecoder → image encoder → ZeroShotClassifier → Classification
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use specimen_core::embedding::ClipModel;
//! use specimen_core::{Config, ImageProcessor, SpeciesClassifier};
//!
//! #[tokio::main]
//! async fn main() -> specimen_core::Result<()> {
//!     let config = Config::load()?;
//!     let model = Arc::new(ClipModel::load(&config.model, &config.model_dir())?);
//!     let classifier = Arc::new(SpeciesClassifier::initialize(&config, model)?);
//!     let processor = ImageProcessor::new(&config, classifier);
//!
//!     let result = processor.classify_path("./fern.jpg".as_ref()).await;
//!     println!("{} ({:.1}%)", result.label(), result.confidence_percent());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod math;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod zeroshot;

// Re-exports for convenient access
pub use config::Config;
pub use embedding::{ClipModel, EmbeddingModel};
pub use error::{
    CatalogError, ConfigError, IntakeError, IntakeResult, ModelError, Result, SpecimenError,
    StoreError,
};
pub use media::MediaStore;
pub use output::{OutputFormat, RecordWriter};
pub use pipeline::ImageProcessor;
pub use store::{Database, NewObservation, Observation, ObservationFilter, ObservationSink, User};
pub use types::{Classification, ClassificationRecord};
pub use zeroshot::{ClassBank, SpeciesCatalog, SpeciesClassifier};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
