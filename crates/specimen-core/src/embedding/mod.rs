//! Embedding model adapter.
//!
//! The zero-shot core only needs two capabilities from a pretrained
//! vision-language model: embed an image, and embed a batch of strings into
//! the same space. [`EmbeddingModel`] captures exactly that, so the class
//! bank and classifier can be exercised with a fake model in tests.
//!
//! Neither capability promises normalized output; callers normalize.
//!
//! # Usage
//!
//! ```rust,ignore
//! use specimen_core::embedding::{ClipModel, EmbeddingModel};
//! use specimen_core::Config;
//!
//! let config = Config::default();
//! let model = ClipModel::load(&config.model, &config.model_dir())?;
//! let raw = model.encode_image(&decoded_image)?;
//! ```

pub(crate) mod preprocess;
pub(crate) mod text;
pub(crate) mod visual;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::ModelConfig;
use crate::error::ModelError;

use self::preprocess::preprocess;
use self::text::TextSession;
use self::visual::VisualSession;

/// The visual encoder ONNX model filename.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";
/// The text encoder ONNX model filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";
/// The tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// A pretrained image/text encoder pair.
pub trait EmbeddingModel: Send + Sync {
    /// Short identifier, recorded in the class bank cache metadata.
    fn name(&self) -> &str;

    /// Length of every vector this model produces.
    fn embedding_dim(&self) -> usize;

    /// Embed one decoded image. Output is not guaranteed to be normalized.
    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>, ModelError>;

    /// Embed a batch of strings, one vector per input in input order.
    /// Output is not guaranteed to be normalized.
    fn encode_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError>;
}

/// CLIP-family model (e.g. BioCLIP) exported to ONNX.
pub struct ClipModel {
    name: String,
    visual: VisualSession,
    text: TextSession,
    image_size: u32,
    embedding_dim: usize,
}

impl ClipModel {
    /// Load both encoders and the tokenizer from `{model_dir}/{name}/`.
    pub fn load(config: &ModelConfig, model_dir: &Path) -> Result<Self, ModelError> {
        let files = ModelFiles::new(config, model_dir);
        for path in files.all() {
            if !path.exists() {
                return Err(ModelError::Load {
                    path: path.to_path_buf(),
                    message: format!(
                        "Model file not found. Export the '{}' model to ONNX and place it here.",
                        config.name
                    ),
                });
            }
        }

        tracing::info!("Loading {} model from {:?}", config.name, files.dir);
        let visual = VisualSession::load(&files.visual, &config.visual_output)?;
        let text = TextSession::load(
            &files.text,
            &files.tokenizer,
            config.context_length,
            &config.text_output,
        )?;
        tracing::info!("{} model loaded successfully", config.name);

        Ok(Self {
            name: config.name.clone(),
            visual,
            text,
            image_size: config.image_size,
            embedding_dim: config.embedding_dim,
        })
    }
}

impl EmbeddingModel for ClipModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>, ModelError> {
        let tensor = preprocess(image, self.image_size);
        let embedding = self.visual.embed(&tensor)?;
        if embedding.len() != self.embedding_dim {
            return Err(ModelError::ImageEncode {
                message: format!(
                    "visual encoder produced {} dimensions, expected {}",
                    embedding.len(),
                    self.embedding_dim
                ),
            });
        }
        Ok(embedding)
    }

    fn encode_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let embeddings = self.text.encode_batch(texts)?;
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.embedding_dim) {
            return Err(ModelError::TextEncode {
                message: format!(
                    "text encoder produced {} dimensions, expected {}",
                    bad.len(),
                    self.embedding_dim
                ),
            });
        }
        Ok(embeddings)
    }
}

/// Expected on-disk layout of a model.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub dir: PathBuf,
    pub visual: PathBuf,
    pub text: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    pub fn new(config: &ModelConfig, model_dir: &Path) -> Self {
        let dir = model_dir.join(&config.name);
        Self {
            visual: dir.join(VISUAL_MODEL_FILENAME),
            text: dir.join(TEXT_MODEL_FILENAME),
            tokenizer: dir.join(TOKENIZER_FILENAME),
            dir,
        }
    }

    /// All required files.
    pub fn all(&self) -> [&Path; 3] {
        [
            self.visual.as_path(),
            self.text.as_path(),
            self.tokenizer.as_path(),
        ]
    }

    /// Whether every required file is present.
    pub fn complete(&self) -> bool {
        self.all().iter().all(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_files_layout() {
        let config = ModelConfig::default();
        let files = ModelFiles::new(&config, Path::new("/models"));
        assert_eq!(files.visual, PathBuf::from("/models/bioclip/visual.onnx"));
        assert_eq!(files.text, PathBuf::from("/models/bioclip/text_model.onnx"));
        assert_eq!(
            files.tokenizer,
            PathBuf::from("/models/bioclip/tokenizer.json")
        );
    }

    #[test]
    fn test_load_missing_model_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClipModel::load(&ModelConfig::default(), dir.path());
        match result {
            Err(ModelError::Load { path, .. }) => {
                assert!(path.ends_with("visual.onnx"));
            }
            Err(other) => panic!("expected load error, got {other}"),
            Ok(_) => panic!("expected load error"),
        }
        assert!(!ModelFiles::new(&ModelConfig::default(), dir.path()).complete());
    }
}
