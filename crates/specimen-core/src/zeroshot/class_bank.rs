//! Pre-computed class embeddings for zero-shot scoring.
//!
//! The class bank is a D×N matrix whose column `i` is the unit-length mean
//! of the prompt embeddings for label `i`. It is expensive to build (N×T text
//! encodes), so it is persisted as raw little-endian f32 (column after
//! column) with a `.meta` sidecar describing its shape.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, ArrayView1, ShapeBuilder};

use crate::config::CacheConfig;
use crate::embedding::EmbeddingModel;
use crate::error::ModelError;
use crate::math;

use super::species::label_digest;
use super::templates;

/// Labels between progress log lines during a rebuild.
const PROGRESS_EVERY: usize = 100;

/// How the persisted artifact is used.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Read and write the artifact at all
    pub enabled: bool,
    /// Compare label digest and model name in addition to the column count
    pub strict: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            strict: false,
        }
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            strict: config.strict,
        }
    }
}

/// Contents of the `.meta` sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMeta {
    pub column_count: usize,
    pub embedding_dim: usize,
    pub label_digest: String,
    pub model: String,
}

impl CacheMeta {
    /// Sidecar path for an artifact path.
    pub fn path_for(artifact: &Path) -> PathBuf {
        artifact.with_extension("meta")
    }

    /// Read the sidecar for an artifact without touching the payload.
    pub fn read(artifact: &Path) -> Result<Self, ModelError> {
        let meta_path = Self::path_for(artifact);
        let content = std::fs::read_to_string(&meta_path).map_err(|e| ModelError::Cache {
            path: meta_path.clone(),
            message: format!("cannot read metadata: {e}"),
        })?;

        let mut column_count = None;
        let mut embedding_dim = None;
        let mut digest = None;
        let mut model = None;
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "column_count" => column_count = value.trim().parse().ok(),
                "embedding_dim" => embedding_dim = value.trim().parse().ok(),
                "label_digest" => digest = Some(value.trim().to_string()),
                "model" => model = Some(value.trim().to_string()),
                _ => {}
            }
        }

        match (column_count, embedding_dim) {
            (Some(column_count), Some(embedding_dim)) => Ok(Self {
                column_count,
                embedding_dim,
                label_digest: digest.unwrap_or_default(),
                model: model.unwrap_or_default(),
            }),
            _ => Err(ModelError::Cache {
                path: meta_path,
                message: "metadata is missing column_count or embedding_dim".to_string(),
            }),
        }
    }

    fn render(&self) -> String {
        format!(
            "column_count={}\nembedding_dim={}\nlabel_digest={}\nmodel={}\n",
            self.column_count, self.embedding_dim, self.label_digest, self.model
        )
    }

    /// Decide whether a persisted bank can serve the given labels.
    ///
    /// The column count and embedding dimension must always match. Strict
    /// mode also requires the label digest and model name to match.
    pub fn check(
        &self,
        labels: &[String],
        model: &str,
        embedding_dim: usize,
        strict: bool,
    ) -> Result<(), String> {
        if self.column_count != labels.len() {
            return Err(format!(
                "size mismatch (saved: {}, current: {})",
                self.column_count,
                labels.len()
            ));
        }
        if self.embedding_dim != embedding_dim {
            return Err(format!(
                "dimension mismatch (saved: {}, model: {})",
                self.embedding_dim, embedding_dim
            ));
        }
        let digest = label_digest(labels);
        if self.label_digest != digest {
            if strict {
                return Err("label list changed since the cache was written".to_string());
            }
            tracing::warn!(
                "Cached class bank has the same size but a different label list; \
                 set cache.strict = true to rebuild on label changes"
            );
        }
        if strict && self.model != model {
            return Err(format!(
                "model mismatch (saved: {}, current: {})",
                self.model, model
            ));
        }
        Ok(())
    }
}

/// Class embedding matrix, D×N, one unit-length column per label.
#[derive(Debug, Clone)]
pub struct ClassBank {
    matrix: Array2<f32>,
}

impl ClassBank {
    /// Build a bank from per-class vectors (one column each).
    pub fn from_columns(columns: Vec<Vec<f32>>) -> Result<Self, ModelError> {
        let class_count = columns.len();
        let embedding_dim = columns.first().map(Vec::len).unwrap_or(0);
        if class_count == 0 || embedding_dim == 0 {
            return Err(ModelError::TextEncode {
                message: "cannot build a class bank with no classes or zero-length vectors"
                    .to_string(),
            });
        }
        if let Some((i, c)) = columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != embedding_dim)
        {
            return Err(ModelError::TextEncode {
                message: format!(
                    "class {i} has {} dimensions, expected {embedding_dim}",
                    c.len()
                ),
            });
        }

        let flat: Vec<f32> = columns.into_iter().flatten().collect();
        Self::from_column_major(flat, embedding_dim, class_count).map_err(|message| {
            ModelError::TextEncode { message }
        })
    }

    fn from_column_major(
        flat: Vec<f32>,
        embedding_dim: usize,
        class_count: usize,
    ) -> Result<Self, String> {
        Array2::from_shape_vec((embedding_dim, class_count).f(), flat)
            .map(|matrix| Self { matrix })
            .map_err(|e| format!("invalid class bank shape: {e}"))
    }

    /// Embed one label: encode every prompt, normalize each, average, and
    /// normalize the average.
    pub fn class_embedding(
        label: &str,
        model: &dyn EmbeddingModel,
    ) -> Result<Vec<f32>, ModelError> {
        let prompts = templates::expand(label);
        let raw = model.encode_text(&prompts)?;
        if raw.len() != prompts.len() {
            return Err(ModelError::TextEncode {
                message: format!(
                    "expected {} embeddings for '{label}', got {}",
                    prompts.len(),
                    raw.len()
                ),
            });
        }

        let normalized: Vec<Vec<f32>> = raw.iter().map(|v| math::l2_normalize(v)).collect();
        let mut mean = math::mean(&normalized).ok_or_else(|| ModelError::TextEncode {
            message: format!("embeddings for '{label}' are missing or of unequal length"),
        })?;
        math::l2_normalize_in_place(&mut mean);
        Ok(mean)
    }

    /// Compute the bank for all labels. Any failure aborts the whole build.
    ///
    /// `progress` is called with `(done, total)` after each label.
    pub fn compute(
        labels: &[String],
        model: &dyn EmbeddingModel,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Self, ModelError> {
        let total = labels.len();
        tracing::info!(
            "Computing class embeddings for {} species ({} prompts each)...",
            total,
            templates::TEMPLATE_COUNT
        );

        let mut columns = Vec::with_capacity(total);
        for (i, label) in labels.iter().enumerate() {
            if i % PROGRESS_EVERY == 0 {
                tracing::info!("  Processing {}/{}...", i, total);
            }
            columns.push(Self::class_embedding(label, model)?);
            progress(i + 1, total);
        }

        let bank = Self::from_columns(columns)?;
        tracing::info!(
            "Class bank ready: {} classes x {} dims",
            bank.class_count(),
            bank.embedding_dim()
        );
        Ok(bank)
    }

    /// Return the persisted bank if it matches `labels`, else recompute and
    /// persist it.
    ///
    /// Cache problems are never fatal: they are logged and resolved by
    /// recomputing. A failed save is logged and the fresh bank is returned.
    pub fn load_or_compute(
        labels: &[String],
        model: &dyn EmbeddingModel,
        path: &Path,
        policy: &CachePolicy,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Self, ModelError> {
        if policy.enabled && path.exists() {
            tracing::info!("Found cached class embeddings at {:?}...", path);
            match Self::load_checked(path, labels, model, policy.strict) {
                Ok(bank) => return Ok(bank),
                Err(e) => tracing::warn!("{e}. Recomputing..."),
            }
        }

        let bank = Self::compute(labels, model, progress)?;

        if policy.enabled {
            let meta = bank.meta_for(labels, model.name());
            if let Err(e) = bank.save(path, &meta) {
                tracing::warn!("Could not persist class bank: {e}");
            }
        }
        Ok(bank)
    }

    fn load_checked(
        path: &Path,
        labels: &[String],
        model: &dyn EmbeddingModel,
        strict: bool,
    ) -> Result<Self, ModelError> {
        let meta = CacheMeta::read(path)?;
        meta.check(labels, model.name(), model.embedding_dim(), strict)
            .map_err(|message| ModelError::Cache {
                path: path.to_path_buf(),
                message,
            })?;
        let (bank, _) = Self::load(path)?;
        Ok(bank)
    }

    /// Sidecar metadata describing this bank.
    pub fn meta_for(&self, labels: &[String], model: &str) -> CacheMeta {
        CacheMeta {
            column_count: self.class_count(),
            embedding_dim: self.embedding_dim(),
            label_digest: label_digest(labels),
            model: model.to_string(),
        }
    }

    /// Save the bank and its sidecar, replacing any previous artifact.
    pub fn save(&self, path: &Path, meta: &CacheMeta) -> Result<(), ModelError> {
        let cache_err = |message: String| ModelError::Cache {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| cache_err(format!("cannot create directory: {e}")))?;
        }

        // Drop the old sidecar first so a half-written payload is never
        // described by stale metadata.
        let meta_path = CacheMeta::path_for(path);
        match std::fs::remove_file(&meta_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(cache_err(format!("cannot replace metadata: {e}"))),
        }

        let bytes: Vec<u8> = self
            .matrix
            .columns()
            .into_iter()
            .flat_map(|col| col.iter().flat_map(|f| f.to_le_bytes()).collect::<Vec<_>>())
            .collect();
        std::fs::write(path, &bytes).map_err(|e| cache_err(format!("cannot write: {e}")))?;
        std::fs::write(&meta_path, meta.render())
            .map_err(|e| cache_err(format!("cannot write metadata: {e}")))?;

        tracing::info!(
            "Saved class embeddings to {:?} ({:.1} KB)",
            path,
            bytes.len() as f64 / 1024.0
        );
        Ok(())
    }

    /// Read only the sidecar of a persisted bank.
    pub fn inspect(path: &Path) -> Result<CacheMeta, ModelError> {
        CacheMeta::read(path)
    }

    /// Load a bank and its sidecar, validating the payload length.
    pub fn load(path: &Path) -> Result<(Self, CacheMeta), ModelError> {
        let meta = CacheMeta::read(path)?;
        let cache_err = |message: String| ModelError::Cache {
            path: path.to_path_buf(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| cache_err(format!("cannot read: {e}")))?;
        let expected_len = meta.column_count * meta.embedding_dim * 4;
        if meta.column_count == 0 || meta.embedding_dim == 0 || bytes.len() != expected_len {
            return Err(cache_err(format!(
                "corrupt payload: expected {} bytes ({} x {}), got {}",
                expected_len,
                meta.embedding_dim,
                meta.column_count,
                bytes.len()
            )));
        }

        let flat: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let bank = Self::from_column_major(flat, meta.embedding_dim, meta.column_count)
            .map_err(cache_err)?;

        tracing::info!(
            "Loaded class bank: {} classes x {} dims from {:?}",
            meta.column_count,
            meta.embedding_dim,
            path
        );
        Ok((bank, meta))
    }

    /// Delete the artifact and its sidecar. Missing files are not an error.
    pub fn remove(path: &Path) -> std::io::Result<()> {
        for p in [path.to_path_buf(), CacheMeta::path_for(path)] {
            match std::fs::remove_file(&p) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Similarity of an image vector with every class (length N).
    ///
    /// The image vector must have `embedding_dim` elements.
    pub fn similarities(&self, image: &[f32]) -> Array1<f32> {
        ArrayView1::from(image).dot(&self.matrix)
    }

    /// Column for class `index`.
    pub fn column(&self, index: usize) -> ArrayView1<'_, f32> {
        self.matrix.column(index)
    }

    /// The full D×N matrix.
    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }

    /// Number of classes (N).
    pub fn class_count(&self) -> usize {
        self.matrix.ncols()
    }

    /// Embedding dimension (D).
    pub fn embedding_dim(&self) -> usize {
        self.matrix.nrows()
    }
}
