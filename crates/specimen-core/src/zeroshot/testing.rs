//! Deterministic stand-in for a real image/text encoder.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;

use crate::embedding::EmbeddingModel;
use crate::error::ModelError;

use super::templates;

/// Fake model whose embedding space has one axis per known label plus a
/// noise axis.
///
/// A prompt generated from label `i` embeds near axis `i`, with a small
/// template-dependent component on the noise axis. An image embeds on the
/// axis selected by the red channel of its top-left pixel.
pub struct KeywordModel {
    labels: Vec<String>,
    texts: AtomicUsize,
    images: AtomicUsize,
    fail_text_on: Option<String>,
    fail_images: bool,
    nan_images: bool,
}

impl KeywordModel {
    pub fn new(labels: &[String]) -> Self {
        Self {
            labels: labels.to_vec(),
            texts: AtomicUsize::new(0),
            images: AtomicUsize::new(0),
            fail_text_on: None,
            fail_images: false,
            nan_images: false,
        }
    }

    pub fn failing_text_on(mut self, label: &str) -> Self {
        self.fail_text_on = Some(label.to_string());
        self
    }

    pub fn failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }

    /// Image embeddings come back full of NaN.
    pub fn non_finite_images(mut self) -> Self {
        self.nan_images = true;
        self
    }

    pub fn dim(&self) -> usize {
        self.labels.len() + 1
    }

    pub fn texts_encoded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }

    pub fn images_encoded(&self) -> usize {
        self.images.load(Ordering::SeqCst)
    }

    fn axis_for(&self, prompt: &str) -> Option<(usize, usize)> {
        self.labels.iter().enumerate().find_map(|(i, label)| {
            templates::expand(label)
                .iter()
                .position(|p| p == prompt)
                .map(|t| (i, t))
        })
    }
}

impl EmbeddingModel for KeywordModel {
    fn name(&self) -> &str {
        "keyword"
    }

    fn embedding_dim(&self) -> usize {
        self.dim()
    }

    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>, ModelError> {
        if self.fail_images {
            return Err(ModelError::ImageEncode {
                message: "image encoder unavailable".to_string(),
            });
        }
        self.images.fetch_add(1, Ordering::SeqCst);
        if self.nan_images {
            return Ok(vec![f32::NAN; self.dim()]);
        }
        let red = image.to_rgb8().get_pixel(0, 0)[0] as usize;
        let mut v = vec![0.0; self.dim()];
        v[red % self.labels.len().max(1)] = 3.0;
        Ok(v)
    }

    fn encode_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            if let Some(bad) = &self.fail_text_on {
                if text.contains(bad.as_str()) {
                    return Err(ModelError::TextEncode {
                        message: format!("cannot encode '{text}'"),
                    });
                }
            }
            self.texts.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0; self.dim()];
            if let Some((axis, template)) = self.axis_for(text) {
                v[axis] = 2.0;
                v[self.labels.len()] = 0.1 * template as f32;
            } else {
                v[self.labels.len()] = 1.0;
            }
            out.push(v);
        }
        Ok(out)
    }
}
