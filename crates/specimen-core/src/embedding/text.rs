//! Text encoder for generating class-prompt embeddings.
//!
//! Loads the CLIP text ONNX model and tokenizer, encodes text strings to
//! vectors in the same space as the visual encoder. Outputs are raw; the
//! class bank normalizes them.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::ModelError;

/// Text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the visual encoder.
pub struct TextSession {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    context_length: usize,
    output_name: String,
    /// Some exports take an attention mask alongside the ids.
    wants_attention_mask: bool,
}

impl TextSession {
    /// Load the text encoder and its tokenizer.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        context_length: usize,
        output_name: &str,
    ) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to load text encoder model: {e}"),
            })?;

        let tokenizer =
            tokenizers::Tokenizer::from_file(tokenizer_path).map_err(|e| ModelError::Load {
                path: tokenizer_path.to_path_buf(),
                message: format!("Failed to load tokenizer: {e}"),
            })?;

        let wants_attention_mask = session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        tracing::debug!(
            "Loaded text encoder (inputs: {:?}, outputs: {:?})",
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            context_length,
            output_name: output_name.to_string(),
            wants_attention_mask,
        })
    }

    /// Encode a batch of text strings.
    ///
    /// Returns one raw vector per input text, in input order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }
        let max_length = self.context_length;

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::TextEncode {
                message: format!("Tokenization failed: {e}"),
            })?;

        // Zero-padded ids, truncated to the context length.
        let mut input_ids = vec![0i64; batch_size * max_length];
        let mut attention_mask = vec![0i64; batch_size * max_length];
        for (i, encoding) in encodings.iter().enumerate() {
            for (j, &id) in encoding.get_ids().iter().take(max_length).enumerate() {
                input_ids[i * max_length + j] = id as i64;
                attention_mask[i * max_length + j] = 1;
            }
        }

        let shape = vec![batch_size as i64, max_length as i64];
        let input_ids_value =
            Value::from_array((shape.clone(), input_ids)).map_err(|e| ModelError::TextEncode {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| ModelError::TextEncode {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let outputs = if self.wants_attention_mask {
            let mask_value =
                Value::from_array((shape, attention_mask)).map_err(|e| ModelError::TextEncode {
                    message: format!("Failed to create attention mask tensor: {e}"),
                })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        }
        .map_err(|e| ModelError::TextEncode {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| ModelError::TextEncode {
                message: "Text encoder produced no outputs".to_string(),
            })?;

        let (shape, data) =
            output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::TextEncode {
                    message: format!("Failed to extract {} tensor: {e}", output.0),
                })?;

        if shape.len() != 2 || shape[0] as usize != batch_size {
            return Err(ModelError::TextEncode {
                message: format!(
                    "Unexpected {} shape {:?} for batch of {}",
                    output.0, shape, batch_size
                ),
            });
        }
        split_rows(data, batch_size, shape[1] as usize)
    }
}

/// Split a flat row-major `[batch, dim]` buffer into one vector per row.
fn split_rows(data: &[f32], batch: usize, dim: usize) -> Result<Vec<Vec<f32>>, ModelError> {
    if dim == 0 || data.len() != batch * dim {
        return Err(ModelError::TextEncode {
            message: format!(
                "Text embedding buffer of {} values does not split into {batch} rows of {dim}",
                data.len()
            ),
        });
    }
    Ok(data.chunks(dim).map(<[f32]>::to_vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rows() {
        let rows = split_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_zero_width_output_is_rejected() {
        let err = split_rows(&[], 2, 0).unwrap_err();
        assert!(matches!(err, ModelError::TextEncode { .. }));
        assert!(split_rows(&[1.0, 2.0, 3.0], 2, 2).is_err());
    }
}
