//! Visual encoder ONNX session management and inference.
//!
//! Loads a CLIP-family visual tower exported to ONNX and runs inference to
//! produce one raw (unnormalized) image embedding.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::ModelError;

/// Wraps an ONNX Runtime session for the visual encoder.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct VisualSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    /// Preferred output tensor; falls back to the first output.
    output_name: String,
}

impl VisualSession {
    /// Load a visual encoder from an ONNX file.
    pub fn load(model_path: &Path, output_name: &str) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded visual encoder from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name: output_name.to_string(),
        })
    }

    /// Run inference on a preprocessed image tensor and return the embedding.
    ///
    /// Input shape: \[1, 3, image_size, image_size\] (NCHW, CLIP-normalized).
    pub fn embed(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| ModelError::ImageEncode {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| ModelError::ImageEncode {
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| ModelError::ImageEncode {
            message: format!("ONNX inference failed: {e}"),
        })?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| ModelError::ImageEncode {
                message: "Visual encoder produced no outputs".to_string(),
            })?;

        let (shape, data) =
            output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::ImageEncode {
                    message: format!("Failed to extract {} tensor: {e}", output.0),
                })?;

        // [1, D] or [D]: one embedding either way.
        match shape.len() {
            1 => Ok(data.to_vec()),
            2 => {
                let dim = shape[1] as usize;
                Ok(data[..dim].to_vec())
            }
            _ => Err(ModelError::ImageEncode {
                message: format!("Unexpected {} shape: {:?}", output.0, shape),
            }),
        }
    }
}
