//! Image decoding with format detection, dimension limits and a timeout.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::{IntakeError, IntakeResult};

/// Image decoder with configurable limits and timeout.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory buffer on the blocking pool, bounded by the
    /// configured timeout.
    ///
    /// `name` identifies the image in errors and logs.
    pub async fn decode_from_bytes(&self, bytes: Vec<u8>, name: &str) -> IntakeResult<DecodedImage> {
        let name_owned = name.to_string();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || decode_bytes_sync(bytes, &name_owned)).await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                if decoded.width > self.limits.max_image_dimension
                    || decoded.height > self.limits.max_image_dimension
                {
                    return Err(IntakeError::ImageTooLarge {
                        name: name.to_string(),
                        width: decoded.width,
                        height: decoded.height,
                        max_dim: self.limits.max_image_dimension,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(IntakeError::Decode {
                name: name.to_string(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(IntakeError::Timeout {
                name: name.to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }
}

/// Synchronous decode; runs inside `spawn_blocking`.
fn decode_bytes_sync(bytes: Vec<u8>, name: &str) -> IntakeResult<DecodedImage> {
    use std::io::Cursor;

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| IntakeError::Decode {
            name: name.to_string(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = match reader.format() {
        Some(f) => f,
        None => ImageFormat::from_path(name).map_err(|_| IntakeError::UnsupportedFormat {
            name: name.to_string(),
            message: "unrecognized image data".to_string(),
        })?,
    };
    let image = reader.decode().map_err(|e| IntakeError::Decode {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        image,
        format,
        width,
        height,
    })
}

/// File name for messages, falling back to the full path.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
