//! Cheap checks run before an upload is decoded.

use crate::config::LimitsConfig;
use crate::error::{IntakeError, IntakeResult};

/// Bytes needed to recognize every supported signature.
const HEADER_LEN: usize = 12;

/// Rejects oversized or obviously non-image payloads.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate an in-memory upload: size limit, then magic bytes.
    pub fn validate_bytes(&self, bytes: &[u8], name: &str) -> IntakeResult<()> {
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if bytes.len() as u64 > max_bytes {
            return Err(IntakeError::FileTooLarge {
                name: name.to_string(),
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        if bytes.len() < 4 {
            return Err(IntakeError::Decode {
                name: name.to_string(),
                message: "File too small to be a valid image".to_string(),
            });
        }

        let header = &bytes[..bytes.len().min(HEADER_LEN)];
        if !has_image_signature(header) {
            return Err(IntakeError::UnsupportedFormat {
                name: name.to_string(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }
}

/// Whether a header matches a known image signature.
fn has_image_signature(header: &[u8]) -> bool {
    match header {
        // JPEG
        [0xFF, 0xD8, 0xFF, ..] => true,
        // PNG
        [0x89, b'P', b'N', b'G', ..] => true,
        // GIF
        [b'G', b'I', b'F', b'8', ..] => true,
        // WebP; a RIFF header cut short is given the benefit of the doubt
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
        [b'R', b'I', b'F', b'F', rest @ ..] => rest.len() < 8,
        // BMP
        [b'B', b'M', ..] => true,
        // TIFF, little- and big-endian
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
        // HEIF/AVIF: ftyp box at offset 4
        [_, _, _, _, b'f', b't', b'y', b'p', _, _, _, _, ..] => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(LimitsConfig::default())
    }

    #[test]
    fn test_signatures() {
        assert!(has_image_signature(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(has_image_signature(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]));
        assert!(has_image_signature(b"RIFF\0\0\0\0WEBP"));
        assert!(!has_image_signature(b"RIFF\0\0\0\0WAVE"));
        assert!(has_image_signature(&[b'I', b'I', 0x2A, 0x00]));
        assert!(!has_image_signature(&[b'I', b'I', 0x00, 0x00]));
        assert!(!has_image_signature(&[b'M', b'M', 0x00, 0x00]));
        assert!(has_image_signature(b"\0\0\0\x1cftypavif"));
        assert!(!has_image_signature(&[0u8; 12]));
    }

    #[test]
    fn test_text_payload_rejected() {
        let result = validator().validate_bytes(b"hello, world!", "notes.jpg");
        assert!(matches!(result, Err(IntakeError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_tiny_payload_rejected() {
        let result = validator().validate_bytes(&[0xFF, 0xD8], "tiny.jpg");
        assert!(matches!(result, Err(IntakeError::Decode { .. })));
    }

    #[test]
    fn test_size_limit() {
        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let mut bytes = vec![0u8; 1024 * 1024 + 1];
        bytes[..4].copy_from_slice(&[0x89, b'P', b'N', b'G']);
        let result = Validator::new(limits).validate_bytes(&bytes, "big.png");
        assert!(matches!(result, Err(IntakeError::FileTooLarge { max_mb: 1, .. })));
    }
}
