//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Upper bound for `limits.max_file_size_mb` (1 GiB).
pub const MAX_FILE_SIZE_MB: u64 = 1024;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.name must not be empty".into(),
            ));
        }
        if self.model.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.image_size must be > 0".into(),
            ));
        }
        if self.model.context_length == 0 {
            return Err(ConfigError::ValidationError(
                "model.context_length must be > 0".into(),
            ));
        }
        if self.model.embedding_dim == 0 {
            return Err(ConfigError::ValidationError(
                "model.embedding_dim must be > 0".into(),
            ));
        }
        if !(self.classifier.temperature.is_finite() && self.classifier.temperature > 0.0) {
            return Err(ConfigError::ValidationError(
                "classifier.temperature must be a positive number".into(),
            ));
        }
        if self.catalog.groups.is_empty() {
            return Err(ConfigError::ValidationError(
                "catalog.groups must name at least one group".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 || self.limits.max_file_size_mb > MAX_FILE_SIZE_MB {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_file_size_mb must be between 1 and {MAX_FILE_SIZE_MB}"
            )));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.server.session_ttl_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "server.session_ttl_minutes must be > 0".into(),
            ));
        }
        let media_url = &self.server.media_url;
        if media_url.len() < 3 || !media_url.starts_with('/') || !media_url.ends_with('/') {
            return Err(ConfigError::ValidationError(
                "server.media_url must be a path like '/media/'".into(),
            ));
        }
        Ok(())
    }
}
