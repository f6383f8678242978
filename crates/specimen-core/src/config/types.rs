//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for the database, cache artifact, species file and media
    pub data_dir: PathBuf,

    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/.specimen"),
            model_dir: PathBuf::from("~/.specimen/models"),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name; also the subdirectory of `model_dir` holding the files
    pub name: String,

    /// Square image input size expected by the visual encoder
    pub image_size: u32,

    /// Token sequence length expected by the text encoder
    pub context_length: usize,

    /// Dimension of the shared image/text embedding space
    pub embedding_dim: usize,

    /// Output tensor to read from the visual encoder
    pub visual_output: String,

    /// Output tensor to read from the text encoder
    pub text_output: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "bioclip".to_string(),
            image_size: 224,
            context_length: 77,
            embedding_dim: 512,
            visual_output: "image_embeds".to_string(),
            text_output: "text_embeds".to_string(),
        }
    }
}

/// Species catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file with one array of names per group
    pub species_file: PathBuf,

    /// Groups to read from the JSON file, concatenated in this order
    pub groups: Vec<String>,

    /// Labels used when the species file is missing or unreadable
    pub fallback: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            species_file: PathBuf::from("species.json"),
            groups: vec!["plants".to_string(), "insects".to_string()],
            fallback: vec![
                "black iris".to_string(),
                "bee".to_string(),
                "beetle".to_string(),
            ],
        }
    }
}

/// Class bank cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether to read and write the persisted class bank
    pub enabled: bool,

    /// Artifact path; a `.meta` sidecar is written next to it
    pub path: PathBuf,

    /// Also require the label digest and model name to match.
    /// Off by default: only the column count is compared.
    pub strict: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("species_embeddings.bin"),
            strict: false,
        }
    }
}

/// Zero-shot classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Multiplier applied to cosine similarities before softmax
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            temperature: 100.0,
        }
    }
}

/// Limits applied to uploaded images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 20,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Directory uploaded images are stored under
    pub media_root: PathBuf,

    /// URL prefix the media root is served at
    pub media_url: String,

    /// Session lifetime in minutes
    pub session_ttl_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            session_ttl_minutes: 60 * 24 * 14,
        }
    }
}

/// Observation database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("specimen.db"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
