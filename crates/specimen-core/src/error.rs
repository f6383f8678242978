//! Error types for Specimen.
//!
//! Errors are organized by concern so that startup failures (model, catalog,
//! store) can be told apart from per-upload intake failures, which the upload
//! path downgrades to a failed classification instead of propagating.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Specimen operations.
#[derive(Error, Debug)]
pub enum SpecimenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Embedding model and class bank errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Species catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Image intake errors
    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    /// Observation / user store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from the embedding model adapter and the class bank.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Model files missing or the ONNX session could not be created
    #[error("Failed to load model from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Image encoding failed
    #[error("Image encoding failed: {message}")]
    ImageEncode { message: String },

    /// Text encoding failed
    #[error("Text encoding failed: {message}")]
    TextEncode { message: String },

    /// Label list and class bank disagree on the number of classes
    #[error("Class bank has {columns} columns for {labels} labels")]
    LabelMismatch { labels: usize, columns: usize },

    /// Cache artifact could not be read or did not match
    #[error("Class bank cache at {path} unusable: {message}")]
    Cache { path: PathBuf, message: String },
}

/// Species catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog resolved to zero labels
    #[error("Species catalog is empty; at least one label is required")]
    Empty,

    /// Catalog file could not be read
    #[error("Failed to read species file {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Catalog file is not the expected JSON shape
    #[error("Failed to parse species file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Image intake errors, raised while validating and decoding an upload.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Image decoding failed
    #[error("Decode error for {name}: {message}")]
    Decode { name: String, message: String },

    /// Decode did not finish in time
    #[error("Decoding {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    /// Payload exceeds the size limit
    #[error("File too large: {name} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        name: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed the limit
    #[error("Image too large: {name} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        name: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Payload does not look like any supported image format
    #[error("Unsupported format for {name}: {message}")]
    UnsupportedFormat { name: String, message: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Observation and user store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Username already taken
    #[error("User '{0}' already exists")]
    UserExists(String),

    /// Rejected input, e.g. an empty username
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Record not found
    #[error("{0} not found")]
    NotFound(String),

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Media file could not be written
    #[error("Failed to store media file {path}: {message}")]
    Media { path: PathBuf, message: String },
}

/// Convenience type alias for Specimen results.
pub type Result<T> = std::result::Result<T, SpecimenError>;

/// Convenience type alias for intake-specific results.
pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
