//! Core data types produced by classification.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of classifying one image.
///
/// A failure is a value, not an error: the upload path records and displays
/// it like any other result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// The most probable species and its softmax probability in `[0, 1]`
    Identified { label: String, confidence: f32 },
    /// The image could not be decoded or embedded
    Failed { reason: String },
}

impl Classification {
    /// Label shown and stored for a failed classification.
    pub const FAILURE_LABEL: &'static str = "Error processing image";

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Species label, or the failure label.
    pub fn label(&self) -> &str {
        match self {
            Self::Identified { label, .. } => label,
            Self::Failed { .. } => Self::FAILURE_LABEL,
        }
    }

    /// Confidence in `[0, 1]`; `0.0` for a failure.
    pub fn confidence(&self) -> f32 {
        match self {
            Self::Identified { confidence, .. } => *confidence,
            Self::Failed { .. } => 0.0,
        }
    }

    /// Confidence as a percentage in `[0, 100]`.
    pub fn confidence_percent(&self) -> f32 {
        self.confidence() * 100.0
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, Self::Identified { .. })
    }
}

/// One line of `specimen classify` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Path of the classified file
    pub file_path: PathBuf,

    /// Predicted species, or the failure label
    pub species: String,

    /// Confidence percentage
    pub confidence: f32,

    /// Why classification failed, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassificationRecord {
    pub fn new(file_path: PathBuf, classification: &Classification) -> Self {
        Self {
            file_path,
            species: classification.label().to_string(),
            confidence: classification.confidence_percent(),
            error: match classification {
                Classification::Failed { reason } => Some(reason.clone()),
                Classification::Identified { .. } => None,
            },
        }
    }
}
