//! Species catalog: the ordered, fixed universe of classification labels.
//!
//! Labels come from a JSON document with one array per group
//! (`{"plants": [...], "insects": [...]}`), concatenated in the configured
//! group order. Position in the catalog is the label's column in the class
//! bank and its slot in every probability vector.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::CatalogConfig;
use crate::error::CatalogError;

/// Where the catalog's labels came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Read from the species JSON file
    File(PathBuf),
    /// The configured fallback list
    Fallback,
    /// Supplied directly by the caller
    Inline,
}

/// An ordered species label list.
#[derive(Debug, Clone)]
pub struct SpeciesCatalog {
    labels: Vec<String>,
    source: CatalogSource,
}

impl SpeciesCatalog {
    /// Load the catalog, falling back to `config.fallback` when the species
    /// file is missing, unreadable or malformed.
    ///
    /// Returns [`CatalogError::Empty`] when the resolved list has no labels.
    pub fn load(config: &CatalogConfig, path: &Path) -> Result<Self, CatalogError> {
        let catalog = match read_groups(path, &config.groups) {
            Ok(labels) => {
                tracing::info!(
                    "Loaded {} species from {:?} (groups: {})",
                    labels.len(),
                    path,
                    config.groups.join(", ")
                );
                Self {
                    labels,
                    source: CatalogSource::File(path.to_path_buf()),
                }
            }
            Err(e) => {
                tracing::warn!("{e}. Using fallback species list.");
                Self {
                    labels: clean(config.fallback.iter().cloned()),
                    source: CatalogSource::Fallback,
                }
            }
        };
        catalog.ensure_usable()
    }

    /// Build a catalog from an explicit label list.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: clean(labels.into_iter().map(Into::into)),
            source: CatalogSource::Inline,
        }
        .ensure_usable()
    }

    fn ensure_usable(self) -> Result<Self, CatalogError> {
        if self.labels.is_empty() {
            return Err(CatalogError::Empty);
        }
        let dupes = self.duplicates();
        if !dupes.is_empty() {
            tracing::warn!(
                "Species catalog contains duplicate labels ({}); the first occurrence wins ties",
                dupes.join(", ")
            );
        }
        Ok(self)
    }

    /// All labels in catalog order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the catalog is empty (never true for a loaded catalog).
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at a position.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Where the labels came from.
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Labels that appear more than once, in first-seen order.
    pub fn duplicates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut dupes = Vec::new();
        for label in &self.labels {
            if !seen.insert(label.as_str()) && reported.insert(label.as_str()) {
                dupes.push(label.clone());
            }
        }
        dupes
    }

    /// BLAKE3 digest of the labels in order.
    pub fn digest(&self) -> String {
        label_digest(&self.labels)
    }
}

/// BLAKE3 digest of a label list, order-sensitive.
pub fn label_digest(labels: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    for label in labels {
        hasher.update(label.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

/// Read the configured groups from a species JSON file, in group order.
///
/// Groups missing from the document contribute nothing.
pub fn read_groups(path: &Path, groups: &[String]) -> Result<Vec<String>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut labels = Vec::new();
    for group in groups {
        let Some(value) = document.get(group) else {
            tracing::debug!("Species file {:?} has no '{}' group", path, group);
            continue;
        };
        let names: Vec<String> =
            serde_json::from_value(value.clone()).map_err(|e| CatalogError::Parse {
                path: path.to_path_buf(),
                message: format!("group '{group}' must be an array of strings: {e}"),
            })?;
        labels.extend(names);
    }
    Ok(clean(labels))
}

/// Trim labels and drop blank ones.
fn clean(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    labels
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_species(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("species.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_groups_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_species(
            dir.path(),
            r#"{"insects": ["honey bee", "ladybird"], "plants": ["oak", "fern"]}"#,
        );
        let catalog = SpeciesCatalog::load(&CatalogConfig::default(), &path).unwrap();
        assert_eq!(catalog.labels(), ["oak", "fern", "honey bee", "ladybird"]);
        assert_eq!(catalog.source(), &CatalogSource::File(path));
    }

    #[test]
    fn test_missing_group_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_species(dir.path(), r#"{"plants": ["oak"], "fungi": ["morel"]}"#);
        let catalog = SpeciesCatalog::load(&CatalogConfig::default(), &path).unwrap();
        assert_eq!(catalog.labels(), ["oak"]);
    }

    #[test]
    fn test_missing_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let catalog =
            SpeciesCatalog::load(&CatalogConfig::default(), &dir.path().join("nope.json"))
                .unwrap();
        assert_eq!(catalog.labels(), ["black iris", "bee", "beetle"]);
        assert_eq!(catalog.source(), &CatalogSource::Fallback);
    }

    #[test]
    fn test_malformed_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_species(dir.path(), r#"{"plants": "oak"}"#);
        let catalog = SpeciesCatalog::load(&CatalogConfig::default(), &path).unwrap();
        assert_eq!(catalog.source(), &CatalogSource::Fallback);

        let path = write_species(dir.path(), "not json");
        let catalog = SpeciesCatalog::load(&CatalogConfig::default(), &path).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_empty_groups_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_species(dir.path(), r#"{"plants": [], "insects": ["  "]}"#);
        let err = SpeciesCatalog::load(&CatalogConfig::default(), &path).unwrap_err();
        assert!(matches!(err, CatalogError::Empty));

        assert!(matches!(
            SpeciesCatalog::from_labels(Vec::<String>::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_duplicates_are_kept_and_reported() {
        let catalog = SpeciesCatalog::from_labels(["oak", "fern", "oak", "oak"]).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.duplicates(), vec!["oak".to_string()]);
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let a = SpeciesCatalog::from_labels(["cat", "dog"]).unwrap();
        let b = SpeciesCatalog::from_labels(["dog", "cat"]).unwrap();
        let c = SpeciesCatalog::from_labels(["cat", "dog"]).unwrap();
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), c.digest());
    }
}
