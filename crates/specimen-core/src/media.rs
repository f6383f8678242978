//! Storage for uploaded observation photos.
//!
//! Files land in `<media_root>/observations/` under a sanitized version of
//! the uploaded name. A name that is already taken gets a short random
//! suffix, so an earlier photo is never overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Subdirectory of the media root holding uploads.
pub const UPLOAD_SUBDIR: &str = "observations";

const SUFFIX_LEN: usize = 7;
const MAX_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload and return its path relative to the media root
    /// (always with `/` separators).
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let dir = self.root.join(UPLOAD_SUBDIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Media {
                path: dir.clone(),
                message: e.to_string(),
            })?;

        let base = sanitize_filename(original_name);
        let mut name = base.clone();
        for _ in 0..MAX_ATTEMPTS {
            let path = dir.join(&name);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(mut file) => {
                    let media_err = |e: std::io::Error| StoreError::Media {
                        path: path.clone(),
                        message: e.to_string(),
                    };
                    file.write_all(bytes).await.map_err(media_err)?;
                    file.flush().await.map_err(media_err)?;
                    tracing::debug!("Stored upload at {:?} ({} bytes)", path, bytes.len());
                    return Ok(format!("{UPLOAD_SUBDIR}/{name}"));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    name = with_suffix(&base, &random_suffix());
                }
                Err(e) => {
                    return Err(StoreError::Media {
                        path,
                        message: e.to_string(),
                    })
                }
            }
        }

        Err(StoreError::Media {
            path: dir.join(&base),
            message: "could not find a free file name".to_string(),
        })
    }

    /// Absolute path of a stored file.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), StoreError> {
        let path = self.resolve(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Media {
                path,
                message: e.to_string(),
            }),
        }
    }
}

/// Reduce an uploaded name to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    // Browsers may send a full client path; keep only the last component.
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = last
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{name}_{suffix}"),
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("fern.jpg"), "fern.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\my oak.JPG"), "my_oak.JPG");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("fern.jpg", "abc1234"), "fern_abc1234.jpg");
        assert_eq!(with_suffix("fern", "abc1234"), "fern_abc1234");
        assert_eq!(random_suffix().len(), SUFFIX_LEN);
    }

    #[tokio::test]
    async fn test_save_and_collision() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let first = store.save("fern.jpg", b"one").await.unwrap();
        assert_eq!(first, "observations/fern.jpg");

        let second = store.save("fern.jpg", b"two").await.unwrap();
        assert_ne!(second, first);
        assert!(second.starts_with("observations/fern_"));
        assert!(second.ends_with(".jpg"));

        assert_eq!(std::fs::read(store.resolve(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(store.resolve(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let rel = store.save("bee.png", b"x").await.unwrap();
        store.remove(&rel).await.unwrap();
        assert!(!store.resolve(&rel).exists());
        store.remove(&rel).await.unwrap();
    }
}
