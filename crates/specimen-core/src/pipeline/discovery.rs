//! Finding image files for batch classification.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up when walking a directory.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Discover all supported image files at a path.
///
/// A file path is returned as-is when its extension is supported; a
/// directory is walked recursively. Results are sorted by path.
pub fn discover(path: &Path) -> Vec<DiscoveredFile> {
    if path.is_file() {
        return match std::fs::metadata(path) {
            Ok(meta) if is_supported(path) => vec![DiscoveredFile {
                path: path.to_path_buf(),
                size: meta.len(),
            }],
            _ => vec![],
        };
    }

    let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .filter_map(|e| {
            let size = e.metadata().ok()?.len();
            Some(DiscoveredFile {
                path: e.into_path(),
                size,
            })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Check if a file has a supported extension (case-insensitive).
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("test.jpg")));
        assert!(is_supported(Path::new("test.JPG")));
        assert!(is_supported(Path::new("test.webp")));
        assert!(!is_supported(Path::new("test.txt")));
        assert!(!is_supported(Path::new("noextension")));
    }

    #[test]
    fn test_discover_walks_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("nested/a.jpg"), b"xy").unwrap();
        std::fs::write(dir.path().join("readme.md"), b"skip").unwrap();

        let files = discover(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("b.png"), PathBuf::from("nested/a.jpg")]
        );
        assert_eq!(files[1].size, 2);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.jpeg");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(discover(&path).len(), 1);

        let other = dir.path().join("one.txt");
        std::fs::write(&other, b"x").unwrap();
        assert!(discover(&other).is_empty());
    }
}
