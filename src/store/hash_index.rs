//! Content-hash index of everything already materialized under a target.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::download::content_hash;

/// Set of SHA-256 hex digests present under a target directory.
///
/// Seeded once per run from disk and grown by the acquisition writer as it
/// commits files, so byte-identical media is never written twice.
#[derive(Debug, Default, Clone)]
pub struct HashIndex {
    hashes: HashSet<String>,
}

impl HashIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes every regular file under `dir` (recursively).
    ///
    /// Unreadable files are logged and left out; a missing directory yields
    /// an empty index.
    #[must_use]
    pub fn build(dir: &Path) -> Self {
        let mut index = Self::new();
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "target does not exist yet; empty hash index");
            return index;
        }

        let mut unreadable = 0usize;
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "could not walk entry while seeding hash index");
                    unreadable += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match std::fs::read(entry.path()) {
                Ok(bytes) => {
                    index.insert(content_hash(&bytes));
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "could not hash file");
                    unreadable += 1;
                }
            }
        }

        info!(
            dir = %dir.display(),
            hashes = index.len(),
            unreadable,
            "hash index seeded"
        );
        index
    }

    /// Returns true if `hash` is already present.
    #[must_use]
    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Records `hash`; returns false if it was already present.
    pub fn insert(&mut self, hash: impl Into<String>) -> bool {
        self.hashes.insert(hash.into())
    }

    /// Number of distinct hashes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True when no hashes are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Reads and hashes a whole file.
///
/// # Errors
///
/// Returns the IO error if the file cannot be read.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    std::fs::read(path).map(|bytes| content_hash(&bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let index = HashIndex::build(&tmp.path().join("nope"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_build_hashes_nested_files_and_collapses_identical() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("image_1.jpg"), b"one").unwrap();
        std::fs::write(tmp.path().join("image_2.jpg"), b"one").unwrap();
        std::fs::create_dir(tmp.path().join("color_images")).unwrap();
        std::fs::write(tmp.path().join("color_images/image_3.png"), b"three").unwrap();

        let index = HashIndex::build(tmp.path());
        assert_eq!(index.len(), 2);
        assert!(index.contains(&content_hash(b"one")));
        assert!(index.contains(&content_hash(b"three")));
    }

    #[test]
    fn test_insert_reports_novelty() {
        let mut index = HashIndex::new();
        assert!(index.insert("abc"));
        assert!(!index.insert("abc"));
        assert!(index.contains("abc"));
        assert!(!index.contains("abd"));
    }

    #[test]
    fn test_hash_file_matches_content_hash() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.webp");
        std::fs::write(&file, b"payload").unwrap();
        assert_eq!(hash_file(&file).unwrap(), content_hash(b"payload"));
        assert!(hash_file(&tmp.path().join("missing")).is_err());
    }
}
