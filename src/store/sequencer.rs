//! Sequential `image_<N>.<ext>` index assignment.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};

/// `image_<digits>.<recognized ext>`, case-insensitive, whole name.
#[allow(clippy::expect_used)]
static SEQUENTIAL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^image_(\d+)\.(?:jpg|jpeg|png|webp|gif|mp4|m4v|webm|mov)$")
        .expect("sequential name regex is valid")
});

/// Parses the numeric suffix of a sequential filename.
#[must_use]
pub fn parse_sequential_index(file_name: &str) -> Option<u64> {
    SEQUENTIAL_NAME
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Returns one more than the largest sequential index in `dir`, or 1.
///
/// Only direct entries are considered. A missing or unreadable directory
/// counts as empty.
#[must_use]
pub fn next_index(dir: &Path) -> u64 {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %e, "could not scan for sequential names");
            }
            return 1;
        }
    };

    let max = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().to_str().and_then(parse_sequential_index))
        .max()
        .unwrap_or(0);

    trace!(dir = %dir.display(), max, "scanned sequential names");
    max.saturating_add(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sequential_index() {
        assert_eq!(parse_sequential_index("image_7.jpg"), Some(7));
        assert_eq!(parse_sequential_index("IMAGE_12.MOV"), Some(12));
        assert_eq!(parse_sequential_index("image_3.txt"), None);
        assert_eq!(parse_sequential_index("image_.jpg"), None);
        assert_eq!(parse_sequential_index("my_image_3.jpg"), None);
        assert_eq!(parse_sequential_index("image_3.jpg.bak"), None);
    }

    #[test]
    fn test_next_index_empty_and_missing() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(next_index(tmp.path()), 1);
        assert_eq!(next_index(&tmp.path().join("missing")), 1);
    }

    #[test]
    fn test_next_index_uses_max_not_count() {
        let tmp = TempDir::new().unwrap();
        for name in ["image_2.jpg", "image_10.gif", "image_5.webm", "notes.txt", "image_99.txt"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        assert_eq!(next_index(tmp.path()), 11);
    }

    #[test]
    fn test_next_index_ignores_subdirectories_contents() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("color_images")).unwrap();
        std::fs::write(tmp.path().join("color_images/image_50.jpg"), b"x").unwrap();
        std::fs::write(tmp.path().join("image_3.png"), b"x").unwrap();
        assert_eq!(next_index(tmp.path()), 4);
    }
}
