//! Deflate ZIP export of a target directory's media.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::media::MediaKind;

/// Errors from archive export.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// IO failure on a specific path.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The ZIP writer rejected an entry.
    #[error("zip error for {path}: {source}")]
    Zip {
        /// Archive being written.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Target is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl ArchiveError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

/// Path of the archive written for `target`: `<target>.zip` beside it.
#[must_use]
pub fn archive_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".zip");
    target.with_file_name(name)
}

/// Writes `<target>.zip` containing every recognized media file under
/// `target`.
///
/// Entry names are relative to the target's parent, so unpacking recreates
/// the target folder itself. Files with other extensions are skipped.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the target is missing or any read/write fails.
#[instrument(fields(target = %target.display()))]
pub fn create_archive(target: &Path) -> Result<PathBuf, ArchiveError> {
    if !target.is_dir() {
        return Err(ArchiveError::NotADirectory(target.to_path_buf()));
    }
    // `.` and `dir/..` have no file name until resolved.
    let target = &target
        .canonicalize()
        .map_err(|e| ArchiveError::io(target, e))?;
    let base = target.parent().unwrap_or(target);
    let out_path = archive_path(target);

    let file = File::create(&out_path).map_err(|e| ArchiveError::io(&out_path, e))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(target).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || MediaKind::from_path(entry.path()).is_none() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let bytes = std::fs::read(entry.path()).map_err(|e| ArchiveError::io(entry.path(), e))?;
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::zip(&out_path, e))?;
        writer
            .write_all(&bytes)
            .map_err(|e| ArchiveError::io(&out_path, e))?;
        entries += 1;
    }

    let mut inner = writer
        .finish()
        .map_err(|e| ArchiveError::zip(&out_path, e))?;
    inner.flush().map_err(|e| ArchiveError::io(&out_path, e))?;

    info!(archive = %out_path.display(), entries, "archive written");
    Ok(out_path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_path_sits_beside_target() {
        assert_eq!(
            archive_path(Path::new("/data/pins")),
            PathBuf::from("/data/pins.zip")
        );
    }

    #[test]
    fn test_create_archive_includes_only_media_relative_to_parent() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("pins");
        std::fs::create_dir_all(target.join("color_images")).unwrap();
        std::fs::create_dir_all(target.join("videos")).unwrap();
        std::fs::write(target.join("color_images/image_1.jpg"), b"jpg").unwrap();
        std::fs::write(target.join("videos/image_2.mp4"), b"mp4").unwrap();
        std::fs::write(target.join("notes.txt"), b"txt").unwrap();

        let out = create_archive(&target).unwrap();
        assert_eq!(out, tmp.path().canonicalize().unwrap().join("pins.zip"));

        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["pins/color_images/image_1.jpg", "pins/videos/image_2.mp4"]
        );
        let entry = archive.by_name("pins/color_images/image_1.jpg").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn test_create_archive_resolves_target_without_file_name() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("pins");
        std::fs::create_dir_all(target.join("gifs")).unwrap();
        std::fs::write(target.join("image_1.png"), b"png").unwrap();
        std::fs::write(target.join("gifs/image_2.gif"), b"gif").unwrap();

        let dotted = target.join("gifs").join("..");
        assert!(dotted.file_name().is_none());

        let out = create_archive(&dotted).unwrap();
        assert_eq!(out, tmp.path().canonicalize().unwrap().join("pins.zip"));
        assert!(!target.join(".zip").exists());

        let archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["pins/gifs/image_2.gif", "pins/image_1.png"]);
    }

    #[test]
    fn test_create_archive_missing_target() {
        let tmp = TempDir::new().unwrap();
        let result = create_archive(&tmp.path().join("missing"));
        assert!(matches!(result, Err(ArchiveError::NotADirectory(_))));
    }
}
