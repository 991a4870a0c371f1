//! Applies classification verdicts to the filesystem and consolidates the
//! final layout.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::sequencer::next_index;
use crate::classify::{Verdict, VerdictKind};
use crate::download::sequential_filename;
use crate::media::{MediaKind, dotted_extension};

/// Folder receiving color images.
pub const COLOR_DIR: &str = "color_images";
/// Folder receiving greyscale-like images.
pub const GREYSCALE_DIR: &str = "greyscale_images";
/// Folder receiving videos.
pub const VIDEOS_DIR: &str = "videos";
/// Folder receiving GIFs.
pub const GIFS_DIR: &str = "gifs";

/// Scratch folders intermediate filters may leave behind; never part of the
/// terminal layout.
pub const TRANSIENT_DIRS: &[&str] = &[
    "small_images",
    "duplicates",
    "qr_codes",
    "rejected_text_ui",
    "size_small",
    "size_medium",
    "size_large",
];

/// Filesystem failure while applying a verdict.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// IO failure on a specific path.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl OrganizeError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// What happened to a file when its verdict was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "path", rename_all = "lowercase")]
pub enum Applied {
    /// Left in place.
    Kept,
    /// Removed from disk.
    Deleted,
    /// Moved to the contained final path.
    Moved(PathBuf),
}

/// Summary of a [`Organizer::finalize`] pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FinalizeReport {
    /// Transient or empty folders removed.
    pub removed_dirs: Vec<PathBuf>,
    /// Top-level images relocated into `color_images/`.
    pub relocated: usize,
    /// Non-fatal filesystem problems encountered.
    pub warnings: usize,
}

/// Moves `src` into `dest_dir` without ever overwriting.
///
/// Creates `dest_dir` if needed. When a file with the same basename already
/// exists there, the moved file is renamed to the directory's next
/// `image_<N>.<ext>` (extension lowercased).
///
/// # Errors
///
/// Returns [`OrganizeError::Io`] if the directory cannot be created or the
/// rename fails; `src` is left untouched in that case.
pub fn move_with_increment(src: &Path, dest_dir: &Path) -> Result<PathBuf, OrganizeError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| OrganizeError::io(dest_dir, e))?;

    let Some(base) = src.file_name() else {
        return Err(OrganizeError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        ));
    };

    let mut dest = dest_dir.join(base);
    if dest.exists() {
        let ext = dotted_extension(src).unwrap_or_default();
        dest = dest_dir.join(sequential_filename(next_index(dest_dir), &ext));
        debug!(src = %src.display(), dest = %dest.display(), "name collision, renumbering");
    }

    std::fs::rename(src, &dest).map_err(|e| OrganizeError::io(src, e))?;
    Ok(dest)
}

/// Applies verdicts and finalizes the layout of one target directory.
#[derive(Debug, Clone)]
pub struct Organizer {
    target_dir: PathBuf,
}

impl Organizer {
    /// Creates an organizer rooted at `target_dir`.
    #[must_use]
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    /// Root directory this organizer mutates.
    #[must_use]
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Convenience for `target_dir.join(name)`.
    #[must_use]
    pub fn subdir(&self, name: &str) -> PathBuf {
        self.target_dir.join(name)
    }

    /// Applies one verdict.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError`] on delete/move failure; the file is left as is.
    pub fn apply(&self, verdict: &Verdict) -> Result<Applied, OrganizeError> {
        match &verdict.kind {
            VerdictKind::Keep => Ok(Applied::Kept),
            VerdictKind::Delete => {
                std::fs::remove_file(&verdict.path)
                    .map_err(|e| OrganizeError::io(&verdict.path, e))?;
                debug!(path = %verdict.path.display(), reason = %verdict.reason, "deleted");
                Ok(Applied::Deleted)
            }
            VerdictKind::Move(dest_dir) => {
                let dest = move_with_increment(&verdict.path, dest_dir)?;
                debug!(
                    path = %verdict.path.display(),
                    dest = %dest.display(),
                    reason = %verdict.reason,
                    "moved"
                );
                Ok(Applied::Moved(dest))
            }
        }
    }

    /// Creates `color_images/` and `greyscale_images/`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::Io`] if either folder cannot be created.
    pub fn ensure_color_dirs(&self) -> Result<(), OrganizeError> {
        for name in [COLOR_DIR, GREYSCALE_DIR] {
            let dir = self.subdir(name);
            std::fs::create_dir_all(&dir).map_err(|e| OrganizeError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Consolidates the terminal layout.
    ///
    /// Removes transient folders, guarantees the color folders, moves stray
    /// top-level images into `color_images/` and drops `videos/`/`gifs/` when
    /// they hold no files. Every failure is a warning.
    pub fn finalize(&self) -> FinalizeReport {
        let mut report = FinalizeReport::default();

        for name in TRANSIENT_DIRS {
            let dir = self.subdir(name);
            if dir.is_dir() {
                match std::fs::remove_dir_all(&dir) {
                    Ok(()) => {
                        info!(dir = %dir.display(), "removed transient folder");
                        report.removed_dirs.push(dir);
                    }
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "could not remove folder");
                        report.warnings += 1;
                    }
                }
            }
        }

        if let Err(e) = self.ensure_color_dirs() {
            warn!(error = %e, "could not create color folders");
            report.warnings += 1;
        }

        let color_dir = self.subdir(COLOR_DIR);
        match list_files(&self.target_dir) {
            Ok(files) => {
                for file in files {
                    if MediaKind::from_path(&file) != Some(MediaKind::Image) {
                        continue;
                    }
                    match move_with_increment(&file, &color_dir) {
                        Ok(_) => report.relocated += 1,
                        Err(e) => {
                            warn!(error = %e, "could not move leftover image");
                            report.warnings += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "could not list target for leftovers");
                report.warnings += 1;
            }
        }

        for name in [VIDEOS_DIR, GIFS_DIR] {
            let dir = self.subdir(name);
            if !dir.is_dir() {
                continue;
            }
            match list_files(&dir) {
                Ok(files) if files.is_empty() => match std::fs::remove_dir_all(&dir) {
                    Ok(()) => {
                        info!(dir = %dir.display(), "removed empty folder");
                        report.removed_dirs.push(dir);
                    }
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "could not remove folder");
                        report.warnings += 1;
                    }
                },
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "could not inspect folder");
                    report.warnings += 1;
                }
            }
        }

        info!(
            relocated = report.relocated,
            removed = report.removed_dirs.len(),
            warnings = report.warnings,
            "layout finalized"
        );
        report
    }
}

/// Regular files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`OrganizeError::Io`] if the directory cannot be read.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, OrganizeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| OrganizeError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}
