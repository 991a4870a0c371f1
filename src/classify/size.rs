//! Small-image scorer.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Thresholds, Verdict, display_name};

/// Judges one image by its pixel dimensions.
///
/// When the header cannot be decoded the byte size decides instead. Returns
/// `None` if neither can be read, which leaves the file alone.
#[must_use]
pub fn judge_size(path: &Path, thresholds: &Thresholds) -> Option<Verdict> {
    match image::image_dimensions(path) {
        Ok((w, h)) => {
            let min = thresholds.min_pixels;
            if w < min || h < min {
                Some(Verdict::delete(path, format!("small image ({w}x{h})")))
            } else {
                Some(Verdict::keep(path, format!("{w}x{h}")))
            }
        }
        Err(decode_err) => {
            debug!(path = %path.display(), error = %decode_err, "dimensions unreadable, using byte size");
            match std::fs::metadata(path) {
                Ok(meta) if meta.len() < thresholds.fallback_bytes => Some(Verdict::delete(
                    path,
                    format!("small file ({} bytes)", meta.len()),
                )),
                Ok(meta) => Some(Verdict::keep(path, format!("{} bytes", meta.len()))),
                Err(e) => {
                    warn!(file = %display_name(path), error = %e, "could not check size");
                    None
                }
            }
        }
    }
}

/// Runs [`judge_size`] over `files`.
#[must_use]
pub fn score_sizes(files: &[PathBuf], thresholds: &Thresholds) -> Vec<Verdict> {
    files
        .iter()
        .filter_map(|path| judge_size(path, thresholds))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::VerdictKind;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_small_dimension_deletes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("image_1.png");
        RgbImage::from_pixel(400, 120, Rgb([10, 200, 30])).save(&path).unwrap();

        let verdict = judge_size(&path, &Thresholds::default()).unwrap();
        assert_eq!(verdict.kind, VerdictKind::Delete);
        assert!(verdict.reason.contains("400x120"));
    }

    #[test]
    fn test_large_image_kept() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("image_1.png");
        RgbImage::from_pixel(300, 300, Rgb([0, 0, 0])).save(&path).unwrap();
        assert_eq!(
            judge_size(&path, &Thresholds::default()).unwrap().kind,
            VerdictKind::Keep
        );
    }

    #[test]
    fn test_undecodable_falls_back_to_bytes() {
        let tmp = TempDir::new().unwrap();
        let small = tmp.path().join("image_1.jpg");
        let big = tmp.path().join("image_2.jpg");
        std::fs::write(&small, vec![0u8; 100]).unwrap();
        std::fs::write(&big, vec![0u8; 30_000]).unwrap();

        let verdicts = score_sizes(&[small, big], &Thresholds::default());
        assert_eq!(verdicts[0].kind, VerdictKind::Delete);
        assert_eq!(verdicts[1].kind, VerdictKind::Keep);
    }

    #[test]
    fn test_missing_file_yields_no_verdict() {
        let tmp = TempDir::new().unwrap();
        assert!(judge_size(&tmp.path().join("gone.png"), &Thresholds::default()).is_none());
    }
}
