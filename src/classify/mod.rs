//! Independent media scorers.
//!
//! Every scorer inspects files and returns [`Verdict`]s; none of them touch
//! the filesystem beyond reading. The [`Organizer`](crate::store::Organizer)
//! applies the verdicts afterwards.
//!
//! Optional capabilities (QR detection, OCR) are strategy objects that report
//! [`Signal::Absent`] when they cannot run, so a missing tool never changes
//! what the remaining signals decide.

mod color;
mod duplicate;
mod media_type;
mod size;
mod text;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use color::{ColorMode, ColorStats, Tone, analyze_color, classify_tone, route_by_color};
pub use duplicate::find_duplicates;
pub use media_type::split_by_media_type;
pub use size::{judge_size, score_sizes};
pub use text::{
    NoOcr, NoQr, OcrEngine, QrDetector, RqrrDetector, TesseractOcr, TextAssessment,
    TextClassifier, textlike_score,
};

/// What should happen to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "dest", rename_all = "lowercase")]
pub enum VerdictKind {
    /// Leave the file where it is.
    Keep,
    /// Remove the file.
    Delete,
    /// Move the file into the given directory.
    Move(PathBuf),
}

/// A scorer's decision about one file, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// File the verdict applies to.
    pub path: PathBuf,
    /// Action to take.
    pub kind: VerdictKind,
    /// Why the scorer decided this.
    pub reason: String,
}

impl Verdict {
    /// Keep `path` in place.
    pub fn keep(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: VerdictKind::Keep,
            reason: reason.into(),
        }
    }

    /// Delete `path`.
    pub fn delete(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: VerdictKind::Delete,
            reason: reason.into(),
        }
    }

    /// Move `path` into `dest_dir`.
    pub fn move_to(
        path: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            kind: VerdictKind::Move(dest_dir.into()),
            reason: reason.into(),
        }
    }

    /// True unless the verdict is [`VerdictKind::Keep`].
    #[must_use]
    pub fn is_action(&self) -> bool {
        !matches!(self.kind, VerdictKind::Keep)
    }
}

/// Result of an optional capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal<T> {
    /// The capability ran and produced a value.
    Present(T),
    /// The capability is unavailable or could not read the input.
    Absent,
}

impl<T> Signal<T> {
    /// Converts to an `Option`.
    pub fn present(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// True for [`Signal::Present`].
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl<T> From<Option<T>> for Signal<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Numeric knobs shared by the scorers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Images with a side below this many pixels are deleted.
    pub min_pixels: u32,
    /// Byte floor used when dimensions cannot be read.
    pub fallback_bytes: u64,
    /// A pixel is low-saturation when S is below this.
    pub sat_low: f64,
    /// Fraction of low-saturation pixels required for greyscale.
    pub sat_px_fraction: f64,
    /// Upper bound on the 90th-percentile saturation for greyscale.
    pub sat_p90_max: f64,
    /// Colorfulness at or below this counts as grey.
    pub colorfulness: f64,
    /// Mean Lab chroma at or below this counts as grey.
    pub mean_chroma: f64,
    /// Text-likeness score at or above this deletes.
    pub text_score: f64,
    /// OCR alphanumeric count at or above this deletes.
    pub ocr_letters_min: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_pixels: 300,
            fallback_bytes: 25_000,
            sat_low: 0.22,
            sat_px_fraction: 0.85,
            sat_p90_max: 0.35,
            colorfulness: 18.0,
            mean_chroma: 8.0,
            text_score: 0.42,
            ocr_letters_min: 16,
        }
    }
}

/// Basename for log lines and reasons.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_conversions() {
        assert_eq!(Signal::from(Some(3)).present(), Some(3));
        assert!(!Signal::<u8>::from(None).is_present());
    }

    #[test]
    fn test_verdict_constructors() {
        let v = Verdict::move_to("/t/image_1.jpg", "/t/gifs", "gif");
        assert_eq!(v.kind, VerdictKind::Move(PathBuf::from("/t/gifs")));
        assert!(v.is_action());
        assert!(!Verdict::keep("/t/a.jpg", "ok").is_action());
    }

    #[test]
    fn test_display_name_uses_basename() {
        assert_eq!(display_name(Path::new("/t/x/image_3.png")), "image_3.png");
    }
}
