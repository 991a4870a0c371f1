//! Recognized media extensions and their grouping.

use std::path::Path;

use serde::Serialize;

/// Still-image extensions (lowercase, with leading dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Animated GIF extension.
pub const GIF_EXTENSIONS: &[&str] = &[".gif"];

/// Video container extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".m4v", ".webm", ".mov"];

/// Broad media category derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// `.jpg .jpeg .png .webp`
    Image,
    /// `.gif`
    Gif,
    /// `.mp4 .m4v .webm .mov`
    Video,
}

impl MediaKind {
    /// Classifies a dotted extension such as `.PNG` (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        let lower = lower.as_str();
        if IMAGE_EXTENSIONS.contains(&lower) {
            Some(Self::Image)
        } else if GIF_EXTENSIONS.contains(&lower) {
            Some(Self::Gif)
        } else if VIDEO_EXTENSIONS.contains(&lower) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Classifies a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::from_extension(&format!(".{ext}"))
    }

    /// Returns true for kinds the image scorers can decode (stills and GIFs).
    #[must_use]
    pub fn is_decodable_image(self) -> bool {
        matches!(self, Self::Image | Self::Gif)
    }
}

/// Returns true if the dotted extension is in any recognized group.
#[must_use]
pub fn is_recognized_extension(ext: &str) -> bool {
    MediaKind::from_extension(ext).is_some()
}

/// Returns the lowercase dotted extension of a path, if it has one.
#[must_use]
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}
