//! Extension derivation and sequential naming for fetched media.
//!
//! Servers are trusted first (Content-Type), then the scraper's hint, then the
//! URL path; anything unrecognized is saved as `.jpg`.

use url::Url;

use crate::media::is_recognized_extension;

/// Extension used when nothing better is known.
pub const FALLBACK_EXTENSION: &str = ".jpg";

/// Maps a Content-Type value to a media extension by substring.
///
/// Matching is deliberately loose (`image/pjpeg`, `video/quicktime; codecs=…`
/// and CDN oddities like `binary/jpg` all resolve).
pub(crate) fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let ctype = content_type.to_ascii_lowercase();
    let has = |needle: &str| ctype.contains(needle);

    if has("jpeg") || has("jpg") {
        Some(".jpg")
    } else if has("png") {
        Some(".png")
    } else if has("webp") {
        Some(".webp")
    } else if has("gif") {
        Some(".gif")
    } else if has("mp4") {
        Some(".mp4")
    } else if has("webm") {
        Some(".webm")
    } else if has("quicktime") || has("mov") {
        Some(".mov")
    } else {
        None
    }
}

/// Returns the URL path's extension if it is a recognized media extension.
///
/// Query strings and fragments are ignored.
pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let last_segment = path.rsplit('/').next()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = last_segment[dot_index..].to_ascii_lowercase();
    is_recognized_extension(&ext).then_some(ext)
}

/// Resolves the on-disk extension for a fetched payload.
///
/// Priority: response Content-Type, candidate hint, URL path, `.jpg`.
#[must_use]
pub fn resolve_extension(
    response_content_type: Option<&str>,
    hint: Option<&str>,
    url: &str,
) -> String {
    response_content_type
        .and_then(extension_from_content_type)
        .or_else(|| hint.and_then(extension_from_content_type))
        .map(str::to_string)
        .or_else(|| extension_from_url(url))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Builds the sequential filename `image_<index><ext>`.
#[must_use]
pub fn sequential_filename(index: u64, extension: &str) -> String {
    format!("image_{index}{extension}")
}
