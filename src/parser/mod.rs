//! Candidate parsing: turns scraper output into [`MediaCandidate`]s.
//!
//! The scraping collaborator hands over free text, typically one URL per line,
//! optionally followed by a MIME hint it read from the page markup:
//!
//! ```text
//! https://i.example.com/originals/aa/bb.jpg
//! https://v.example.com/hls/clip.mp4 video/mp4
//! ```
//!
//! # Example
//!
//! ```
//! use mediarip_core::parser::parse_candidates;
//!
//! let result = parse_candidates("https://v.example.com/x video/mp4\nnot a url");
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.items[0].content_type.as_deref(), Some("video/mp4"));
//! assert_eq!(result.skipped.len(), 1);
//! ```

mod error;
mod url;

pub use error::{MAX_URL_LENGTH, ParseError};
pub use url::extract_urls;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

#[allow(clippy::expect_used)]
static MIME_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(image|video)/[a-z0-9.+-]+$").expect("MIME regex is valid")
});

/// A media URL discovered by the scraper, consumed once per batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaCandidate {
    /// Absolute http(s) URL.
    pub url: String,
    /// Optional MIME type reported by the page, used when the server omits one.
    pub content_type: Option<String>,
}

impl MediaCandidate {
    /// Creates a candidate without a content-type hint.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
        }
    }

    /// Attaches a content-type hint.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl From<&str> for MediaCandidate {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for MediaCandidate {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Candidates extracted from input plus the lines that yielded nothing.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Valid, de-duplicated candidates in input order.
    pub items: Vec<MediaCandidate>,
    /// Non-empty lines or URLs that could not be used (for logging).
    pub skipped: Vec<String>,
}

impl ParseResult {
    /// Number of usable candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no candidates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of skipped lines/URLs.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Plain URL list in candidate order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.items.iter().map(|c| c.url.clone()).collect()
    }
}

/// Parses scraper output into candidates.
///
/// Every http(s) URL on a line becomes a candidate; a trailing `image/*` or
/// `video/*` token on the same line is attached as the content-type hint of
/// that line's URLs. Repeated URLs keep their first occurrence.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn parse_candidates(input: &str) -> ParseResult {
    let mut result = ParseResult::default();
    let mut seen = HashSet::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let hint = trimmed
            .split_whitespace()
            .last()
            .filter(|token| MIME_HINT.is_match(token))
            .map(str::to_ascii_lowercase);

        let extracted = extract_urls(trimmed);
        if extracted.is_empty() {
            result.skipped.push(trimmed.to_string());
            continue;
        }

        for item in extracted {
            match item {
                Ok(url) => {
                    if !seen.insert(url.clone()) {
                        debug!(url = %url, "dropping repeated candidate");
                        continue;
                    }
                    let mut candidate = MediaCandidate::new(url);
                    candidate.content_type.clone_from(&hint);
                    result.items.push(candidate);
                }
                Err(e) => result.skipped.push(e.to_string()),
            }
        }
    }

    info!(
        candidates = result.len(),
        skipped = result.skipped_count(),
        "parsed candidate input"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidates_one_per_line() {
        let input = "https://i.example.com/a.jpg\nhttps://i.example.com/b.png\n";
        let result = parse_candidates(input);
        assert_eq!(
            result.urls(),
            vec![
                "https://i.example.com/a.jpg".to_string(),
                "https://i.example.com/b.png".to_string()
            ]
        );
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_parse_candidates_attaches_mime_hint() {
        let result = parse_candidates("https://v.example.com/stream/123 Video/MP4");
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].content_type.as_deref(), Some("video/mp4"));
    }

    #[test]
    fn test_parse_candidates_ignores_non_media_hint() {
        let result = parse_candidates("https://example.com/page text/html");
        assert_eq!(result.items[0].content_type, None);
    }

    #[test]
    fn test_parse_candidates_dedupes_preserving_order() {
        let input = "https://i.example.com/b.jpg\nhttps://i.example.com/a.jpg\nhttps://i.example.com/b.jpg";
        let result = parse_candidates(input);
        assert_eq!(
            result.urls(),
            vec![
                "https://i.example.com/b.jpg".to_string(),
                "https://i.example.com/a.jpg".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_candidates_skips_comments_and_blank_lines() {
        let input = "# scraped 2024-05-01\n\n   \nhttps://i.example.com/a.jpg";
        let result = parse_candidates(input);
        assert_eq!(result.len(), 1);
        assert_eq!(result.skipped_count(), 0);
    }

    #[test]
    fn test_parse_candidates_records_unusable_lines() {
        let result = parse_candidates("avatar.png\nhttps://i.example.com/ok.webp");
        assert_eq!(result.len(), 1);
        assert_eq!(result.skipped, vec!["avatar.png".to_string()]);
    }

    #[test]
    fn test_media_candidate_builders() {
        let candidate = MediaCandidate::from("https://i.example.com/a").with_content_type("image/webp");
        assert_eq!(candidate.url, "https://i.example.com/a");
        assert_eq!(candidate.content_type.as_deref(), Some("image/webp"));
    }
}
