//! Error types for candidate URL parsing.

use thiserror::Error;

/// Longest candidate URL accepted; longer strings are almost always scraping
/// debris (inline data, concatenated attributes).
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors that can occur while validating a candidate URL.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// URL is malformed or uses a scheme the fetcher cannot retrieve.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL that failed validation
        url: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// URL exceeds [`MAX_URL_LENGTH`].
    #[error("URL too long ({length} chars, max {max}): {url_preview}...")]
    UrlTooLong {
        /// First characters of the URL for display
        url_preview: String,
        /// Actual length
        length: usize,
        /// Maximum allowed
        max: usize,
    },
}

impl ParseError {
    /// Creates an `InvalidUrl` error for a non-web scheme.
    #[must_use]
    pub fn unsupported_scheme(url: &str, scheme: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: format!("scheme '{scheme}' is not supported, expected http or https"),
        }
    }

    /// Creates an `InvalidUrl` error from a `url` crate parse failure.
    #[must_use]
    pub fn malformed(url: &str, parse_error: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: parse_error.to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a URL without a host.
    #[must_use]
    pub fn no_host(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        }
    }

    /// Creates a `UrlTooLong` error.
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        Self::UrlTooLong {
            url_preview: url.chars().take(50).collect(),
            length: url.len(),
            max: MAX_URL_LENGTH,
        }
    }
}
