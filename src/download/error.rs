//! Error types for the download module.
//!
//! Fetch failures are never fatal to a batch; they carry enough context to
//! explain at debug level why a candidate was skipped.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single fetch produced no media.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within the fetch timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Any status other than 200 OK.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Body shorter than the configured minimum.
    #[error("body of {url} is {bytes} bytes, below minimum of {min_bytes}")]
    Undersized {
        /// The URL whose body was too small.
        url: String,
        /// Actual body length.
        bytes: usize,
        /// Configured floor.
        min_bytes: usize,
    },

    /// The URL is malformed or not http(s).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an undersized-body error.
    pub fn undersized(url: impl Into<String>, bytes: usize, min_bytes: usize) -> Self {
        Self::Undersized {
            url: url.into(),
            bytes,
            min_bytes,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Short machine-friendly label used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::Undersized { .. } => "undersized",
            Self::InvalidUrl { .. } => "invalid_url",
        }
    }
}

/// Caller-level failures of an acquisition run.
///
/// Per-item problems are absorbed into the skipped counter; only conditions
/// that make the whole target unusable surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {min} and {max}")]
    InvalidWorkers {
        /// The rejected value.
        value: usize,
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },

    /// The target directory could not be created or read.
    #[error("target directory {path} is not usable: {source}")]
    TargetDir {
        /// The target directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

impl PipelineError {
    /// Creates a target directory error.
    pub fn target_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TargetDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_http_status_display() {
        let msg = FetchError::http_status("https://i.example.com/a.jpg", 404).to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://i.example.com/a.jpg"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_fetch_error_undersized_display() {
        let msg = FetchError::undersized("https://i.example.com/p.gif", 43, 1000).to_string();
        assert!(msg.contains("43 bytes"), "Expected size in: {msg}");
        assert!(msg.contains("1000"), "Expected floor in: {msg}");
    }

    #[test]
    fn test_fetch_error_kind_labels() {
        assert_eq!(FetchError::timeout("u").kind(), "timeout");
        assert_eq!(FetchError::invalid_url("u").kind(), "invalid_url");
        assert_eq!(FetchError::undersized("u", 1, 2).kind(), "undersized");
        assert_eq!(FetchError::http_status("u", 500).kind(), "http_status");
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::InvalidWorkers {
            value: 0,
            min: 1,
            max: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid worker count 0"), "got: {msg}");
        assert!(msg.contains("64"), "got: {msg}");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let msg = PipelineError::target_dir("/srv/media", io).to_string();
        assert!(msg.contains("/srv/media"), "got: {msg}");
    }
}
