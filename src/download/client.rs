//! HTTP fetcher that pulls whole media payloads into memory.
//!
//! Unlike a file downloader, the fetcher never touches disk: workers hand the
//! bytes to the single writer stage, which names and commits them.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_MIN_BYTES, FETCH_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// A fetched payload, owned by the worker until handed to the writer.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    /// Source URL.
    pub url: String,
    /// Complete response body.
    pub bytes: Vec<u8>,
    /// Response Content-Type header, if any.
    pub content_type: Option<String>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub content_hash: String,
}

impl FetchedMedia {
    /// Wraps a payload, computing its content hash.
    #[must_use]
    pub fn new(url: impl Into<String>, bytes: Vec<u8>, content_type: Option<String>) -> Self {
        let content_hash = content_hash(&bytes);
        Self {
            url: url.into(),
            bytes,
            content_type,
            content_hash,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for an empty payload (never produced by [`Fetcher::fetch`]).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Lowercase hex SHA-256 digest over `bytes`.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// HTTP client for media fetches.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use mediarip_core::download::Fetcher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = Fetcher::new()?;
/// let media = fetcher.fetch("https://i.example.com/originals/a.jpg").await?;
/// println!("{} bytes, sha256 {}", media.len(), media.content_hash);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    min_bytes: usize,
}

impl Fetcher {
    /// Creates a fetcher with the default 12 s timeout and 1000-byte floor.
    ///
    /// # Errors
    ///
    /// Returns the reqwest build error if the TLS backend cannot initialise.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_settings(Duration::from_secs(FETCH_TIMEOUT_SECS), DEFAULT_MIN_BYTES)
    }

    /// Creates a fetcher with an explicit timeout and minimum body size.
    ///
    /// # Errors
    ///
    /// Returns the reqwest build error if the TLS backend cannot initialise.
    #[instrument(level = "debug")]
    pub fn with_settings(timeout: Duration, min_bytes: usize) -> Result<Self, reqwest::Error> {
        let connect_timeout = timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS));
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent::default_fetch_user_agent())
            .build()?;
        Ok(Self { client, min_bytes })
    }

    /// Configured minimum body size.
    #[must_use]
    pub fn min_bytes(&self) -> usize {
        self.min_bytes
    }

    /// Fetches `url` fully into memory.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the URL is invalid, the request fails or
    /// times out, the status is not 200, or the body is below the minimum.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedMedia, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::http_status(url, response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let bytes = read_body(response, url).await?;
        if bytes.len() < self.min_bytes {
            return Err(FetchError::undersized(url, bytes.len(), self.min_bytes));
        }

        debug!(bytes = bytes.len(), content_type = ?content_type, "fetched");
        Ok(FetchedMedia::new(url, bytes, content_type))
    }

    /// Like [`fetch`](Self::fetch) but absorbs the failure into `None`.
    pub async fn try_fetch(&self, url: &str) -> Option<FetchedMedia> {
        match self.fetch(url).await {
            Ok(media) => Some(media),
            Err(e) => {
                debug!(url, kind = e.kind(), error = %e, "fetch skipped");
                None
            }
        }
    }
}

/// Streams the response body into memory.
async fn read_body(response: reqwest::Response, url: &str) -> Result<Vec<u8>, FetchError> {
    let capacity = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut body = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_content_hash_is_hex_sha256() {
        let hash = content_hash(b"abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fetched_media_computes_hash() {
        let media = FetchedMedia::new("https://x/a.jpg", vec![1, 2, 3], None);
        assert_eq!(media.content_hash, content_hash(&[1, 2, 3]));
        assert_eq!(media.len(), 3);
        assert!(!media.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_success_returns_payload_and_content_type() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let body = vec![7u8; 4096];
        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/jpeg")
                    .set_body_bytes(body.clone()),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let media = fetcher
            .fetch(&format!("{}/a.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(media.bytes, body);
        assert_eq!(media.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(media.content_hash, content_hash(&body));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/ua.png"))
            .and(header("user-agent", user_agent::BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 2000]))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let result = fetcher.fetch(&format!("{}/ua.png", server.uri())).await;
        assert!(result.is_ok(), "expected UA to match: {result:?}");
    }

    #[tokio::test]
    async fn test_fetch_404_is_http_status() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let result = fetcher.fetch(&format!("{}/gone.jpg", server.uri())).await;
        assert!(matches!(
            result,
            Err(FetchError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_non_200_success_status_is_rejected() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(203).set_body_bytes(vec![0u8; 5000]))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let result = fetcher.fetch(&format!("{}/x.jpg", server.uri())).await;
        assert!(matches!(
            result,
            Err(FetchError::HttpStatus { status: 203, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_undersized_body_rejected() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 500]))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let result = fetcher.fetch(&format!("{}/pixel.gif", server.uri())).await;
        assert!(matches!(
            result,
            Err(FetchError::Undersized {
                bytes: 500,
                min_bytes: 1000,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0u8; 5000])
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_settings(Duration::from_millis(200), 1000).unwrap();
        let result = fetcher.fetch(&format!("{}/slow.jpg", server.uri())).await;
        assert!(
            matches!(result, Err(FetchError::Timeout { .. })),
            "expected timeout, got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = Fetcher::new().unwrap();
        assert!(matches!(
            fetcher.fetch("not-a-url").await,
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            fetcher.fetch("ftp://example.com/a.jpg").await,
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(fetcher.try_fetch("not-a-url").await.is_none());
    }
}
