//! URL extraction and validation from scraped text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use url::Url;

use super::error::{MAX_URL_LENGTH, ParseError};

/// Matches http:// and https:// URLs up to whitespace, angle brackets or quotes.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'\]]+"#).expect("URL regex is valid") // Static pattern, safe to panic
});

/// Finds every http(s) URL in `input` and validates each one independently.
///
/// # Examples
///
/// ```
/// use mediarip_core::parser::extract_urls;
///
/// let results = extract_urls("src=https://i.example.com/736x/a.jpg alt=pin");
/// assert_eq!(results.len(), 1);
/// assert!(results[0].is_ok());
/// ```
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn extract_urls(input: &str) -> Vec<Result<String, ParseError>> {
    let mut results = Vec::new();

    for url_match in URL_PATTERN.find_iter(input) {
        let cleaned = clean_url_trailing(url_match.as_str());
        trace!(url = %cleaned, "found URL candidate");

        match validate_url(cleaned) {
            Ok(validated) => results.push(Ok(validated)),
            Err(e) => {
                debug!(url = %cleaned, error = %e, "URL validation failed");
                results.push(Err(e));
            }
        }
    }

    results
}

/// Strips sentence punctuation and unbalanced closing brackets glued to a URL.
fn clean_url_trailing(url: &str) -> &str {
    let mut result = url;

    while let Some(last) = result.chars().last() {
        match last {
            ',' | ';' | ':' | '!' | '?' => result = &result[..result.len() - 1],
            '.' => {
                // `photo.` loses the dot; `photo.jpg` never ends in one.
                result = &result[..result.len() - 1];
            }
            ')' | ']' => {
                let open = if last == ')' { '(' } else { '[' };
                let open_count = result.chars().filter(|&c| c == open).count();
                let close_count = result.chars().filter(|&c| c == last).count();
                if close_count > open_count {
                    result = &result[..result.len() - 1];
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    result
}

/// Validates and normalizes a URL: bounded length, http(s) scheme, has a host.
pub(crate) fn validate_url(raw: &str) -> Result<String, ParseError> {
    if raw.len() > MAX_URL_LENGTH {
        return Err(ParseError::too_long(raw));
    }

    let parsed = Url::parse(raw).map_err(|e| ParseError::malformed(raw, &e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(ParseError::unsupported_scheme(raw, scheme)),
    }

    if parsed.host().is_none() {
        return Err(ParseError::no_host(raw));
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls_from_img_markup() {
        let input = r#"<img src="https://i.example.com/originals/ab/cd.jpg" srcset="https://i.example.com/236x/ab/cd.jpg 1x">"#;
        let results = extract_urls(input);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap(),
            "https://i.example.com/originals/ab/cd.jpg"
        );
        assert_eq!(
            results[1].as_ref().unwrap(),
            "https://i.example.com/236x/ab/cd.jpg"
        );
    }

    #[test]
    fn test_extract_urls_no_urls() {
        assert!(extract_urls("just some text").is_empty());
        assert!(extract_urls("").is_empty());
    }

    #[test]
    fn test_clean_url_trailing_sentence_punctuation() {
        assert_eq!(
            clean_url_trailing("https://v.example.com/clip.mp4."),
            "https://v.example.com/clip.mp4"
        );
        assert_eq!(
            clean_url_trailing("https://v.example.com/clip.mp4,"),
            "https://v.example.com/clip.mp4"
        );
    }

    #[test]
    fn test_clean_url_trailing_keeps_balanced_parens() {
        assert_eq!(
            clean_url_trailing("https://example.com/a_(b).png"),
            "https://example.com/a_(b).png"
        );
        assert_eq!(
            clean_url_trailing("https://example.com/a.png)"),
            "https://example.com/a.png"
        );
    }

    #[test]
    fn test_validate_url_rejects_non_web_scheme() {
        assert!(validate_url("ftp://files.example.com/a.jpg").is_err());
        assert!(validate_url("file:///tmp/a.jpg").is_err());
    }

    #[test]
    fn test_validate_url_normalizes() {
        assert_eq!(
            validate_url("https://example.com").unwrap(),
            "https://example.com/"
        );
    }
}
