//! User-Agent strings for media fetch requests.
//!
//! Media CDNs routinely reject non-browser agents, so fetches present a
//! desktop browser identity by default.

/// Browser User-Agent sent with every media fetch.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for fetch requests.
#[must_use]
pub(crate) fn default_fetch_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}
