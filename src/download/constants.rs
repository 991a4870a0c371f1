//! Constants for the download module (timeouts, size floor, worker bounds).

/// Per-request fetch timeout in seconds, covering connect and body.
pub const FETCH_TIMEOUT_SECS: u64 = 12;

/// Connect timeout in seconds; bounded by the overall fetch timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 8;

/// Bodies shorter than this are tracking pixels or error stubs.
pub const DEFAULT_MIN_BYTES: usize = 1000;

/// Default number of concurrent fetch workers.
pub const DEFAULT_MAX_WORKERS: usize = 6;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 64;
