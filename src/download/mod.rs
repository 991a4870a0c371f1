//! Fetching and committing remote media.
//!
//! # Features
//!
//! - Whole-payload fetches with a browser User-Agent and a 12 s timeout
//! - Content-hash deduplication against everything already on disk
//! - Gapless `image_<N>.<ext>` naming from a single ordered writer
//! - Bounded worker pool (1..=64, default 6)
//!
//! See [`AcquisitionPipeline`] for the end-to-end flow.

mod client;
pub mod constants;
mod error;
mod filename;
mod pipeline;

pub use client::{FetchedMedia, Fetcher, content_hash};
pub use constants::DEFAULT_MAX_WORKERS;
pub use error::{FetchError, PipelineError};
pub use filename::{FALLBACK_EXTENSION, resolve_extension, sequential_filename};
pub use pipeline::{AcquireReport, AcquisitionContext, AcquisitionPipeline};
