//! Mediarip Core Library
//!
//! This library turns batches of scraped media URLs into a deduplicated,
//! sequentially named and classified collection of files on disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Candidate URL extraction from text input
//! - [`download`] - Concurrent fetch with a serial, collision-free writer
//! - [`store`] - Hash index, sequential naming, file moves and archive export
//! - [`classify`] - Independent scorers producing keep/delete/move verdicts
//! - [`filter`] - Ordered filter steps with a re-scan between every step
//! - [`config`] - Run settings with TOML file loading

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod download;
pub mod filter;
pub mod media;
pub mod parser;
pub mod store;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use classify::{ColorMode, Verdict, VerdictKind};
pub use config::{ConfigError, Settings};
pub use download::{
    AcquireReport, AcquisitionContext, AcquisitionPipeline, DEFAULT_MAX_WORKERS, FetchError,
    FetchedMedia, Fetcher, PipelineError,
};
pub use filter::{FilterOrchestrator, FilterReport, FilterStep, parse_selection};
pub use media::MediaKind;
pub use parser::{MediaCandidate, ParseResult, parse_candidates};
pub use store::{HashIndex, Organizer, create_archive, next_index};
