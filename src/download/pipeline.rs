//! Two-phase acquisition: parallel fetch, then a single ordered writer.
//!
//! # Overview
//!
//! Workers only fetch and hash; they never touch the target directory. Once
//! every worker has finished, the writer walks the results in input order,
//! drops payloads whose hash is already known, and names the rest with a
//! gapless `image_<N>` sequence.
//!
//! # Example
//!
//! ```no_run
//! use mediarip_core::download::{AcquisitionContext, AcquisitionPipeline, Fetcher};
//! use mediarip_core::parser::MediaCandidate;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = AcquisitionPipeline::new(Fetcher::new()?, 6)?;
//! let mut ctx = AcquisitionContext::open(Path::new("./pins"))?;
//! let batch = vec![MediaCandidate::from("https://i.example.com/originals/a.jpg")];
//! let report = pipeline.acquire(&batch, &mut ctx).await?;
//! println!("written {}, skipped {}", report.written, report.skipped);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::client::{FetchedMedia, Fetcher};
use super::constants::{MAX_WORKERS, MIN_WORKERS};
use super::error::PipelineError;
use super::filename::{resolve_extension, sequential_filename};
use crate::parser::MediaCandidate;
use crate::store::{HashIndex, next_index};

/// Per-target state carried across acquisition batches.
///
/// Opening a context rescans the directory, so a fresh run after a crash
/// never reuses a hash or an index.
#[derive(Debug)]
pub struct AcquisitionContext {
    target_dir: PathBuf,
    hash_index: HashIndex,
    next_index: u64,
}

impl AcquisitionContext {
    /// Creates `target_dir` if needed and seeds the hash index and cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::TargetDir`] if the directory cannot be created.
    #[instrument(fields(target = %target_dir.display()))]
    pub fn open(target_dir: &Path) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(target_dir)
            .map_err(|e| PipelineError::target_dir(target_dir, e))?;
        let hash_index = HashIndex::build(target_dir);
        let next_index = next_index(target_dir);
        debug!(hashes = hash_index.len(), next_index, "acquisition context opened");
        Ok(Self {
            target_dir: target_dir.to_path_buf(),
            hash_index,
            next_index,
        })
    }

    /// Builds a context from explicit parts without scanning disk.
    #[must_use]
    pub fn with_state(target_dir: impl Into<PathBuf>, hash_index: HashIndex, next_index: u64) -> Self {
        Self {
            target_dir: target_dir.into(),
            hash_index,
            next_index,
        }
    }

    /// Directory files are written into.
    #[must_use]
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Hashes known so far.
    #[must_use]
    pub fn hash_index(&self) -> &HashIndex {
        &self.hash_index
    }

    /// Index the next written file will receive.
    #[must_use]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}

/// Outcome of one [`AcquisitionPipeline::acquire`] batch.
#[derive(Debug, Default, Clone, Serialize)]
pub struct AcquireReport {
    /// Files committed to disk.
    pub written: usize,
    /// Candidates that produced no file (fetch failure, duplicate, write error).
    pub skipped: usize,
    /// Of `skipped`, how many were byte-identical to a known file.
    pub duplicates: usize,
    /// Cursor after the batch.
    pub next_index: u64,
    /// Paths written, in index order.
    pub files: Vec<PathBuf>,
}

impl AcquireReport {
    /// Candidates processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.written + self.skipped
    }

    /// Folds another batch into this one.
    pub fn merge(&mut self, other: AcquireReport) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.duplicates += other.duplicates;
        self.next_index = other.next_index;
        self.files.extend(other.files);
    }
}

/// Bounded fan-out fetcher with an ordered, deduplicating writer.
///
/// # Concurrency Model
///
/// - Each fetch runs in its own Tokio task
/// - A semaphore permit is acquired before spawning (at most `workers` in flight)
/// - A panicked task counts as one skipped candidate
/// - The writer starts only after every task has been joined
#[derive(Debug)]
pub struct AcquisitionPipeline {
    semaphore: Arc<Semaphore>,
    workers: usize,
    fetcher: Fetcher,
}

impl AcquisitionPipeline {
    /// Creates a pipeline running at most `workers` fetches at once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWorkers`] outside 1..=64.
    #[instrument(level = "debug", skip(fetcher))]
    pub fn new(fetcher: Fetcher, workers: usize) -> Result<Self, PipelineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(PipelineError::InvalidWorkers {
                value: workers,
                min: MIN_WORKERS,
                max: MAX_WORKERS,
            });
        }
        debug!(workers, min_bytes = fetcher.min_bytes(), "creating acquisition pipeline");
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            fetcher,
        })
    }

    /// Configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetches `candidates` and commits the new ones into the context's target.
    ///
    /// Individual failures never fail the batch; they are counted as skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SemaphoreClosed`] if the worker pool is gone.
    #[instrument(skip(self, candidates, ctx), fields(target = %ctx.target_dir.display(), count = candidates.len()))]
    pub async fn acquire(
        &self,
        candidates: &[MediaCandidate],
        ctx: &mut AcquisitionContext,
    ) -> Result<AcquireReport, PipelineError> {
        info!(start_index = ctx.next_index, "starting acquisition batch");

        let fetched = self.fetch_all(candidates).await?;

        let mut report = AcquireReport::default();
        for (candidate, media) in candidates.iter().zip(fetched) {
            let Some(media) = media else {
                report.skipped += 1;
                continue;
            };
            commit(candidate, media, ctx, &mut report).await;
        }
        report.next_index = ctx.next_index;

        info!(
            written = report.written,
            skipped = report.skipped,
            duplicates = report.duplicates,
            next_index = report.next_index,
            "acquisition batch complete"
        );
        Ok(report)
    }

    /// Phase 1: fan out, then join in input order.
    async fn fetch_all(
        &self,
        candidates: &[MediaCandidate],
    ) -> Result<Vec<Option<FetchedMedia>>, PipelineError> {
        let mut handles = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::SemaphoreClosed)?;

            let fetcher = self.fetcher.clone();
            let url = candidate.url.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                fetcher.try_fetch(&url).await
            }));
        }

        debug!(task_count = handles.len(), "waiting for fetches to complete");

        let mut results = Vec::with_capacity(handles.len());
        for (candidate, handle) in candidates.iter().zip(handles) {
            match handle.await {
                Ok(media) => results.push(media),
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "fetch task panicked");
                    results.push(None);
                }
            }
        }
        Ok(results)
    }
}

/// Phase 2 step for one fetched payload.
async fn commit(
    candidate: &MediaCandidate,
    media: FetchedMedia,
    ctx: &mut AcquisitionContext,
    report: &mut AcquireReport,
) {
    if ctx.hash_index.contains(&media.content_hash) {
        debug!(url = %media.url, hash = %media.content_hash, "duplicate payload");
        report.skipped += 1;
        report.duplicates += 1;
        return;
    }

    let ext = resolve_extension(
        media.content_type.as_deref(),
        candidate.content_type.as_deref(),
        &media.url,
    );
    let path = ctx
        .target_dir
        .join(sequential_filename(ctx.next_index, &ext));

    if let Err(e) = tokio::fs::write(&path, &media.bytes).await {
        warn!(path = %path.display(), error = %e, "could not write file");
        report.skipped += 1;
        return;
    }

    debug!(url = %media.url, path = %path.display(), bytes = media.len(), "written");
    ctx.hash_index.insert(media.content_hash);
    ctx.next_index += 1;
    report.written += 1;
    report.files.push(path);
}
