//! Runs a filter selection against one target directory.
//!
//! The orchestrator is a small interpreter: one control loop walks the
//! selected [`FilterStep`]s, re-lists the target from disk before each one,
//! turns the listing into verdicts and hands them to the [`Organizer`].
//!
//! ```text
//! Idle -> Selected -> Running(0) -> ... -> Running(n-1) -> Finalizing -> Done
//!                                                       \-> Done (nothing succeeded)
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::step::FilterStep;
use crate::classify::{
    ColorMode, TextClassifier, Thresholds, Verdict, find_duplicates, route_by_color,
    score_sizes, split_by_media_type,
};
use crate::media::MediaKind;
use crate::store::{Applied, FinalizeReport, OrganizeError, Organizer, list_files};

/// Failure that aborts a single step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The target directory does not exist.
    #[error("target directory {0} does not exist")]
    MissingTarget(PathBuf),

    /// Listing or folder preparation failed.
    #[error(transparent)]
    Organize(#[from] OrganizeError),
}

/// Where the control loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum FilterState {
    /// Nothing selected yet.
    Idle,
    /// A selection was accepted.
    Selected,
    /// Executing the step at this position.
    Running(usize),
    /// Consolidating the layout.
    Finalizing,
    /// Terminal.
    Done,
}

/// Per-step tallies.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Which step ran.
    pub step: FilterStep,
    /// Files in the step's listing.
    pub examined: usize,
    /// Files removed.
    pub deleted: usize,
    /// Files relocated.
    pub moved: usize,
    /// Verdicts that could not be applied.
    pub failed: usize,
    /// Set when the step aborted.
    pub error: Option<String>,
}

impl StepReport {
    fn new(step: FilterStep) -> Self {
        Self {
            step,
            examined: 0,
            deleted: 0,
            moved: 0,
            failed: 0,
            error: None,
        }
    }

    /// True when the step ran to completion.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterReport {
    /// One entry per executed step, in order.
    pub steps: Vec<StepReport>,
    /// Present iff at least one step succeeded.
    pub finalized: Option<FinalizeReport>,
}

impl FilterReport {
    /// Files deleted across every step.
    #[must_use]
    pub fn total_deleted(&self) -> usize {
        self.steps.iter().map(|s| s.deleted).sum()
    }

    /// Files moved across every step.
    #[must_use]
    pub fn total_moved(&self) -> usize {
        self.steps.iter().map(|s| s.moved).sum()
    }
}

/// Drives filter steps over one target directory.
#[derive(Debug)]
pub struct FilterOrchestrator {
    organizer: Organizer,
    thresholds: Thresholds,
    color_mode: ColorMode,
    text: TextClassifier,
    state: FilterState,
}

impl FilterOrchestrator {
    /// Creates an orchestrator, probing optional text capabilities.
    #[must_use]
    pub fn new(target_dir: impl Into<PathBuf>, thresholds: Thresholds, color_mode: ColorMode) -> Self {
        let text = TextClassifier::probe(thresholds);
        Self::with_text_classifier(target_dir, thresholds, color_mode, text)
    }

    /// Creates an orchestrator with an explicit text classifier.
    #[must_use]
    pub fn with_text_classifier(
        target_dir: impl Into<PathBuf>,
        thresholds: Thresholds,
        color_mode: ColorMode,
        text: TextClassifier,
    ) -> Self {
        Self {
            organizer: Organizer::new(target_dir),
            thresholds,
            color_mode,
            text,
            state: FilterState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Target directory.
    #[must_use]
    pub fn target_dir(&self) -> &Path {
        self.organizer.target_dir()
    }

    /// Runs `steps` in order, then finalizes if any of them succeeded.
    ///
    /// Step failures are logged and recorded; they never stop later steps.
    #[instrument(skip(self), fields(target = %self.organizer.target_dir().display()))]
    pub fn run(&mut self, steps: &[FilterStep]) -> FilterReport {
        let mut report = FilterReport::default();
        self.state = FilterState::Selected;

        for (position, &step) in steps.iter().enumerate() {
            self.state = FilterState::Running(position);
            info!(%step, "running filter");

            let mut step_report = StepReport::new(step);
            if let Err(e) = self.run_step(step, &mut step_report) {
                error!(%step, error = %e, "filter failed");
                step_report.error = Some(e.to_string());
            } else {
                info!(
                    %step,
                    examined = step_report.examined,
                    deleted = step_report.deleted,
                    moved = step_report.moved,
                    failed = step_report.failed,
                    "filter complete"
                );
            }
            report.steps.push(step_report);
        }

        if report.steps.iter().any(StepReport::succeeded) {
            self.state = FilterState::Finalizing;
            report.finalized = Some(self.organizer.finalize());
        } else {
            info!("no filter completed, layout left untouched");
        }

        self.state = FilterState::Done;
        report
    }

    fn run_step(&self, step: FilterStep, report: &mut StepReport) -> Result<(), StepError> {
        let target = self.organizer.target_dir();
        if !target.is_dir() {
            return Err(StepError::MissingTarget(target.to_path_buf()));
        }

        let verdicts = match step {
            FilterStep::Size => {
                let images = self.list(|kind| kind.is_decodable_image())?;
                report.examined = images.len();
                score_sizes(&images, &self.thresholds)
            }
            FilterStep::Duplicate => {
                let media = self.list(|_| true)?;
                report.examined = media.len();
                find_duplicates(&media)
            }
            FilterStep::Color => {
                self.organizer.ensure_color_dirs()?;
                let images = self.list(|kind| kind.is_decodable_image())?;
                report.examined = images.len();
                route_by_color(&images, target, self.color_mode, &self.thresholds)
            }
            FilterStep::Text => {
                let images = self.list(|kind| kind.is_decodable_image())?;
                report.examined = images.len();
                self.text.score_all(&images)
            }
            FilterStep::Media => {
                let media = self.list(|_| true)?;
                report.examined = media.len();
                split_by_media_type(&media, target)
            }
        };

        self.apply_all(&verdicts, report);
        Ok(())
    }

    /// Fresh top-level listing of recognized media matching `keep`.
    fn list(&self, keep: impl Fn(MediaKind) -> bool) -> Result<Vec<PathBuf>, StepError> {
        let files = list_files(self.organizer.target_dir())?;
        Ok(files
            .into_iter()
            .filter(|path| MediaKind::from_path(path).is_some_and(&keep))
            .collect())
    }

    fn apply_all(&self, verdicts: &[Verdict], report: &mut StepReport) {
        for verdict in verdicts {
            match self.organizer.apply(verdict) {
                Ok(Applied::Kept) => {}
                Ok(Applied::Deleted) => report.deleted += 1,
                Ok(Applied::Moved(_)) => report.moved += 1,
                Err(e) => {
                    warn!(error = %e, reason = %verdict.reason, "could not apply verdict");
                    report.failed += 1;
                }
            }
        }
    }
}
