//! Filter command handler.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use mediarip_core::classify::Thresholds;
use mediarip_core::{ColorMode, FilterOrchestrator, FilterReport, FilterStep, parse_selection};

use crate::cli::FilterArgs;

/// Parses `selection`, warning about unknown tokens. Empty when nothing is runnable.
pub(crate) fn selected_steps(selection: &str) -> Vec<FilterStep> {
    let parsed = parse_selection(selection);
    if !parsed.unknown.is_empty() {
        warn!(unknown = ?parsed.unknown, "Ignored unknown filter options");
    }
    parsed.steps
}

/// Runs the orchestrator on a blocking thread.
pub(crate) async fn run_filters(
    dir: &Path,
    steps: Vec<FilterStep>,
    thresholds: Thresholds,
    color_mode: ColorMode,
) -> Result<FilterReport> {
    let target = dir.to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        let mut orchestrator = FilterOrchestrator::new(target, thresholds, color_mode);
        orchestrator.run(&steps)
    })
    .await
    .context("filter task panicked")?;

    info!(
        steps = report.steps.len(),
        deleted = report.total_deleted(),
        moved = report.total_moved(),
        finalized = report.finalized.is_some(),
        "Filtering complete"
    );
    Ok(report)
}

pub async fn run_filter_command(
    args: &FilterArgs,
    thresholds: Thresholds,
    color_mode: ColorMode,
) -> Result<()> {
    let steps = selected_steps(&args.steps);
    if steps.is_empty() {
        info!("No valid filters selected");
        return Ok(());
    }
    if !args.dir.is_dir() {
        warn!(dir = %args.dir.display(), "No images to filter");
        return Ok(());
    }

    let report = run_filters(&args.dir, steps, thresholds, color_mode).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
