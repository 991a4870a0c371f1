//! Fetch command handler: acquire, then optionally filter and archive.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use mediarip_core::{
    AcquireReport, AcquisitionContext, AcquisitionPipeline, Fetcher, FilterReport, Settings,
    parse_candidates,
};

use super::archive::archive_dir;
use super::filter::{run_filters, selected_steps};
use crate::cli::FetchArgs;
use crate::terminal;

/// JSON summary of a fetch run.
#[derive(Debug, Serialize)]
struct FetchSummary {
    target: PathBuf,
    acquire: AcquireReport,
    filter: Option<FilterReport>,
    archive: Option<PathBuf>,
}

fn read_input(args: &FetchArgs) -> Result<Option<String>> {
    if !args.urls.is_empty() {
        return Ok(Some(args.urls.join("\n")));
    }
    if io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read URLs from stdin")?;
    Ok(Some(buffer))
}

pub async fn run_fetch_command(args: &FetchArgs, settings: &Settings, quiet: bool) -> Result<()> {
    let Some(input_text) = read_input(args)? else {
        info!("No input provided. Pipe URLs via stdin or pass them as arguments.");
        info!("Example: cat urls.txt | mediarip fetch ./pins");
        return Ok(());
    };

    let parsed = parse_candidates(&input_text);
    for skipped in &parsed.skipped {
        warn!(skipped = %skipped, "Skipped unrecognized input");
    }
    info!(
        urls = parsed.len(),
        skipped = parsed.skipped_count(),
        "Parsed input"
    );

    let fetch = &settings.fetch;
    let fetcher = Fetcher::with_settings(fetch.timeout(), fetch.min_bytes)
        .context("Failed to build HTTP client")?;
    let pipeline = AcquisitionPipeline::new(fetcher, fetch.workers)?;
    let mut ctx = AcquisitionContext::open(&args.dir)?;
    debug!(
        next_index = ctx.next_index(),
        known = ctx.hash_index().len(),
        "Target scanned"
    );

    let acquire = if parsed.is_empty() {
        info!("No valid URLs found in input");
        AcquireReport {
            next_index: ctx.next_index(),
            ..AcquireReport::default()
        }
    } else {
        let spinner = terminal::start_spinner(
            quiet,
            format!(
                "Fetching {} URLs with {} workers...",
                parsed.len(),
                pipeline.workers()
            ),
        );
        let result = pipeline.acquire(&parsed.items, &mut ctx).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result?
    };
    info!(
        written = acquire.written,
        skipped = acquire.skipped,
        next_index = acquire.next_index,
        "Fetch complete"
    );

    let filter = match args.filter.as_deref().map(selected_steps) {
        Some(steps) if !steps.is_empty() => Some(
            run_filters(
                &args.dir,
                steps,
                settings.filters.thresholds(),
                settings.filters.color_mode(),
            )
            .await?,
        ),
        Some(_) => {
            info!("No valid filters selected");
            None
        }
        None => None,
    };

    let archive = if args.zip {
        Some(archive_dir(&args.dir).await?)
    } else {
        None
    };

    if args.json {
        let summary = FetchSummary {
            target: args.dir.clone(),
            acquire,
            filter,
            archive,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
