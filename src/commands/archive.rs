//! Archive command handler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use mediarip_core::create_archive;

/// Packs `dir` on a blocking thread and returns the archive path.
pub(crate) async fn archive_dir(dir: &Path) -> Result<PathBuf> {
    let target = dir.to_path_buf();
    let archive = tokio::task::spawn_blocking(move || create_archive(&target))
        .await
        .context("archive task panicked")?
        .with_context(|| format!("Failed to archive '{}'", dir.display()))?;
    info!(archive = %archive.display(), "Archive written");
    Ok(archive)
}

pub async fn run_archive_command(dir: &Path) -> Result<()> {
    let archive = archive_dir(dir).await?;
    println!("{}", archive.display());
    Ok(())
}
