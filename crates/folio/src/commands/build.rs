//! One-shot build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_static::SiteBuilder;

use crate::config::load_config;

/// Run the build command.
pub async fn run(root: &Path, config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path)?.into_build_config(root);
    if let Some(output) = output {
        config.output_dir = output;
    }

    let builder = SiteBuilder::new(config).context("Failed to prepare templates")?;
    let result = builder.build().await.context("Build failed")?;

    tracing::info!(
        "Built {} pages and copied {} asset directories in {}ms",
        result.pages.len(),
        result.assets.len(),
        result.duration_ms
    );
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
