//! Watch mode command.

use std::path::Path;

use anyhow::{Context, Result};
use folio_static::SiteBuilder;

use crate::config::load_config;

/// Run the watch command. Does not return while the watcher is alive.
pub async fn run(root: &Path, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?.into_build_config(root);
    let builder = SiteBuilder::new(config).context("Failed to prepare templates")?;

    folio_watch::watch(builder)
        .await
        .context("File watcher stopped")?;

    Ok(())
}
