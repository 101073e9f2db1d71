//! Configuration file handling (folio.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use folio_static::BuildConfig;
use serde::Deserialize;

/// Configuration file structure (folio.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    templates: TemplatesConfig,
    #[serde(default)]
    data: DataConfig,
    #[serde(default)]
    assets: AssetsConfig,
    #[serde(default)]
    page: PageConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PathsConfig {
    templates: Option<PathBuf>,
    data: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TemplatesConfig {
    layout: Option<String>,
    detail: Option<String>,
    /// Partials directory, relative to the templates directory
    partials: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DataConfig {
    site: Option<String>,
    projects: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AssetsConfig {
    dirs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PageConfig {
    active_nav: Option<String>,
    custom_css: Option<Vec<String>>,
}

impl ConfigFile {
    /// Merge file settings over the defaults for `root`.
    pub fn into_build_config(self, root: &Path) -> BuildConfig {
        let defaults = BuildConfig::with_root(root);

        BuildConfig {
            templates_dir: self.paths.templates.unwrap_or(defaults.templates_dir),
            data_dir: self.paths.data.unwrap_or(defaults.data_dir),
            output_dir: self.paths.output.unwrap_or(defaults.output_dir),
            layout_template: self.templates.layout.unwrap_or(defaults.layout_template),
            detail_template: self.templates.detail.unwrap_or(defaults.detail_template),
            partials_dir: self.templates.partials.unwrap_or(defaults.partials_dir),
            site_data: self.data.site.unwrap_or(defaults.site_data),
            projects_data: self.data.projects.unwrap_or(defaults.projects_data),
            asset_dirs: self.assets.dirs.unwrap_or(defaults.asset_dirs),
            active_nav: self.page.active_nav.unwrap_or(defaults.active_nav),
            custom_css: self.page.custom_css.unwrap_or(defaults.custom_css),
            root: defaults.root,
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    tracing::debug!("No config at {}, using defaults", path.display());
    Ok(ConfigFile::default())
}
