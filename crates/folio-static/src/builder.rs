//! Static site builder.

use std::collections::HashSet;
use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::assets::{copy_asset_dirs, AssetError, DEFAULT_ASSET_DIRS};
use crate::data::{load_or_empty, ProjectRecord, ProjectsData};
use crate::templates::{TemplateError, TemplateSet};

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; relative paths below resolve against it
    pub root: PathBuf,

    /// Templates directory
    pub templates_dir: PathBuf,

    /// Partials directory, relative to the templates directory
    pub partials_dir: PathBuf,

    /// Data directory
    pub data_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Outer page template file name
    pub layout_template: String,

    /// Project detail template file name
    pub detail_template: String,

    /// Site-wide data file name
    pub site_data: String,

    /// Project data file name
    pub projects_data: String,

    /// Asset directories copied into the output
    pub asset_dirs: Vec<String>,

    /// Navigation tag for detail pages
    pub active_nav: String,

    /// Stylesheets injected into every detail page
    pub custom_css: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            templates_dir: PathBuf::from("templates"),
            partials_dir: PathBuf::from("partials"),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("build/dist"),
            layout_template: "layout.hbs".to_string(),
            detail_template: "project-detail.hbs".to_string(),
            site_data: "site.json".to_string(),
            projects_data: "projects.json".to_string(),
            asset_dirs: DEFAULT_ASSET_DIRS.iter().map(|s| s.to_string()).collect(),
            active_nav: "works".to_string(),
            custom_css: vec![
                "css/modal_style.css".to_string(),
                "css/fukidashi.css".to_string(),
            ],
        }
    }
}

impl BuildConfig {
    /// Config rooted at `root` with conventional defaults.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn templates_path(&self) -> PathBuf {
        self.root.join(&self.templates_dir)
    }

    pub fn partials_path(&self) -> PathBuf {
        self.templates_path().join(&self.partials_dir)
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.data_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Page files written, in render order
    pub pages: Vec<String>,

    /// Asset directories copied
    pub assets: Vec<String>,

    /// Slugs written more than once in this pass
    pub overwritten: Vec<String>,

    /// Keys of projects skipped for lacking a slug
    pub skipped: Vec<String>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to load templates: {0}")]
    Templates(#[source] TemplateError),

    #[error("Failed to render {page}: {source}")]
    Render {
        page: String,
        #[source]
        source: TemplateError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy assets: {0}")]
    Assets(#[from] AssetError),
}

/// Per-page values exposed to templates as `page`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub path: String,
    pub active_nav: String,
    pub custom_css: Vec<String>,
}

#[derive(Serialize)]
struct DetailContext<'a> {
    project: &'a Value,
    site: &'a Value,
    page: &'a PageMetadata,
}

#[derive(Serialize)]
struct LayoutContext<'a> {
    content: &'a str,
    site: &'a Value,
    page: &'a PageMetadata,
}

/// Pages written by one render pass.
#[derive(Debug, Default)]
struct RenderedPages {
    pages: Vec<String>,
    overwritten: Vec<String>,
    skipped: Vec<String>,
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
    site: Value,
    projects: ProjectsData,
    templates: TemplateSet,
}

impl SiteBuilder {
    /// Create a builder, loading data and compiling templates.
    ///
    /// Missing or malformed data and templates are logged and replaced with
    /// empty defaults. Partial registration errors are returned.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let mut builder = Self {
            config,
            site: Value::Null,
            projects: ProjectsData::default(),
            templates: TemplateSet::new(),
        };
        builder.reload()?;
        Ok(builder)
    }

    /// Reload data files and recompile templates from disk.
    pub fn reload(&mut self) -> Result<(), BuildError> {
        let data_dir = self.config.data_path();
        let templates_dir = self.config.templates_path();

        let site = load_or_empty(&data_dir.join(&self.config.site_data));
        let projects = ProjectsData::load_or_empty(&data_dir.join(&self.config.projects_data));

        let mut templates = TemplateSet::new();
        let partials = templates
            .register_partials(&self.config.partials_path())
            .map_err(BuildError::Templates)?;
        if partials > 0 {
            tracing::debug!("Registered {} partials", partials);
        }

        for name in [&self.config.layout_template, &self.config.detail_template] {
            templates.compile_or_empty(name, &templates_dir.join(name));
        }

        self.site = site;
        self.projects = projects;
        self.templates = templates;

        tracing::debug!("Loaded {} projects", self.projects.len());
        Ok(())
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the static site.
    ///
    /// Failures are logged here and also returned to the caller.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        tracing::info!("Building site...");

        match self.run_build() {
            Ok(result) => {
                tracing::info!("Build completed successfully in {}ms", result.duration_ms);
                Ok(result)
            }
            Err(e) => {
                tracing::error!("Build failed: {}", e);
                let mut source = e.source();
                while let Some(cause) = source {
                    tracing::error!("  caused by: {}", cause);
                    source = cause.source();
                }
                Err(e)
            }
        }
    }

    fn run_build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let output_dir = self.config.output_path();

        // Ensure output directory exists
        fs::create_dir_all(&output_dir).map_err(|source| BuildError::Write {
            path: output_dir.display().to_string(),
            source,
        })?;

        tracing::info!("Building project detail pages...");
        let rendered = self.render_pages(&output_dir)?;

        tracing::info!("Copying static assets...");
        let assets = copy_asset_dirs(&self.config.root, &output_dir, &self.config.asset_dirs)?;

        Ok(BuildResult {
            pages: rendered.pages,
            assets,
            overwritten: rendered.overwritten,
            skipped: rendered.skipped,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir,
        })
    }

    /// Render one detail page per project into `output_dir`.
    fn render_pages(&self, output_dir: &Path) -> Result<RenderedPages, BuildError> {
        let mut rendered = RenderedPages::default();
        let mut written: HashSet<&str> = HashSet::new();

        for project in self.projects.iter() {
            if project.slug.is_empty() {
                tracing::warn!("Skipping project '{}': missing slug", project.key);
                rendered.skipped.push(project.key.clone());
                continue;
            }

            if !written.insert(project.slug.as_str()) {
                tracing::warn!(
                    "Project '{}' reuses slug '{}'; overwriting earlier page",
                    project.key,
                    project.slug
                );
                rendered.overwritten.push(project.slug.clone());
            }

            let file_name = project.page_file_name();
            let html = self.render_page(project)?;

            let output_path = output_dir.join(&file_name);
            fs::write(&output_path, html).map_err(|source| BuildError::Write {
                path: output_path.display().to_string(),
                source,
            })?;

            tracing::info!("  Generated: {}", file_name);
            rendered.pages.push(file_name);
        }

        Ok(rendered)
    }

    /// Render the detail template nested inside the layout.
    fn render_page(&self, project: &ProjectRecord) -> Result<String, BuildError> {
        let page = self.page_metadata(project);
        let render_error = |source| BuildError::Render {
            page: page.path.clone(),
            source,
        };

        let content = self
            .templates
            .render(
                &self.config.detail_template,
                &DetailContext {
                    project: &project.fields,
                    site: &self.site,
                    page: &page,
                },
            )
            .map_err(render_error)?;

        self.templates
            .render(
                &self.config.layout_template,
                &LayoutContext {
                    content: &content,
                    site: &self.site,
                    page: &page,
                },
            )
            .map_err(render_error)
    }

    fn page_metadata(&self, project: &ProjectRecord) -> PageMetadata {
        PageMetadata {
            title: project.title.clone(),
            path: project.page_file_name(),
            active_nav: self.config.active_nav.clone(),
            custom_css: self.config.custom_css.clone(),
        }
    }
}
