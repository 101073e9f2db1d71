//! Template registry backed by handlebars.
//!
//! A [`TemplateSet`] owns compiled page templates, partials and helpers. It is
//! built once per load and shared read-only by every page render.

use std::fs;
use std::path::Path;

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;

/// Extension that marks a file as a template.
pub const TEMPLATE_EXTENSION: &str = "hbs";

/// Errors raised while loading or rendering templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compile {name}: {source}")]
    Compile {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Failed to render {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

handlebars_helper!(eq_helper: |a: Json, b: Json| a == b);
handlebars_helper!(json_helper: |value: Json| serde_json::to_string(value).unwrap_or_default());

/// Compiled templates and partials.
pub struct TemplateSet {
    registry: Handlebars<'static>,
}

impl TemplateSet {
    /// Create an empty set with the `eq` and `json` helpers registered.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("eq", Box::new(eq_helper));
        registry.register_helper("json", Box::new(json_helper));

        Self { registry }
    }

    /// Read a template file and register it under `name`.
    pub fn compile(&mut self, name: &str, path: &Path) -> Result<(), TemplateError> {
        let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;

        self.registry
            .register_template_string(name, source)
            .map_err(|source| TemplateError::Compile {
                name: name.to_string(),
                source: Box::new(source),
            })
    }

    /// Compile a template, registering an empty one if that fails.
    ///
    /// Rendering a template that failed to compile yields an empty string.
    pub fn compile_or_empty(&mut self, name: &str, path: &Path) {
        if let Err(e) = self.compile(name, path) {
            tracing::error!("Error compiling template {}: {}", name, e);
            // An empty source always compiles
            let _ = self.registry.register_template_string(name, "");
        }
    }

    /// Register every `*.hbs` file in `dir` as a partial named after its stem.
    ///
    /// Returns the number of partials registered. A missing directory
    /// registers nothing.
    pub fn register_partials(&mut self, dir: &Path) -> Result<usize, TemplateError> {
        if !dir.is_dir() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|source| TemplateError::Read {
            path: dir.display().to_string(),
            source,
        })?;

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|source| TemplateError::Read {
                path: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != TEMPLATE_EXTENSION {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let source = fs::read_to_string(&path).map_err(|source| TemplateError::Read {
                path: path.display().to_string(),
                source,
            })?;

            self.registry
                .register_partial(name, source)
                .map_err(|source| TemplateError::Compile {
                    name: name.to_string(),
                    source: Box::new(source),
                })?;

            tracing::debug!("Registered partial {}", name);
            count += 1;
        }

        Ok(count)
    }

    /// Render a registered template with the given context.
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, TemplateError> {
        self.registry
            .render(name, context)
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source: Box::new(source),
            })
    }

    /// Whether a template is registered under `name`.
    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new()
    }
}
