//! JSON data loading for site and project records.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

/// Errors that can occur while loading a data file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON object at the top level of {0}")]
    NotAnObject(String),
}

/// Read and parse a JSON file.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load a JSON file, falling back to an empty object on failure.
///
/// The failure is logged and the build keeps going with degraded data.
pub fn load_or_empty(path: &Path) -> Value {
    match load_json(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Error loading {}: {}", file_name(path), e);
            Value::Object(Map::new())
        }
    }
}

/// A single project entry from `projects.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    /// Key of the entry in the source object
    pub key: String,

    /// Project title, empty when missing
    pub title: String,

    /// Output slug, empty when missing
    pub slug: String,

    /// The raw record, handed to templates as `project`
    pub fields: Value,
}

impl ProjectRecord {
    fn from_entry(key: String, fields: Value) -> Self {
        let title = fields
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let slug = fields
            .get("slug")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            key,
            title,
            slug,
            fields,
        }
    }

    /// Output file name for this project's detail page.
    pub fn page_file_name(&self) -> String {
        format!("{}-details.html", self.slug)
    }
}

/// Project records in source order.
#[derive(Debug, Clone, Default)]
pub struct ProjectsData {
    records: Vec<ProjectRecord>,
}

impl ProjectsData {
    /// Build project records from the top-level object of `projects.json`.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let Value::Object(map) = value else {
            return Err(LoadError::NotAnObject("projects data".to_string()));
        };

        let records = map
            .into_iter()
            .map(|(key, fields)| ProjectRecord::from_entry(key, fields))
            .collect();

        Ok(Self { records })
    }

    /// Load project records, falling back to an empty list on failure.
    pub fn load_or_empty(path: &Path) -> Self {
        let result = load_json(path).and_then(|value| {
            Self::from_value(value).map_err(|_| LoadError::NotAnObject(path.display().to_string()))
        });

        match result {
            Ok(projects) => projects,
            Err(e) => {
                tracing::error!("Error loading {}: {}", file_name(path), e);
                Self::default()
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
