//! Static page builder for folio project sites.
//!
//! Renders one detail page per project from JSON data and handlebars
//! templates, then copies static asset directories into the output.

pub mod assets;
pub mod builder;
pub mod data;
pub mod templates;

pub use assets::AssetError;
pub use builder::{BuildConfig, BuildError, BuildResult, PageMetadata, SiteBuilder};
pub use data::{LoadError, ProjectRecord, ProjectsData};
pub use templates::{TemplateError, TemplateSet};
