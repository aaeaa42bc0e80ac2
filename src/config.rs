//! Site configuration module.
//!
//! Handles loading and validating the `dirsite.toml` settings file. The file
//! is sparse — every key is optional and falls back to a stock default:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content = "content"              # Directory served as the site root
//! root_url = "/"                   # URL prefix the site is mounted under
//! index_name = "index.html"        # Segment that triggers the blog index
//! root = "plain"                   # Container kind at the root: "plain" | "blog"
//! # blog_entry_template = "..."    # Site-wide fallback template for entries
//!
//! [handlers]
//! # Map resolved URLs to specialized container kinds. Keys must start
//! # with "/" and name a directory inside the content root.
//! "/blog" = "blog"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The `[handlers]` table is the override registry: during traversal, when a
//! segment resolves to a directory whose URL appears here, the registered
//! kind is used instead of inheriting the parent container's kind. It is
//! resolved once at startup into [`crate::site::HandlerRegistry`] and passed
//! through the site handle, never consulted as global state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Container kind a directory resolves to during traversal.
///
/// `Plain` serves files and subdirectories as-is. `Blog` additionally
/// interprets markdown files as blog entries with generated HTML pages and
/// answers the index segment with a synthetic listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handler {
    Plain,
    Blog,
}

/// Settings loaded from `dirsite.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory served as the site root.
    pub content: PathBuf,
    /// URL prefix the site is mounted under, exposed to templates.
    pub root_url: String,
    /// Segment that resolves to the synthetic blog index at a blog root.
    pub index_name: String,
    /// Container kind of the content root.
    pub root: Handler,
    /// Site-wide fallback template for blog entry pages.
    pub blog_entry_template: Option<String>,
    /// Override registry: resolved URL → container kind.
    pub handlers: BTreeMap<String, Handler>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            root_url: "/".to_string(),
            index_name: "index.html".to_string(),
            root: Handler::Plain,
            blog_entry_template: None,
            handlers: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. A missing file yields the defaults;
    /// a present-but-invalid file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in self.handlers.keys() {
            if !url.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "handler key must be a URL starting with '/': {url}"
                )));
            }
            if url.len() > 1 && url.ends_with('/') {
                return Err(ConfigError::Validation(format!(
                    "handler key must not end with '/': {url}"
                )));
            }
        }
        if self.index_name.is_empty() {
            return Err(ConfigError::Validation(
                "index_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
