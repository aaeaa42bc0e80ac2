//! The site handle and request dispatch.
//!
//! [`Site`] is the request-context handle the whole crate works against: the
//! validated settings, the handler registry resolved once at startup, and the
//! Tera template environment built from a glob over the content directory.
//! It is constructed once by the host and passed explicitly into lookup and
//! rendering — there is no global registry.
//!
//! [`Site::get`] turns a slash-delimited path into a [`Response`] the way the
//! original traversal host would:
//!
//! ```text
//! /blog/post.html   → resolve segments → typed resource → respond
//!   container       → 302 redirect to its index.html
//!   blog index      → rendered entry listing
//!   html leaf/page  → template render, raw file on render failure
//!   other leaf      → raw file with its content type
//!   unresolvable    → 404 (a trailing `list` segment on a container
//!                      yields the plain-text walk listing instead)
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tera::{Context, Tera};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, Handler, Settings};
use crate::render::Renderable;
use crate::resource::{Container, LookupError, Resource};

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("content directory does not exist: {0}")]
    MissingContent(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("template environment error: {0}")]
    Templates(#[from] tera::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// URL → container kind, resolved from the `[handlers]` settings table at
/// startup.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    kinds: BTreeMap<String, Handler>,
}

impl HandlerRegistry {
    fn new(kinds: &BTreeMap<String, Handler>) -> Self {
        Self {
            kinds: kinds.clone(),
        }
    }

    /// Kind registered for a resolved URL, if any.
    pub fn kind_for(&self, url: &str) -> Option<Handler> {
        self.kinds.get(url).copied()
    }
}

/// A response body ready for the host to send or the exporter to write.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    pub location: Option<String>,
}

impl Response {
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body,
            location: None,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            content_type: "text/plain".to_string(),
            body: Vec::new(),
            location: Some(location.into()),
        }
    }

    pub fn not_found(url: &str) -> Self {
        Self {
            status: 404,
            content_type: "text/plain".to_string(),
            body: format!("not found: {url}").into_bytes(),
            location: None,
        }
    }
}

/// Settings, handler registry, and template environment for one site.
pub struct Site {
    settings: Settings,
    content: PathBuf,
    registry: HandlerRegistry,
    templates: Tera,
}

impl Site {
    pub fn new(settings: Settings) -> Result<Self, SiteError> {
        settings.validate()?;
        if !settings.content.is_dir() {
            return Err(SiteError::MissingContent(settings.content.clone()));
        }
        let content = settings.content.canonicalize()?;
        let registry = HandlerRegistry::new(&settings.handlers);
        // every html file under the content root doubles as a template,
        // addressed by its content-relative path
        let glob = content.join("**").join("*.html");
        let templates = Tera::new(&glob.to_string_lossy())?;
        Ok(Self {
            settings,
            content,
            registry,
            templates,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn templates(&self) -> &Tera {
        &self.templates
    }

    /// Canonicalized content root.
    pub fn content(&self) -> &Path {
        &self.content
    }

    /// Root factory: a fresh root container for one resolution walk.
    pub fn root(&self) -> Result<Container, LookupError> {
        Container::root(&self.content, self.settings.root)
    }

    /// Resolve a slash-delimited path segment-by-segment from the root.
    pub fn resolve(&self, path: &str) -> Result<Resource, LookupError> {
        let mut current = Resource::Container(self.root()?);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.lookup(self, segment)?;
        }
        Ok(current)
    }

    /// Resolve a path and render the terminal resource into a response.
    ///
    /// NotFound resolves to a 404 response; anything else that fails is an
    /// internal error (500-equivalent) carrying the resource path.
    pub fn get(&self, path: &str) -> Result<Response, SiteError> {
        debug!(path, "resolving request path");
        match self.resolve(path) {
            Ok(resource) => self.respond(resource),
            Err(LookupError::NotFound(_)) => {
                // an unresolved trailing "list" segment on a container is
                // the walk listing, not a 404
                let trimmed = path.trim_end_matches('/');
                let prefix = if trimmed == "list" {
                    Some("")
                } else {
                    trimmed.strip_suffix("/list")
                };
                if let Some(prefix) = prefix {
                    if let Ok(Resource::Container(dir)) = self.resolve(prefix) {
                        return self.list_view(&dir);
                    }
                }
                Ok(Response::not_found(path))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn respond(&self, resource: Resource) -> Result<Response, SiteError> {
        match resource {
            Resource::Container(dir) => {
                let location = format!("{}/{}", dir.url, self.settings.index_name);
                Ok(Response::redirect(location))
            }
            Resource::Index(index) => {
                let entries = index.entries(self)?;
                let mut extra = Context::new();
                extra.insert("entries", &entries);
                match index.render(self, extra) {
                    Some(html) => Ok(Response::ok("text/html", html.into_bytes())),
                    None => Ok(self.static_transfer(&index.path, "text/html", &index.url)),
                }
            }
            Resource::Entry(entry) => {
                // entry sources are plain text; only their generated pages
                // render as html
                Ok(self.static_transfer(&entry.path, "text/plain", &entry.url))
            }
            Resource::Page(page) => match page.render(self, Context::new()) {
                Some(html) => Ok(Response::ok("text/html", html.into_bytes())),
                None => Ok(self.static_transfer(&page.path, "text/html", &page.url)),
            },
            Resource::Leaf(leaf) => {
                let content_type = leaf.content_type();
                if content_type == "text/html" {
                    if let Some(html) = leaf.render(self, Context::new()) {
                        return Ok(Response::ok(content_type, html.into_bytes()));
                    }
                }
                Ok(self.static_transfer(&leaf.path, &content_type, &leaf.url))
            }
        }
    }

    /// Raw file transfer, the fallback for everything that does not render.
    fn static_transfer(&self, path: &Path, content_type: &str, url: &str) -> Response {
        match fs::read(path) {
            Ok(body) => Response::ok(content_type, body),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "no file behind resource");
                Response::not_found(url)
            }
        }
    }

    /// Newline-delimited URLs of every non-container resource under `dir`.
    fn list_view(&self, dir: &Container) -> Result<Response, SiteError> {
        let mut urls = Vec::new();
        for resource in dir.walk(self) {
            let resource = resource?;
            if !matches!(resource, Resource::Container(_)) {
                urls.push(resource.url().to_string());
            }
        }
        Ok(Response::ok("text/plain", urls.join("\n").into_bytes()))
    }
}
