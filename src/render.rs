//! Template selection, context assembly, and rendering.
//!
//! Renderable resources implement [`Renderable`]: a template name, a context
//! mapping, and a shared `render` that ties them together. The default
//! template for a resource is the file at the resource's own URL inside the
//! content tree — the site's Tera environment is built from a glob over that
//! tree, so template names are content-relative paths like `index.html` or
//! `blog/blog_entry.html`.
//!
//! Rendering never propagates failure. A missing template, an unresolvable
//! selection, or a template-engine error is logged as a warning and yields
//! `None`; callers treat that as "fall back to raw file transfer".

use tera::Context;
use thiserror::Error;
use tracing::warn;

use crate::blog::{BlogIndex, BlogPage};
use crate::resource::{Leaf, join_url};
use crate::site::Site;

/// Template a blog directory can drop next to its entries to restyle their
/// generated pages without front matter edits.
pub const BLOG_ENTRY_TEMPLATE: &str = "blog_entry.html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no template resolvable for {0}")]
    NoTemplate(String),
    #[error(transparent)]
    Tera(#[from] tera::Error),
}

/// Content type guessed from a filename extension, with `text/html` as the
/// fallback for anything undeterminable.
pub fn content_type(name: &str) -> String {
    match mime_guess::from_path(name).first() {
        Some(mime) => mime.essence_str().to_string(),
        None => {
            warn!(name, "could not determine content type, falling back to text/html");
            "text/html".to_string()
        }
    }
}

/// Tera template names are content-relative, URLs are absolute.
fn template_from_url(url: &str) -> String {
    url.trim_start_matches('/').to_string()
}

/// The capability of producing rendered content from a template.
pub trait Renderable {
    /// Select the template to render with.
    fn template_name(&self, site: &Site) -> Result<String, RenderError>;

    /// The resource's own context. Merged over any extra context the caller
    /// supplies, so the resource's values win.
    fn template_context(&self, site: &Site) -> Context;

    /// Render, merging `extra` under the resource's own context. Failures
    /// are logged and collapse to `None`.
    fn render(&self, site: &Site, extra: Context) -> Option<String> {
        let name = match self.template_name(site) {
            Ok(name) => name,
            Err(err) => {
                warn!(error = %err, "could not select a template");
                return None;
            }
        };
        let mut context = extra;
        context.extend(self.template_context(site));
        match site.templates().render(&name, &context) {
            Ok(html) => Some(html),
            Err(err) => {
                warn!(template = %name, error = %err, "could not render template");
                None
            }
        }
    }
}

impl Renderable for Leaf {
    fn template_name(&self, _site: &Site) -> Result<String, RenderError> {
        Ok(template_from_url(&self.url))
    }

    fn template_context(&self, site: &Site) -> Context {
        let mut context = Context::new();
        context.insert("url", &self.url);
        context.insert("name", &self.name);
        context.insert("root_url", &site.settings().root_url);
        context
    }
}

impl Renderable for BlogPage {
    /// Three-tier fallback: the entry's front matter override, then a
    /// `blog_entry.html` file next to the source entry, then the site-wide
    /// `blog_entry_template` setting.
    fn template_name(&self, site: &Site) -> Result<String, RenderError> {
        if let Some(template) = &self.meta.template {
            return Ok(template.clone());
        }
        if self.dir_path.join(BLOG_ENTRY_TEMPLATE).is_file() {
            return Ok(template_from_url(&join_url(
                &self.dir_url,
                BLOG_ENTRY_TEMPLATE,
            )));
        }
        site.settings()
            .blog_entry_template
            .clone()
            .ok_or_else(|| RenderError::NoTemplate(self.url.clone()))
    }

    fn template_context(&self, _site: &Site) -> Context {
        let mut context = Context::new();
        context.insert("title", &self.meta.title);
        context.insert("published_date", &self.meta.published_date);
        context.insert("body", &self.meta.body);
        context.insert("author", &self.meta.author);
        context.insert("teaser", &self.meta.teaser);
        context
    }
}

impl Renderable for BlogIndex {
    fn template_name(&self, _site: &Site) -> Result<String, RenderError> {
        Ok(template_from_url(&self.url))
    }

    fn template_context(&self, site: &Site) -> Context {
        let mut context = Context::new();
        context.insert("url", &self.url);
        context.insert("name", &self.name);
        context.insert("root_url", &site.settings().root_url);
        context
    }
}
