//! Core resource model: leaves, containers, segment lookup, recursive walk.
//!
//! Everything the site serves is a [`Resource`] resolved from the directory
//! tree. Resolution is traversal: a request path is split into segments and
//! each segment is looked up on the container produced by the previous one.
//! The decision for a single segment is pure — it depends only on the current
//! filesystem state, never on caches:
//!
//! ```text
//! lookup(key)
//!   key hidden (leading '.') or backup (trailing '~')  →  NotFound
//!   joined path is a regular file                      →  leaf (kind-specific)
//!   joined path is a directory                         →  container (registry
//!                                                          may override kind)
//!   otherwise                                          →  NotFound
//! ```
//!
//! Containers carry a [`Handler`] kind. `Plain` containers produce [`Leaf`]
//! resources for files; `Blog` containers delegate to [`crate::blog::lookup`],
//! which layers entry parsing and generated pages on top of the same base
//! decision. Child containers inherit their parent's kind unless the handler
//! registry names a different one for the resolved URL.
//!
//! URLs are derived at construction: a child's URL is its parent's URL plus
//! the segment name. The root container has no name and an empty URL, so the
//! content directory itself never shows up in generated URLs. Parent linkage
//! is exactly this derivation — resources never own or point back to their
//! parents.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::blog::{self, BlogEntry, BlogIndex, BlogPage};
use crate::config::Handler;
use crate::render;
use crate::site::Site;

#[derive(Error, Debug)]
pub enum LookupError {
    /// The segment does not resolve to any file, directory, or synthetic
    /// resource. Swallowed during walks; surfaced as 404 by the dispatcher.
    #[error("not found: {0}")]
    NotFound(String),
    /// Construction-time invariant violation: a leaf wants a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),
    /// Construction-time invariant violation: a container wants a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    /// A markdown source could not be interpreted as a blog entry.
    #[error(transparent)]
    Entry(#[from] blog::EntryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Join a segment onto a parent URL. The root URL is empty, so every
/// resolved URL starts with `/`.
pub(crate) fn join_url(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

/// Any resolved object in the tree.
///
/// Lookup and iteration return this tagged union; the dispatcher matches on
/// it to pick a response strategy.
#[derive(Debug, Clone)]
pub enum Resource {
    Leaf(Leaf),
    Container(Container),
    Entry(Box<BlogEntry>),
    Page(BlogPage),
    Index(BlogIndex),
}

impl Resource {
    /// Traversal-derived URL from the tree root.
    pub fn url(&self) -> &str {
        match self {
            Resource::Leaf(leaf) => &leaf.url,
            Resource::Container(dir) => &dir.url,
            Resource::Entry(entry) => &entry.url,
            Resource::Page(page) => &page.url,
            Resource::Index(index) => &index.url,
        }
    }

    /// Final path segment. `None` only for the root container.
    pub fn name(&self) -> Option<&str> {
        match self {
            Resource::Leaf(leaf) => Some(&leaf.name),
            Resource::Container(dir) => dir.name.as_deref(),
            Resource::Entry(entry) => Some(&entry.name),
            Resource::Page(page) => Some(&page.name),
            Resource::Index(index) => Some(&index.name),
        }
    }

    /// Filesystem path this resource is derived from. Generated pages and
    /// index markers point at paths that need not exist.
    pub fn path(&self) -> &Path {
        match self {
            Resource::Leaf(leaf) => &leaf.path,
            Resource::Container(dir) => &dir.path,
            Resource::Entry(entry) => &entry.path,
            Resource::Page(page) => &page.path,
            Resource::Index(index) => &index.path,
        }
    }

    /// Resolve one segment. Only containers have children; every other
    /// variant answers NotFound.
    pub fn lookup(&self, site: &Site, key: &str) -> Result<Resource, LookupError> {
        match self {
            Resource::Container(dir) => dir.lookup(site, key),
            _ => Err(LookupError::NotFound(join_url(self.url(), key))),
        }
    }
}

/// A resource backed by exactly one regular file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaf {
    pub path: PathBuf,
    pub name: String,
    pub url: String,
}

impl Leaf {
    pub fn new(path: PathBuf, name: String, parent_url: &str) -> Result<Self, LookupError> {
        if !path.is_file() {
            return Err(LookupError::NotAFile(path));
        }
        let url = join_url(parent_url, &name);
        Ok(Self { path, name, url })
    }

    /// Content type derived from the filename extension, re-derived on each
    /// access.
    pub fn content_type(&self) -> String {
        render::content_type(&self.name)
    }
}

/// A resource backed by a directory.
#[derive(Debug, Clone)]
pub struct Container {
    pub path: PathBuf,
    pub name: Option<String>,
    pub url: String,
    pub kind: Handler,
    parent_kind: Option<Handler>,
}

impl Container {
    /// Root factory: the container for the content directory, with no name
    /// so the directory itself stays out of generated URLs.
    pub fn root(path: &Path, kind: Handler) -> Result<Self, LookupError> {
        let path = path.canonicalize()?;
        if path.is_file() {
            return Err(LookupError::NotADirectory(path));
        }
        Ok(Self {
            path,
            name: None,
            url: String::new(),
            kind,
            parent_kind: None,
        })
    }

    /// Whether this container starts a blog subtree: either the tree root,
    /// or a blog container whose parent is not one. Only here does the index
    /// segment produce the synthetic listing.
    pub(crate) fn is_subtree_root(&self) -> bool {
        self.parent_kind != Some(self.kind)
    }

    /// Resolve a single path segment to a child resource.
    pub fn lookup(&self, site: &Site, key: &str) -> Result<Resource, LookupError> {
        // hidden-file and backup-file conventions are never resolvable,
        // regardless of what is on disk
        if key.starts_with('.') || key.ends_with('~') {
            return Err(LookupError::NotFound(join_url(&self.url, key)));
        }
        match self.kind {
            Handler::Plain => self.lookup_plain(site, key),
            Handler::Blog => blog::lookup(site, self, key),
        }
    }

    fn lookup_plain(&self, site: &Site, key: &str) -> Result<Resource, LookupError> {
        let path = self.path.join(key);
        if path.is_file() {
            Ok(Resource::Leaf(Leaf::new(path, key.to_string(), &self.url)?))
        } else if path.is_dir() {
            Ok(Resource::Container(self.child(site, key)?))
        } else {
            Err(LookupError::NotFound(join_url(&self.url, key)))
        }
    }

    /// Construct the child container for `key`, consulting the handler
    /// registry for a kind override at the resolved URL.
    pub(crate) fn child(&self, site: &Site, key: &str) -> Result<Container, LookupError> {
        let path = self.path.join(key);
        if path.is_file() {
            return Err(LookupError::NotADirectory(path));
        }
        let url = join_url(&self.url, key);
        let kind = site.registry().kind_for(&url).unwrap_or(self.kind);
        Ok(Container {
            path,
            name: Some(key.to_string()),
            url,
            kind,
            parent_kind: Some(self.kind),
        })
    }

    /// Lazily walk every descendant of this container, level by level: all
    /// children of a directory are yielded before any grandchild.
    ///
    /// Each directory entry goes through [`Container::lookup`], so the walk
    /// sees exactly what traversal would see: hidden and backup names are
    /// skipped, blog entries surface together with their generated pages,
    /// and sub-containers are yielded before their own descendants. NotFound
    /// from an individual entry is swallowed; any other failure ends the
    /// walk with an error. Every call reflects the filesystem at walk time.
    pub fn walk<'s>(&self, site: &'s Site) -> Walk<'s> {
        Walk {
            site,
            queue: VecDeque::new(),
            pending: VecDeque::from([self.clone()]),
        }
    }
}

/// Iterator produced by [`Container::walk`].
pub struct Walk<'s> {
    site: &'s Site,
    queue: VecDeque<Resource>,
    pending: VecDeque<Container>,
}

impl Walk<'_> {
    fn expand(&mut self, dir: &Container) -> Result<(), LookupError> {
        let mut names: Vec<String> = fs::read_dir(&dir.path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();

        for name in names {
            match dir.lookup(self.site, &name) {
                Ok(Resource::Container(child)) => {
                    self.pending.push_back(child.clone());
                    self.queue.push_back(Resource::Container(child));
                }
                Ok(Resource::Entry(entry)) => {
                    // generated pages are discovered eagerly, so iteration is
                    // complete without any prior lookup of the source entry;
                    // a literal file of the same name shadows the page, and so
                    // does the index marker at a blog subtree root
                    let page = entry.page.clone();
                    self.queue.push_back(Resource::Entry(entry));
                    let shadowed = dir.path.join(&page.name).is_file()
                        || (page.name == self.site.settings().index_name
                            && dir.is_subtree_root());
                    if !shadowed {
                        self.queue.push_back(Resource::Page(page));
                    }
                }
                Ok(resource) => self.queue.push_back(resource),
                Err(LookupError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<Resource, LookupError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(resource) = self.queue.pop_front() {
                return Some(Ok(resource));
            }
            let dir = self.pending.pop_front()?;
            if let Err(err) = self.expand(&dir) {
                return Some(Err(err));
            }
        }
    }
}
