//! # dirsite
//!
//! A micro static site generator that treats a directory tree as a navigable
//! resource hierarchy. A request path is resolved by walking the tree
//! segment-by-segment; the final resolved resource decides how it renders.
//! Blog directories are interleaved transparently: markdown entries generate
//! paired HTML pages that never exist on disk.
//!
//! # Architecture: Traversal, Then Rendering
//!
//! Every operation goes through the same two steps:
//!
//! ```text
//! 1. Resolve   /blog/post.html  →  typed resource         (segment lookup)
//! 2. Respond   resource         →  body + content type    (template or raw file)
//! ```
//!
//! The filesystem is the only source of truth. Nothing is indexed or cached
//! between requests: each resolution walk re-checks the disk, so editing a
//! file is immediately visible. Exporting a site is just issuing one request
//! per resolvable path and mirroring the bodies to disk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resource`] | Core resource model — leaves, containers, segment lookup, recursive walk |
//! | [`blog`] | Blog specialization — markdown entries, generated pages, index marker |
//! | [`render`] | Template selection and rendering (Tera), content-type resolution |
//! | [`site`] | Site handle (settings + handler registry + template env), path dispatch |
//! | [`export`] | Crawls the resolved site and mirrors it to an output directory |
//! | [`config`] | `Settings` loaded from a sparse TOML file |
//!
//! # Design Decisions
//!
//! ## Generated Pages Are Discovered Eagerly
//!
//! A blog entry `post.md` owns exactly one generated page `post.html`. Both
//! are yielded whenever a blog container is walked, so listings and exports
//! are complete without any particular lookup having happened first. There is
//! no accumulating page cache and therefore no shared mutable state between
//! walks.
//!
//! ## Explicit Strategy Chains, Not Caught Errors
//!
//! Blog lookup tries an ordered list of interpretations for a segment
//! (synthetic index, markdown entry, plain file, subdirectory, generated
//! page). Each strategy inspects the filesystem and returns a plain result;
//! fallback is the next strategy in the list, never a caught failure.
//!
//! ## Tera Over Compile-Time Templates
//!
//! Templates are user-supplied files living inside the content tree — the
//! template for a resource is, by default, the file at the resource's own
//! URL. That rules out compile-time HTML macros; the Tera environment is
//! built once at startup from a glob over the content directory.

pub mod blog;
pub mod config;
pub mod export;
pub mod render;
pub mod resource;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
