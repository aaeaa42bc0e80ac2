//! Blog specialization: markdown entries, generated pages, synthetic index.
//!
//! A blog container serves a directory where markdown files are authored
//! entries. Each entry owns exactly one generated page — the HTML view of the
//! entry — whose name is the entry's base name with `.html` substituted. The
//! pairing is permanent and 1:1; the page has no file of its own on disk.
//!
//! Front matter is a YAML block at the top of the markdown source:
//!
//! ```text
//! ---
//! title: Hello
//! published_date: 2024-01-15
//! author: someone
//! teaser: a short excerpt for index listings
//! template: fancy_entry.html
//! ---
//! body in markdown
//! ```
//!
//! All keys are optional. The title falls back to the base name, the date to
//! the file's creation time, and the template to the site-wide setting at
//! render time.
//!
//! Lookup on a blog container is an ordered list of strategies (see
//! [`lookup`]); ordinary files and subdirectories coexist with entries in the
//! same directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gray_matter::{Matter, engine::YAML};
use pulldown_cmark::{Parser, html as md_html};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::resource::{Container, Leaf, LookupError, Resource, join_url};
use crate::site::Site;

/// Markup extension allow-list for entry sources.
pub const MARKUP_EXTENSIONS: &[&str] = &["md"];
/// Extension of generated pages.
pub const PAGE_EXTENSION: &str = "html";

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("not a markdown file: {0}")]
    Extension(PathBuf),
    #[error("could not parse front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Front matter block as authored. Sparse; semantic defaults are applied in
/// [`BlogEntry::parse`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    published_date: Option<String>,
    author: Option<String>,
    teaser: Option<String>,
    template: Option<String>,
}

/// Semantic fields shared by an entry and its generated page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryMeta {
    pub title: String,
    pub published_date: DateTime<Utc>,
    /// HTML fragment rendered from the markdown body.
    pub body: String,
    pub author: Option<String>,
    pub teaser: Option<String>,
    /// Per-entry template override from front matter.
    pub template: Option<String>,
}

/// A blog entry parsed from a markdown source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogEntry {
    pub path: PathBuf,
    pub name: String,
    pub url: String,
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// The paired generated page, created at construction.
    #[serde(skip_serializing)]
    pub page: BlogPage,
}

/// The renderable HTML view of a blog entry. Derived 1:1 from its source
/// entry; no independent file exists behind `path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPage {
    pub path: PathBuf,
    pub name: String,
    pub url: String,
    /// Directory holding the source entry, searched for a `blog_entry.html`
    /// template override at render time.
    pub dir_path: PathBuf,
    pub dir_url: String,
    #[serde(flatten)]
    pub meta: EntryMeta,
}

/// Stateless marker: "render the index listing". Produced only when the
/// index segment is looked up on a blog subtree root; `path` need not exist.
#[derive(Debug, Clone)]
pub struct BlogIndex {
    pub path: PathBuf,
    pub name: String,
    pub url: String,
    /// The container whose descendants the listing covers.
    pub container: Container,
}

fn has_markup_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            MARKUP_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

fn has_page_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(PAGE_EXTENSION))
        .unwrap_or(false)
}

/// Parse a front matter date. Accepted formats, in order: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(date.and_utc());
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    None
}

/// File creation time, falling back to mtime on filesystems without
/// birth-time support.
fn file_created(path: &Path) -> Result<DateTime<Utc>, std::io::Error> {
    let metadata = fs::metadata(path)?;
    let time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(DateTime::<Utc>::from(time))
}

impl BlogEntry {
    /// Parse a markdown source into an entry and its paired page.
    ///
    /// Fails on a disallowed extension, an unreadable file, or malformed
    /// front matter — an entry is never returned partially parsed.
    pub fn parse(path: PathBuf, name: &str, parent_url: &str) -> Result<Self, EntryError> {
        if !has_markup_extension(name) {
            return Err(EntryError::Extension(path));
        }
        let raw = fs::read_to_string(&path)?;

        let matter = Matter::<YAML>::new();
        let parsed = matter
            .parse::<FrontMatter>(&raw)
            .map_err(|err| EntryError::FrontMatter {
                path: path.clone(),
                message: err.to_string(),
            })?;
        let front = parsed.data.unwrap_or_default();

        let mut body = String::new();
        md_html::push_html(&mut body, Parser::new(&parsed.content));

        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string());

        let title = front
            .title
            .unwrap_or_else(|| stem.replace('-', " "));
        let published_date = match front.published_date.as_deref().and_then(parse_date) {
            Some(date) => date,
            None => file_created(&path)?,
        };

        let meta = EntryMeta {
            title,
            published_date,
            body,
            author: front.author,
            teaser: front.teaser,
            template: front.template,
        };

        let url = join_url(parent_url, name);
        let page_name = format!("{stem}.{PAGE_EXTENSION}");
        let dir_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let page = BlogPage {
            path: dir_path.join(&page_name),
            url: join_url(parent_url, &page_name),
            name: page_name,
            dir_path,
            dir_url: parent_url.to_string(),
            meta: meta.clone(),
        };

        Ok(Self {
            path,
            name: name.to_string(),
            url,
            meta,
            page,
        })
    }
}

impl BlogIndex {
    fn new(dir: &Container, name: &str) -> Self {
        Self {
            path: dir.path.join(name),
            url: join_url(&dir.url, name),
            name: name.to_string(),
            container: dir.clone(),
        }
    }

    /// All entries reachable under the index's container, sorted by
    /// published date descending. The sort is stable, so entries with equal
    /// dates keep their walk order.
    pub fn entries(&self, site: &Site) -> Result<Vec<BlogEntry>, LookupError> {
        let mut entries = Vec::new();
        for resource in self.container.walk(site) {
            if let Resource::Entry(entry) = resource? {
                entries.push(*entry);
            }
        }
        entries.sort_by(|a, b| b.meta.published_date.cmp(&a.meta.published_date));
        Ok(entries)
    }
}

/// Resolve a segment on a blog container.
///
/// Strategies, in order; the first whose precondition holds decides:
///
/// 1. index segment at the blog subtree root → synthetic [`BlogIndex`];
/// 2. regular file with a markup extension → [`BlogEntry`] (a source that
///    fails to parse is served as a plain file instead);
/// 3. any other regular file → plain [`Leaf`];
/// 4. directory → child container;
/// 5. no file, but the key has the page extension and a markdown source with
///    the same base name exists → the entry's generated page, provided the
///    page's own name matches the requested key exactly;
/// 6. otherwise NotFound.
pub(crate) fn lookup(site: &Site, dir: &Container, key: &str) -> Result<Resource, LookupError> {
    if key == site.settings().index_name && dir.is_subtree_root() {
        return Ok(Resource::Index(BlogIndex::new(dir, key)));
    }

    let path = dir.path.join(key);
    if path.is_file() {
        if has_markup_extension(key) {
            match BlogEntry::parse(path.clone(), key, &dir.url) {
                Ok(entry) => return Ok(Resource::Entry(Box::new(entry))),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "serving unparseable blog source as a plain file"
                    );
                }
            }
        }
        return Ok(Resource::Leaf(Leaf::new(path, key.to_string(), &dir.url)?));
    }
    if path.is_dir() {
        return Ok(Resource::Container(dir.child(site, key)?));
    }

    if has_page_extension(key) {
        if let Some(stem) = Path::new(key).file_stem() {
            let stem = stem.to_string_lossy();
            for ext in MARKUP_EXTENSIONS {
                let source_name = format!("{stem}.{ext}");
                if dir.path.join(&source_name).is_file() {
                    let entry =
                        BlogEntry::parse(dir.path.join(&source_name), &source_name, &dir.url)?;
                    // guard against base-name collisions handing out a page
                    // whose name differs from the requested key
                    if entry.page.name == key {
                        return Ok(Resource::Page(entry.page));
                    }
                }
            }
        }
    }

    Err(LookupError::NotFound(join_url(&dir.url, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn entry_extracts_front_matter() {
        let (_tmp, site) = blog_site();
        let root = site.root().unwrap();

        let entry = match root.lookup(&site, "hello.md").unwrap() {
            Resource::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        };
        assert_eq!(entry.meta.title, "Hello");
        assert_eq!(entry.meta.author.as_deref(), Some("ada"));
        assert_eq!(entry.meta.teaser.as_deref(), Some("the first post"));
        assert!(entry.meta.body.contains("<p>"));
        assert!(entry.meta.body.contains("is a blog"));
    }

    #[test]
    fn title_defaults_to_base_name() {
        let (tmp, site) = blog_site();
        std::fs::write(tmp.path().join("some-notes.md"), "no front matter here").unwrap();

        let root = site.root().unwrap();
        let entry = match root.lookup(&site, "some-notes.md").unwrap() {
            Resource::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        };
        assert_eq!(entry.meta.title, "some notes");
    }

    #[test]
    fn date_defaults_to_file_time() {
        let (tmp, site) = blog_site();
        std::fs::write(tmp.path().join("undated.md"), "---\ntitle: U\n---\nbody").unwrap();

        let root = site.root().unwrap();
        let entry = match root.lookup(&site, "undated.md").unwrap() {
            Resource::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        };
        assert!(entry.meta.published_date <= Utc::now());
    }

    #[test]
    fn unparseable_date_falls_back_to_file_time() {
        let (tmp, site) = blog_site();
        std::fs::write(
            tmp.path().join("badly-dated.md"),
            "---\npublished_date: next tuesday\n---\nbody",
        )
        .unwrap();

        let root = site.root().unwrap();
        let entry = match root.lookup(&site, "badly-dated.md").unwrap() {
            Resource::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        };
        assert!(entry.meta.published_date <= Utc::now());
    }

    #[test]
    fn page_name_substitutes_generated_extension() {
        let (_tmp, site) = blog_site();
        let root = site.root().unwrap();

        let entry = match root.lookup(&site, "hello.md").unwrap() {
            Resource::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        };
        assert_eq!(entry.page.name, "hello.html");
        assert_eq!(entry.page.url, "/hello.html");
        assert_eq!(entry.page.meta, entry.meta);
    }

    #[test]
    fn generated_page_round_trips_through_lookup() {
        let (_tmp, site) = blog_site();
        let root = site.root().unwrap();

        let entry = match root.lookup(&site, "hello.md").unwrap() {
            Resource::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        };
        let page = match root.lookup(&site, "hello.html").unwrap() {
            Resource::Page(page) => page,
            other => panic!("expected page, got {other:?}"),
        };
        assert_eq!(page, entry.page);
    }

    #[test]
    fn literal_file_shadows_generated_page() {
        let (tmp, site) = blog_site();
        std::fs::write(tmp.path().join("hello.html"), "<p>handwritten</p>").unwrap();

        let root = site.root().unwrap();
        let resource = root.lookup(&site, "hello.html").unwrap();
        assert!(matches!(resource, Resource::Leaf(_)));
    }

    #[test]
    fn page_without_markdown_source_is_not_found() {
        let (_tmp, site) = blog_site();
        let root = site.root().unwrap();
        assert!(matches!(
            root.lookup(&site, "missing.html"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn ordinary_files_coexist_with_entries() {
        let (tmp, site) = blog_site();
        std::fs::write(tmp.path().join("style.css"), "body {}").unwrap();

        let root = site.root().unwrap();
        let resource = root.lookup(&site, "style.css").unwrap();
        assert!(matches!(resource, Resource::Leaf(_)));
    }

    #[test]
    fn unparseable_source_served_as_plain_file() {
        let (tmp, site) = blog_site();
        std::fs::write(
            tmp.path().join("broken.md"),
            "---\ntitle: [unclosed\n---\nbody",
        )
        .unwrap();

        let root = site.root().unwrap();
        let resource = root.lookup(&site, "broken.md").unwrap();
        assert!(matches!(resource, Resource::Leaf(_)));
    }

    #[test]
    fn index_marker_only_at_subtree_root() {
        let (tmp, site) = blog_site();
        let root = site.root().unwrap();
        assert!(matches!(
            root.lookup(&site, "index.html").unwrap(),
            Resource::Index(_)
        ));

        // a nested blog directory answers NotFound for the index segment
        std::fs::create_dir(tmp.path().join("archive")).unwrap();
        std::fs::write(tmp.path().join("archive/old.md"), "# old").unwrap();
        let archive = root.lookup(&site, "archive").unwrap();
        assert!(matches!(
            archive.lookup(&site, "index.html"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn walk_discovers_generated_pages_eagerly() {
        let (_tmp, site) = blog_site();
        let root = site.root().unwrap();

        // no lookups have happened on this fresh container: completeness
        // must not depend on them
        let urls: Vec<String> = root
            .walk(&site)
            .map(|r| r.unwrap().url().to_string())
            .collect();
        assert!(urls.contains(&"/hello.md".to_string()));
        assert!(urls.contains(&"/hello.html".to_string()));
        assert!(urls.contains(&"/second.html".to_string()));
    }

    #[test]
    fn index_marker_shadows_a_generated_index_page() {
        let (tmp, site) = blog_site();
        // an entry whose generated page would collide with the index URL,
        // in a blog root without a literal listing file
        std::fs::remove_file(tmp.path().join("index.html")).unwrap();
        write_entry(tmp.path(), "index.md", "Indexish", "2023-03-01");

        let root = site.root().unwrap();
        // lookup answers the marker, never the entry's generated page
        assert!(matches!(
            root.lookup(&site, "index.html").unwrap(),
            Resource::Index(_)
        ));

        // the walk agrees: the page does not surface at the index URL
        let urls: Vec<String> = root
            .walk(&site)
            .map(|r| r.unwrap().url().to_string())
            .collect();
        assert!(!urls.contains(&"/index.html".to_string()));
        // the source entry itself stays reachable
        assert!(urls.contains(&"/index.md".to_string()));
    }

    #[test]
    fn index_entries_sorted_by_date_descending() {
        let (tmp, site) = blog_site();
        write_entry(tmp.path(), "older.md", "Older", "2020-05-01");
        write_entry(tmp.path(), "newest.md", "Newest", "2024-03-01");

        let root = site.root().unwrap();
        let index = match root.lookup(&site, "index.html").unwrap() {
            Resource::Index(index) => index,
            other => panic!("expected index, got {other:?}"),
        };
        let titles: Vec<String> = index
            .entries(&site)
            .unwrap()
            .into_iter()
            .map(|e| e.meta.title)
            .collect();
        // fixture posts are dated 2023-01-15 (Hello) and 2023-01-10 (Second)
        assert_eq!(titles, vec!["Newest", "Hello", "Second", "Older"]);
    }

    #[test]
    fn equal_dates_keep_walk_order() {
        let (tmp, site) = blog_site();
        write_entry(tmp.path(), "a-tied.md", "A", "2030-01-01");
        write_entry(tmp.path(), "b-tied.md", "B", "2030-01-01");

        let root = site.root().unwrap();
        let index = match root.lookup(&site, "index.html").unwrap() {
            Resource::Index(index) => index,
            other => panic!("expected index, got {other:?}"),
        };
        let titles: Vec<String> = index
            .entries(&site)
            .unwrap()
            .into_iter()
            .take(2)
            .map(|e| e.meta.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn date_formats_accepted() {
        assert!(parse_date("2024-01-15").is_some());
        assert!(parse_date("2024-01-15 10:30:00").is_some());
        assert!(parse_date("2024-01-15T10:30:00+02:00").is_some());
        assert!(parse_date("January 15th").is_none());
    }

    #[test]
    fn disallowed_extension_is_rejected() {
        let (tmp, _site) = blog_site();
        let path = tmp.path().join("hello.md");
        let result = BlogEntry::parse(path.clone(), "hello.txt", "");
        assert!(matches!(result, Err(EntryError::Extension(_))));
        // while the real source parses fine
        assert!(BlogEntry::parse(path, "hello.md", "").is_ok());
    }
}
