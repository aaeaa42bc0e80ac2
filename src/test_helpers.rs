//! Shared fixtures for the dirsite test suite.
//!
//! Fixture trees are built programmatically in a [`TempDir`], so every test
//! gets an isolated site it can mutate freely. The two stock layouts mirror
//! the shapes the crate cares about:
//!
//! ```text
//! plain_site()              blog_site()
//! ├── index.html            ├── index.html        (listing template)
//! ├── menu.html             ├── blog_entry.html   (entry template)
//! └── images/               ├── hello.md          (2023-01-15, teaser)
//!     └── header.gif        └── second.md         (2023-01-10)
//! ```

use std::path::Path;

use tempfile::TempDir;

use crate::config::{Handler, Settings};
use crate::site::Site;

pub fn settings_at(content: &Path) -> Settings {
    Settings {
        content: content.to_path_buf(),
        ..Settings::default()
    }
}

pub fn site_at(content: &Path) -> Site {
    Site::new(settings_at(content)).unwrap()
}

/// A plain site: two html files and an image in a subdirectory.
pub fn plain_site() -> (TempDir, Site) {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("index.html"),
        "<h1>welcome to {{ url | safe }}</h1>",
    )
    .unwrap();
    std::fs::write(tmp.path().join("menu.html"), "<ul><li>high tea</li></ul>").unwrap();
    std::fs::create_dir(tmp.path().join("images")).unwrap();
    std::fs::write(tmp.path().join("images/header.gif"), b"GIF89a\x10\x00\x10\x00").unwrap();

    let site = site_at(tmp.path());
    (tmp, site)
}

/// A blog tree plus the settings to serve it, for tests that tweak settings
/// before constructing the [`Site`].
pub fn blog_fixture_tree() -> (TempDir, Settings) {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("hello.md"),
        "---\n\
         title: Hello\n\
         published_date: 2023-01-15\n\
         author: ada\n\
         teaser: the first post\n\
         ---\n\
         this *is a blog* entry\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("second.md"),
        "---\n\
         title: Second\n\
         published_date: 2023-01-10\n\
         ---\n\
         the second post\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("blog_entry.html"),
        "<h1>{{ title }}</h1><div>{{ body | safe }}</div>",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("index.html"),
        "{% for e in entries %}\
         <article><h2>{{ e.title }}</h2>\
         {% if e.teaser %}<p>{{ e.teaser }}</p>{% endif %}</article>\
         {% endfor %}",
    )
    .unwrap();

    let mut settings = settings_at(tmp.path());
    settings.root = Handler::Blog;
    (tmp, settings)
}

/// A blog site rooted at the content directory.
pub fn blog_site() -> (TempDir, Site) {
    let (tmp, settings) = blog_fixture_tree();
    let site = Site::new(settings).unwrap();
    (tmp, site)
}

/// A plain root with a `/blog` subdirectory registered as a blog container.
pub fn site_with_blog_subdir() -> (TempDir, Site) {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::create_dir(tmp.path().join("images")).unwrap();
    std::fs::write(tmp.path().join("images/header.gif"), b"GIF89a\x10\x00\x10\x00").unwrap();
    std::fs::create_dir(tmp.path().join("blog")).unwrap();
    std::fs::write(
        tmp.path().join("blog/post.md"),
        "---\ntitle: Post\npublished_date: 2023-02-01\n---\na post\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("blog/blog_entry.html"),
        "<h1>{{ title }}</h1><div>{{ body | safe }}</div>",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("blog/index.html"),
        "{% for e in entries %}<h2>{{ e.title }}</h2>{% endfor %}",
    )
    .unwrap();

    let mut settings = settings_at(tmp.path());
    settings
        .handlers
        .insert("/blog".to_string(), Handler::Blog);
    let site = Site::new(settings).unwrap();
    (tmp, site)
}

/// Write a minimal dated entry into `dir`.
pub fn write_entry(dir: &Path, name: &str, title: &str, date: &str) {
    std::fs::write(
        dir.join(name),
        format!("---\ntitle: {title}\npublished_date: {date}\n---\nbody of {title}\n"),
    )
    .unwrap();
}
