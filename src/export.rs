//! Site export: crawl every resolvable path and mirror it to disk.
//!
//! The exporter is a client of [`Site::get`], nothing more. It requests the
//! `/list` view for the full inventory of resolvable URLs, then requests each
//! URL and writes the response body at the same relative path under the
//! destination — so an exported tree is byte-identical to what the resolved
//! resources render. The destination must not exist yet; exports never merge
//! into or overwrite a previous output.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::site::{Site, SiteError};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),
    #[error("request for {url} failed with status {status}")]
    Request { url: String, status: u16 },
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One written file, for CLI reporting.
#[derive(Debug)]
pub struct Exported {
    pub url: String,
    pub destination: PathBuf,
}

/// Export the whole site under `destination`.
pub fn export(site: &Site, destination: &Path) -> Result<Vec<Exported>, ExportError> {
    if destination.exists() {
        return Err(ExportError::DestinationExists(destination.to_path_buf()));
    }
    fs::create_dir_all(destination)?;

    let listing = site.get("/list")?;
    if listing.status != 200 {
        return Err(ExportError::Request {
            url: "/list".to_string(),
            status: listing.status,
        });
    }

    let body = String::from_utf8_lossy(&listing.body).into_owned();
    let mut written = Vec::new();
    for url in body.lines().filter(|line| !line.is_empty()) {
        let response = site.get(url)?;
        if response.status != 200 {
            return Err(ExportError::Request {
                url: url.to_string(),
                status: response.status,
            });
        }

        let target = destination.join(url.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(url, target = %target.display(), "writing exported file");
        fs::write(&target, &response.body)?;
        written.push(Exported {
            url: url.to_string(),
            destination: target,
        });
    }
    Ok(written)
}
