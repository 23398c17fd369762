//! Where the globe's input files come from.
//!
//! Locations in the configuration are relative paths such as
//! `data/wetbulb_2030.csv`. A [`DataSource`] resolves them against its base,
//! either a URL ([`HttpSource`]) or a local directory ([`FileSource`]), and
//! returns the body as text.
//!
//! ```no_run
//! # use wetbulb_globe::source::{DataSource, HttpSource};
//! let src = HttpSource::new("https://example.org/wetbulb/");
//! let csv = src.fetch_text("data/wetbulb_2030.csv")?;
//! # Ok::<(), wetbulb_globe::source::SourceError>(())
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid location {0:?}")]
    InvalidLocation(String),
}

/// Fetches the text body of a named resource.
pub trait DataSource: Send + Sync {
    fn fetch_text(&self, location: &str) -> Result<String, SourceError>;

    /// Human-readable base, for logs.
    fn describe(&self) -> String;
}

/// Reads files below a base directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &str) -> Result<PathBuf, SourceError> {
        let rel = Path::new(location);
        if rel.is_absolute() {
            return Ok(rel.to_path_buf());
        }
        if rel
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(SourceError::InvalidLocation(location.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl DataSource for FileSource {
    fn fetch_text(&self, location: &str) -> Result<String, SourceError> {
        let path = self.resolve(location)?;
        std::fs::read_to_string(&path).map_err(|source| SourceError::Io { path, source })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// Allow -, _, . unescaped in path segments (file names like wetbulb_2030.csv)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_path(location: &str) -> String {
    location
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_encoding::utf8_percent_encode(s, SAFE).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Synchronous HTTP source with a small retry for transient failures.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub base_url: String,
    http: HttpClient,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("wetbulb_globe/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn url_for(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            return location.to_string();
        }
        format!("{}/{}", self.base_url.trim_end_matches('/'), enc_path(location))
    }
}

impl DataSource for HttpSource {
    fn fetch_text(&self, location: &str) -> Result<String, SourceError> {
        let url = self.url_for(location);
        let mut last_err = String::from("no attempt made");
        for backoff_ms in [100u64, 300, 700] {
            match self.http.get(&url).send() {
                Ok(r) if r.status().is_success() => {
                    return r.text().map_err(|e| SourceError::Network {
                        url: url.clone(),
                        message: e.to_string(),
                    });
                }
                Ok(r) if r.status().is_server_error() => {
                    last_err = format!("HTTP {}", r.status());
                }
                Ok(r) => {
                    return Err(SourceError::Status {
                        url,
                        status: r.status().as_u16(),
                    });
                }
                Err(e) => last_err = e.to_string(),
            }
            log::debug!("retrying {url} in {backoff_ms} ms ({last_err})");
            std::thread::sleep(Duration::from_millis(backoff_ms));
        }
        Err(SourceError::Network {
            url,
            message: last_err,
        })
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_encodes_segments() {
        let src = HttpSource::new("https://example.org/globe/");
        assert_eq!(
            src.url_for("data/wetbulb_2030.csv"),
            "https://example.org/globe/data/wetbulb_2030.csv"
        );
        assert_eq!(
            src.url_for("data/world map.json"),
            "https://example.org/globe/data/world%20map.json"
        );
        assert_eq!(src.url_for("https://cdn.test/x.csv"), "https://cdn.test/x.csv");
    }

    #[test]
    fn file_source_rejects_parent_dirs() {
        let src = FileSource::new("/tmp");
        assert!(matches!(
            src.fetch_text("../etc/passwd"),
            Err(SourceError::InvalidLocation(_))
        ));
    }
}
