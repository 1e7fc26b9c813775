// src/fetch/mod.rs

use encoding_rs::Encoding;
use reqwest::blocking::Client;
use std::{fs, path::Path};
use tracing::debug;
use url::Url;

use crate::error::{ValidationError, ValidationResult};

/// Where a dataset lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// An HTTP(S) URL, probed with HEAD before download.
    Remote,
    /// A path on the local filesystem.
    Local,
}

impl SourceKind {
    /// `http://` and `https://` locations are remote, anything else is a path.
    pub fn infer(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote
        } else {
            Self::Local
        }
    }
}

/// A named tabular source plus the text encoding it is published in.
/// `encoding: None` means UTF-8.
#[derive(Debug, Clone)]
pub struct DataSource {
    pub name: String,
    pub kind: SourceKind,
    pub location: String,
    pub encoding: Option<&'static Encoding>,
}

impl DataSource {
    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, SourceKind::Remote, url)
    }

    pub fn local(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::new(
            name,
            SourceKind::Local,
            path.as_ref().to_string_lossy().into_owned(),
        )
    }

    /// Pick the kind from the shape of `location`.
    pub fn from_location(name: impl Into<String>, location: impl Into<String>) -> Self {
        let location = location.into();
        Self::new(name, SourceKind::infer(&location), location)
    }

    fn new(name: impl Into<String>, kind: SourceKind, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            location: location.into(),
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Last component of the location, with any URL query or fragment removed.
    pub fn file_name(&self) -> Option<String> {
        match self.kind {
            SourceKind::Remote => {
                let url = Url::parse(&self.location).ok()?;
                url.path_segments()?
                    .filter(|s| !s.is_empty())
                    .last()
                    .map(str::to_string)
            }
            SourceKind::Local => Path::new(&self.location)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        }
    }
}

/// Confirm the source exists: HEAD must return a success status for remote
/// sources, and the path must exist for local ones.
pub fn probe(client: &Client, source: &DataSource) -> ValidationResult<()> {
    let not_found = || ValidationError::NotFound {
        location: source.location.clone(),
    };

    match source.kind {
        SourceKind::Remote => {
            let url = Url::parse(&source.location).map_err(|_| not_found())?;
            let resp = client
                .head(url)
                .send()
                .map_err(|e| ValidationError::Fetch {
                    location: source.location.clone(),
                    source: e,
                })?;
            debug!(status = %resp.status(), location = %source.location, "probed");
            if !resp.status().is_success() {
                return Err(not_found());
            }
        }
        SourceKind::Local => {
            if !Path::new(&source.location).exists() {
                return Err(not_found());
            }
        }
    }
    Ok(())
}

/// Fetch the whole body of the source into memory.
pub fn read_bytes(client: &Client, source: &DataSource) -> ValidationResult<Vec<u8>> {
    match source.kind {
        SourceKind::Remote => {
            let fetch_err = |e: reqwest::Error| ValidationError::Fetch {
                location: source.location.clone(),
                source: e,
            };
            let bytes = client
                .get(&source.location)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.bytes())
                .map_err(fetch_err)?;
            debug!(bytes = bytes.len(), location = %source.location, "downloaded");
            Ok(bytes.to_vec())
        }
        SourceKind::Local => {
            fs::read(&source.location).map_err(|e| ValidationError::io(&source.location, e))
        }
    }
}
