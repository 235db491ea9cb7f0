//! Image fetching
//!
//! The builder resolves every `<img src>` through an [`ImageFetcher`]. [`HttpFetcher`]
//! understands `http(s)://` URLs, `data:` URLs, `file://` URLs and plain paths, the
//! latter resolved against an optional base directory (usually the input's folder).
//! Every fetch is bounded by the caller's timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use log::debug;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::FetchError;

/// Default bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5000);

#[async_trait(?Send)]
pub trait ImageFetcher {
    /// The raw bytes behind `url`. Non-success responses are errors.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_dir: Option<PathBuf>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative paths are resolved against `base_dir`.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

enum Source {
    Data(String),
    Http(String),
    File(PathBuf),
}

fn classify(url: &str, fetcher: &HttpFetcher) -> Source {
    if let Some(data) = url.strip_prefix("data:") {
        return Source::Data(data.to_string());
    }
    if let Ok(parsed) = Url::parse(url) {
        match parsed.scheme() {
            "http" | "https" => return Source::Http(url.to_string()),
            "file" => {
                if let Ok(path) = parsed.to_file_path() {
                    return Source::File(path);
                }
            }
            _ => {}
        }
    }
    let decoded = percent_decode_str(url).decode_utf8_lossy();
    Source::File(fetcher.resolve_path(&decoded))
}

#[async_trait(?Send)]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let work = async {
            match classify(url, self) {
                Source::Data(data) => decode_data_url(&data),
                Source::Http(url) => self.fetch_http(&url).await,
                Source::File(path) => {
                    debug!("Reading image {}", path.display());
                    Ok(tokio::fs::read(&path).await?)
                }
            }
        };
        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| FetchError::Timeout(timeout.as_millis() as u64))?
    }
}

/// Decodes the part of a `data:` URL after the scheme.
pub fn decode_data_url(data: &str) -> Result<Vec<u8>, FetchError> {
    let (meta, payload) = data.split_once(',').ok_or(FetchError::InvalidDataUrl)?;
    if meta.ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|_| FetchError::InvalidDataUrl)
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}
