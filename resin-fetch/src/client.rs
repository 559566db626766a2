use std::future::Future;
use std::path::{Path, PathBuf};

use resin_core::{AssetFetcher, Digest, RemoteAsset};
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

const FALLBACK_NAME: &str = "asset";

/// Downloads assets over HTTP into a local cache directory.
pub struct HttpAssetFetcher {
    http: reqwest::Client,
    cache_dir: PathBuf,
}

impl HttpAssetFetcher {
    /// Creates a fetcher storing downloads under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Creates a fetcher with a preconfigured HTTP client.
    pub fn with_client(http: reqwest::Client, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Downloads `url` and persists it in the cache directory.
    #[instrument(skip(self))]
    pub async fn download(&self, url: &str) -> Result<RemoteAsset, FetchError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!(len = bytes.len(), "downloaded asset");

        let (name, ext) = name_and_ext(url);
        persist(&self.cache_dir, name, ext, &bytes).await
    }
}

impl AssetFetcher for HttpAssetFetcher {
    type Error = FetchError;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<RemoteAsset, Self::Error>> + Send {
        self.download(url)
    }
}

/// Splits the last path segment of a URL into a name and a dotted extension.
///
/// `https://h/storage/cat.photo.jpg?w=2` gives `("cat.photo", ".jpg")`.
/// URLs without a usable file name fall back to `asset`.
pub fn name_and_ext(url: &str) -> (String, String) {
    let file = Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_else(|| {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().unwrap_or_default().to_string()
        });

    if let Some((name, ext)) = file.rsplit_once('.') {
        if !name.is_empty() && !ext.is_empty() {
            return (name.to_string(), format!(".{ext}"));
        }
    }
    if file.is_empty() {
        return (FALLBACK_NAME.to_string(), String::new());
    }
    (file, String::new())
}

/// Content-hashes `bytes` and writes them to `cache_dir/name-digest.ext`.
///
/// An existing file with that name already holds the same bytes and is kept.
pub async fn persist(
    cache_dir: &Path,
    name: String,
    ext: String,
    bytes: &[u8],
) -> Result<RemoteAsset, FetchError> {
    let asset = RemoteAsset {
        content_digest: Digest::from_data(bytes).to_string(),
        ext,
        name,
    };

    tokio::fs::create_dir_all(cache_dir).await?;
    let path = cache_dir.join(asset.file_name());
    if !tokio::fs::try_exists(&path).await? {
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "cached asset");
    }
    Ok(asset)
}
