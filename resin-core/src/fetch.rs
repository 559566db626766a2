use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// A remote asset after it has been downloaded, content-hashed and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    pub content_digest: String,
    /// File extension including its leading dot, or empty.
    pub ext: String,
    pub name: String,
}

impl RemoteAsset {
    /// File name the asset is cached under: `name-digest.ext`.
    pub fn file_name(&self) -> String {
        format!("{}-{}{}", self.name, self.content_digest, self.ext)
    }

    /// Public URL of the cached copy under the given static prefix.
    pub fn static_path(&self, static_prefix: &str) -> String {
        format!("{static_prefix}{}", self.file_name())
    }
}

/// Downloads a remote asset into the local cache.
///
/// Implementations own the network and storage side; the pipeline only
/// consumes the resulting [`RemoteAsset`] metadata.
pub trait AssetFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<RemoteAsset, Self::Error>> + Send;
}

/// Memoizes another fetcher per URL for the lifetime of a build.
///
/// Concurrent requests for the same URL share a single in-flight fetch.
/// Failed fetches are not remembered and will be retried on the next request.
pub struct FetchCache<F> {
    inner: F,
    cells: Mutex<HashMap<String, Arc<OnceCell<RemoteAsset>>>>,
}

impl<F: AssetFetcher> FetchCache<F> {
    pub fn new(inner: F) -> Self {
        FetchCache {
            inner,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct URLs successfully fetched so far.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<RemoteAsset>>>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cell(&self, url: &str) -> Arc<OnceCell<RemoteAsset>> {
        Arc::clone(self.lock().entry(url.to_string()).or_default())
    }

    async fn fetch_once(&self, url: &str) -> Result<RemoteAsset, F::Error> {
        let cell = self.cell(url);
        cell.get_or_try_init(|| self.inner.fetch(url))
            .await
            .cloned()
    }
}

impl<F: AssetFetcher> AssetFetcher for FetchCache<F> {
    type Error = F::Error;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<RemoteAsset, Self::Error>> + Send {
        self.fetch_once(url)
    }
}
