//! Images embedded in rich text through `src="..."` attributes.

use std::collections::HashSet;
use std::sync::LazyLock;

use futures::future::join_all;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::{debug, warn};
use url::Url;

use crate::fetch::{AssetFetcher, RemoteAsset};

static SRC_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)src\s*=\s*"(.+?)""#).expect("Invalid regex pattern for src attributes")
});

/// Inline images of one or more rich-text values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineAssets {
    /// Fetched assets, distinct by content digest, in first-seen order.
    pub images: Vec<RemoteAsset>,
    /// Source as written in the rich text → fetched asset.
    pub url_to_asset: IndexMap<String, RemoteAsset>,
    /// Distinct sources in document order, fetched or not.
    pub sources: Vec<String>,
}

impl InlineAssets {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Rewrites every fetched `src` value to the cached copy's static path.
    ///
    /// Attributes whose source was not fetched are left as they are.
    pub fn rewrite(&self, rich_text: &str, static_prefix: &str) -> String {
        SRC_ATTRIBUTE
            .replace_all(rich_text, |caps: &Captures| {
                let whole = &caps[0];
                let Some(source) = caps.get(1) else {
                    return whole.to_string();
                };
                match self.url_to_asset.get(source.as_str()) {
                    Some(asset) => {
                        let start = caps.get(0).map_or(0, |m| m.start());
                        let head = &whole[..source.start() - start];
                        let tail = &whole[source.end() - start..];
                        format!("{head}{}{tail}", asset.static_path(static_prefix))
                    }
                    None => whole.to_string(),
                }
            })
            .into_owned()
    }
}

/// Extracts `src` attribute values in document order.
pub fn extract_sources(rich_text: &str) -> Vec<String> {
    SRC_ATTRIBUTE
        .captures_iter(rich_text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Returns the source itself if it is an absolute URL, else `host + source`.
pub fn absolute_url(source: &str, host: &str) -> String {
    if Url::parse(source).is_ok() {
        source.to_string()
    } else {
        format!("{host}{source}")
    }
}

/// Fetches the inline images of a single rich-text value.
///
/// Text without any `src` attribute yields an empty result. The layout walker
/// does not call this per block; it gathers the sources of every rich-text
/// block and makes one [`resolve_sources`] call for the whole layout.
pub async fn resolve_inline_assets<F: AssetFetcher>(
    rich_text: &str,
    host: &str,
    fetcher: &F,
) -> InlineAssets {
    resolve_sources(extract_sources(rich_text), host, fetcher).await
}

/// Fetches a set of sources, one request per distinct absolute URL, all
/// concurrently.
///
/// A failed fetch is logged and its source stays unresolved.
pub async fn resolve_sources<F, I>(sources: I, host: &str, fetcher: &F) -> InlineAssets
where
    F: AssetFetcher,
    I: IntoIterator<Item = String>,
{
    let mut by_url: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut seen_sources = HashSet::new();
    let mut result = InlineAssets::default();
    for source in sources {
        if !seen_sources.insert(source.clone()) {
            continue;
        }
        by_url
            .entry(absolute_url(&source, host))
            .or_default()
            .push(source.clone());
        result.sources.push(source);
    }
    if by_url.is_empty() {
        return result;
    }

    debug!(urls = by_url.len(), "fetching inline assets");
    let fetched = join_all(by_url.keys().map(|url| fetcher.fetch(url))).await;

    let mut seen_digests = HashSet::new();
    for ((url, sources), outcome) in by_url.into_iter().zip(fetched) {
        match outcome {
            Ok(asset) => {
                if seen_digests.insert(asset.content_digest.clone()) {
                    result.images.push(asset.clone());
                }
                for source in sources {
                    result.url_to_asset.insert(source, asset.clone());
                }
            }
            Err(err) => {
                warn!(%url, error = %err, "inline asset fetch failed, source left unrewritten")
            }
        }
    }
    result
}
