//! HTTP asset fetching for resin.
//!
//! [`HttpAssetFetcher`] downloads inline images referenced from rich text,
//! hashes their bytes and stores them in a local cache directory as
//! `name-digest.ext`, the same name the rewritten static URLs point at.
//!
//! # Example
//!
//! ```ignore
//! use resin_core::{AssetFetcher, FetchCache};
//! use resin_fetch::HttpAssetFetcher;
//!
//! let fetcher = FetchCache::new(HttpAssetFetcher::new(".resin/cache"));
//! let asset = fetcher.fetch("https://cms.example.com/storage/cat.jpg").await?;
//! println!("{}", asset.static_path("/static/"));
//! ```

mod client;
mod error;

pub use client::{HttpAssetFetcher, name_and_ext, persist};
pub use error::FetchError;
