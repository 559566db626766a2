//! Resin turns CMS content into nodes of a static-site graph.
//!
//! Core concepts:
//! - **Entry**: a record of a collection, keyed by (possibly locale-suffixed) field names
//! - **Field schema**: per-field type tag and localization flag, which decides how a field is composed
//! - **Asset table**: paths of already-downloaded assets mapped to their asset node ids
//! - **Layout**: a tree of blocks whose settings and rich text may embed assets
//! - **Node**: the output record, identified by entry id and locale and carrying a content digest
//! - **Edge**: a key ending in the configured edge suffix whose value is another node's id
//!
//! # Example
//!
//! ```ignore
//! use resin_core::{AssetTable, Config, MemorySink, Pipeline};
//!
//! let config = Config::default();
//! let table: AssetTable = [("storage/img/a.png", "asset-1")].into_iter().collect();
//! let sink = MemorySink::new();
//!
//! let pipeline = Pipeline::new(&config, &table, &fetcher, &sink);
//! let report = pipeline.run(&collections, &singletons).await;
//! assert!(report.is_clean());
//! ```
//!
//! # Digests
//!
//! A node's digest is a Blake3 hash of its entry's JSON form (plus `_<locale>`
//! for localized nodes). Entries keep the key order they arrived with, so the
//! same input always yields the same digest.

mod asset;
mod build;
mod compose;
mod config;
mod digest;
mod error;
mod fetch;
mod inflect;
mod inline;
mod layout;
mod node;
mod schema;
mod sink;
mod source;

pub use asset::{AssetId, AssetMatching, AssetTable};
pub use build::{BuildReport, EntryFailure, Pipeline};
pub use compose::Composer;
pub use config::{Config, RelationPolicy};
pub use digest::Digest;
pub use error::{Error, MalformedLayoutError, MissingRelationTargetError, Result};
pub use fetch::{AssetFetcher, FetchCache, RemoteAsset};
pub use inflect::singular;
pub use inline::{
    InlineAssets, absolute_url, extract_sources, resolve_inline_assets, resolve_sources,
};
pub use layout::{Block, LOCAL_FILE_ID, LayoutWalk, LayoutWalker, parse_layout};
pub use node::{Assembler, Internal, Node, SINGLETON_TYPE};
pub use schema::{FieldDef, FieldGroups, FieldKind, FieldSchema, classify};
pub use sink::{MemorySink, NodeSink, SinkFn};
pub use source::{Collection, Entry, Singleton};
