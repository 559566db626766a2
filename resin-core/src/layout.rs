//! Rich layout trees and the walker that resolves the assets inside them.
//!
//! A layout is an ordered list of blocks. Each block names its `component`,
//! carries free-form `settings` and may nest further blocks under `children`
//! or `columns`. Walking a layout:
//!
//! - resolves asset references held in the settings of allow-listed custom
//!   components against the [`AssetTable`],
//! - fetches every image referenced by `text`/`html` blocks and rewrites the
//!   references to the cached copies,
//! - returns the rewritten tree with the distinct asset ids it found.
//!
//! All inline fetches of a layout are joined before the tree is returned.

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use tracing::{instrument, trace};

use crate::asset::{AssetId, AssetTable};
use crate::config::Config;
use crate::error::MalformedLayoutError;
use crate::fetch::AssetFetcher;
use crate::inline::{InlineAssets, extract_sources, resolve_sources};

const RICH_TEXT_KEYS: [&str; 2] = ["text", "html"];

/// Settings key under which a resolved asset reference records its asset id.
pub const LOCAL_FILE_ID: &str = "localFileId";

/// One node of a layout tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, deserialize_with = "null_as_default")]
    pub component: String,
    #[serde(default, deserialize_with = "settings_map")]
    pub settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Block>>,
    /// Any other keys the CMS stores on the block.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn is_rich_text(&self) -> bool {
        RICH_TEXT_KEYS.contains(&self.component.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Block settings are an object. PHP backends encode an empty object as
/// `[]`, which is read as empty settings, the same as `null`.
fn settings_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(settings) => Ok(settings),
        Value::Null => Ok(Map::new()),
        Value::Array(items) if items.is_empty() => Ok(Map::new()),
        other => Err(de::Error::custom(format!(
            "expected settings object, found `{other}`"
        ))),
    }
}

/// Parses a raw layout field value.
///
/// The value is either a JSON array of blocks or a string holding one. A
/// blank string is an empty layout.
pub fn parse_layout(field: &str, raw: &Value) -> Result<Vec<Block>, MalformedLayoutError> {
    let parsed = match raw {
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => serde_json::from_str(text),
        other => Vec::<Block>::deserialize(other),
    };
    parsed.map_err(|source| MalformedLayoutError {
        field: field.to_string(),
        source,
    })
}

/// Result of walking one layout field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutWalk {
    pub blocks: Vec<Block>,
    /// Distinct asset ids referenced by custom components, first-seen order.
    pub assets: Vec<AssetId>,
    pub inline: InlineAssets,
}

pub struct LayoutWalker<'a> {
    config: &'a Config,
    table: &'a AssetTable,
}

impl<'a> LayoutWalker<'a> {
    pub fn new(config: &'a Config, table: &'a AssetTable) -> Self {
        LayoutWalker { config, table }
    }

    /// Walks a layout tree, resolving component assets and inline images.
    #[instrument(skip(self, blocks, fetcher), fields(blocks = blocks.len()))]
    pub async fn walk<F: AssetFetcher>(
        &self,
        mut blocks: Vec<Block>,
        field: &str,
        fetcher: &F,
    ) -> LayoutWalk {
        let mut assets = Vec::new();
        self.resolve_components(&mut blocks, field, false, &mut assets);

        let mut sources = Vec::new();
        collect_rich_text_sources(&blocks, &mut sources);
        let inline = resolve_sources(sources, &self.config.host, fetcher).await;
        if !inline.url_to_asset.is_empty() {
            rewrite_rich_text(&mut blocks, &inline, &self.config.static_prefix);
        }

        let assets: IndexSet<AssetId> = assets.into_iter().collect();
        LayoutWalk {
            blocks,
            assets: assets.into_iter().collect(),
            inline,
        }
    }

    fn resolve_components(
        &self,
        blocks: &mut [Block],
        field: &str,
        nested_column: bool,
        assets: &mut Vec<AssetId>,
    ) {
        for block in blocks.iter_mut() {
            if self.config.is_custom_component(&block.component) {
                for setting in block.settings.values_mut() {
                    assets.extend(self.resolve_setting(setting));
                }
            }
            if let Some(children) = block.children.as_mut() {
                trace!(field, component = %block.component, nested_column, "walking children");
                self.resolve_components(children, field, false, assets);
            }
            if let Some(columns) = block.columns.as_mut() {
                trace!(field, component = %block.component, nested_column, "walking columns");
                self.resolve_components(columns, field, true, assets);
            }
        }
    }

    /// Resolves a setting holding one `{path}` reference or an array of them.
    ///
    /// Each resolved reference gains a [`LOCAL_FILE_ID`] key. Other values are
    /// left untouched.
    fn resolve_setting(&self, setting: &mut Value) -> Vec<AssetId> {
        if setting.is_object() {
            return self.resolve_reference(setting).into_iter().collect();
        }
        match setting {
            Value::Array(items) if items.first().is_some_and(is_reference) => items
                .iter_mut()
                .filter_map(|item| self.resolve_reference(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn resolve_reference(&self, value: &mut Value) -> Option<AssetId> {
        let Value::Object(reference) = value else {
            return None;
        };
        let path = reference.get("path").and_then(Value::as_str)?;
        let id = self
            .table
            .resolve(path, self.config.asset_matching)?
            .clone();
        reference.insert(LOCAL_FILE_ID.to_string(), Value::String(id.to_string()));
        Some(id)
    }
}

fn is_reference(value: &Value) -> bool {
    value.get("path").is_some_and(Value::is_string)
}

fn collect_rich_text_sources(blocks: &[Block], sources: &mut Vec<String>) {
    for block in blocks {
        if block.is_rich_text() {
            for key in RICH_TEXT_KEYS {
                if let Some(text) = block.settings.get(key).and_then(Value::as_str) {
                    sources.extend(extract_sources(text));
                }
            }
        }
        for nested in [&block.children, &block.columns].into_iter().flatten() {
            collect_rich_text_sources(nested, sources);
        }
    }
}

fn rewrite_rich_text(blocks: &mut [Block], inline: &InlineAssets, static_prefix: &str) {
    for block in blocks.iter_mut() {
        if block.is_rich_text() {
            for key in RICH_TEXT_KEYS {
                if let Some(Value::String(text)) = block.settings.get_mut(key) {
                    *text = inline.rewrite(text, static_prefix);
                }
            }
        }
        for nested in [&mut block.children, &mut block.columns].into_iter().flatten() {
            rewrite_rich_text(nested, inline, static_prefix);
        }
    }
}
