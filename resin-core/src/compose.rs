//! Per-locale composition of an entry's field groups.
//!
//! Each group is composed into its own map and the maps are merged in a fixed
//! order, later groups overriding earlier ones on key collision:
//! other < image < asset < relation link < layout.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::asset::AssetTable;
use crate::config::{Config, RelationPolicy};
use crate::error::{MissingRelationTargetError, Result};
use crate::fetch::AssetFetcher;
use crate::layout::{LayoutWalker, parse_layout};
use crate::schema::{FieldDef, FieldGroups, FieldSchema};
use crate::source::Entry;

/// Picks the value for `field`, preferring `field_<locale>` when the field is
/// localized and the localized value passes `present`.
fn localized<'e>(
    entry: &'e Entry,
    field: &str,
    def: Option<&FieldDef>,
    locale: Option<&str>,
    present: fn(&Value) -> bool,
) -> Option<&'e Value> {
    if let (Some(locale), Some(def)) = (locale, def) {
        if def.localize {
            let value = entry.get(&format!("{field}_{locale}"));
            if value.is_some_and(present) {
                return value;
            }
        }
    }
    entry.get(field)
}

fn not_null(value: &Value) -> bool {
    !value.is_null()
}

fn has_path(value: &Value) -> bool {
    value.get("path").is_some_and(not_null)
}

fn has_target(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        other => other.get("_id").is_some_and(not_null),
    }
}

pub struct Composer<'a, F> {
    config: &'a Config,
    table: &'a AssetTable,
    fetcher: &'a F,
}

impl<'a, F: AssetFetcher> Composer<'a, F> {
    pub fn new(config: &'a Config, table: &'a AssetTable, fetcher: &'a F) -> Self {
        Composer {
            config,
            table,
            fetcher,
        }
    }

    /// Composes every field group of `entry` for one locale (or none) and
    /// merges them.
    pub async fn compose(
        &self,
        schema: &FieldSchema,
        groups: &FieldGroups,
        entry: &Entry,
        locale: Option<&str>,
    ) -> Result<Map<String, Value>> {
        let mut merged = self.compose_other(schema, &groups.other, entry, locale);
        merged.extend(self.compose_assets(schema, &groups.image, entry, locale));
        merged.extend(self.compose_assets(schema, &groups.asset, entry, locale));
        let links = self.compose_relation_links(schema, &groups.relation_link, entry, locale)?;
        merged.extend(links);
        let layouts = self
            .compose_layouts(schema, &groups.layout, entry, locale)
            .await?;
        merged.extend(layouts);
        Ok(merged)
    }

    /// Passes values through unchanged under their base name.
    pub fn compose_other(
        &self,
        schema: &FieldSchema,
        fields: &[String],
        entry: &Entry,
        locale: Option<&str>,
    ) -> Map<String, Value> {
        fields
            .iter()
            .filter_map(|field| {
                localized(entry, field, schema.get(field), locale, not_null)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect()
    }

    /// Links image and asset fields to their downloaded asset node.
    ///
    /// Fields without a path, or whose path matches no downloaded asset, are
    /// left out.
    pub fn compose_assets(
        &self,
        schema: &FieldSchema,
        fields: &[String],
        entry: &Entry,
        locale: Option<&str>,
    ) -> Map<String, Value> {
        let edge = self.config.edge_key("localFile");
        let mut out = Map::new();
        for field in fields {
            let Some(value) = localized(entry, field, schema.get(field), locale, has_path) else {
                continue;
            };
            let Some(path) = value.get("path").and_then(Value::as_str) else {
                continue;
            };
            let Some(asset) = self.table.resolve(path, self.config.asset_matching) else {
                debug!(field = %field, path, "no downloaded asset for path, field skipped");
                continue;
            };
            let mut value = value.clone();
            if let Value::Object(object) = &mut value {
                object.insert(edge.clone(), Value::String(asset.to_string()));
            }
            out.insert(field.clone(), value);
        }
        out
    }

    /// Turns relation-link fields into `<field><edge_suffix>` keys holding the
    /// target node id (`<id>_<locale>` when composing for a locale).
    ///
    /// Multi-target links produce an array of ids.
    pub fn compose_relation_links(
        &self,
        schema: &FieldSchema,
        fields: &[String],
        entry: &Entry,
        locale: Option<&str>,
    ) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for field in fields {
            let target = localized(entry, field, schema.get(field), locale, has_target)
                .filter(|value| has_target(value))
                .and_then(|value| target_ids(value, locale));
            match target {
                Some(ids) => {
                    out.insert(self.config.edge_key(field), ids);
                }
                None => {
                    let missing = MissingRelationTargetError {
                        field: field.clone(),
                    };
                    match self.config.on_missing_relation {
                        RelationPolicy::Skip => {
                            warn!(entry = ?entry.id(), "{missing}, edge skipped")
                        }
                        RelationPolicy::Fail => return Err(missing.into()),
                    }
                }
            }
        }
        Ok(out)
    }

    /// Walks layout fields, emitting the rewritten tree under the field name
    /// and the assets it references under `<field>_files<edge_suffix>`.
    pub async fn compose_layouts(
        &self,
        schema: &FieldSchema,
        fields: &[String],
        entry: &Entry,
        locale: Option<&str>,
    ) -> Result<Map<String, Value>> {
        let walker = LayoutWalker::new(self.config, self.table);
        let mut out = Map::new();
        for field in fields {
            let Some(raw) = localized(entry, field, schema.get(field), locale, not_null) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            let blocks = parse_layout(field, raw)?;
            if blocks.is_empty() {
                out.insert(field.clone(), Value::Array(Vec::new()));
                continue;
            }
            let walk = walker.walk(blocks, field, self.fetcher).await;
            out.insert(field.clone(), serde_json::to_value(&walk.blocks)?);

            if walk.assets.is_empty() {
                continue;
            }
            let files = out
                .entry(self.config.edge_key(&format!("{field}_files")))
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(files) = files {
                for asset in walk.assets {
                    let asset = Value::String(asset.to_string());
                    if !files.contains(&asset) {
                        files.push(asset);
                    }
                }
            }
        }
        Ok(out)
    }
}

fn target_ids(value: &Value, locale: Option<&str>) -> Option<Value> {
    let node_id = |target: &Value| {
        let id = target.get("_id").and_then(Value::as_str)?;
        Some(match locale {
            Some(locale) => format!("{id}_{locale}"),
            None => id.to_string(),
        })
    };
    match value {
        Value::Array(targets) => {
            let ids: Vec<Value> = targets
                .iter()
                .filter_map(node_id)
                .map(Value::String)
                .collect();
            (!ids.is_empty()).then_some(Value::Array(ids))
        }
        target => node_id(target).map(Value::String),
    }
}
