use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier of an asset node created by the asset-download stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        AssetId(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        AssetId(id)
    }
}

/// How a CMS path fragment is matched against asset table keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetMatching {
    /// Normalized equality, else the first key ending in `/<path>`.
    #[default]
    Suffix,
    /// Any key containing the path; the last such key in table order wins.
    Substring,
}

/// Downloaded asset path → asset node identity.
///
/// Built by the asset-download stage and read-only during a build. Lookups
/// follow table insertion order, so results are reproducible for a given table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetTable {
    entries: IndexMap<String, AssetId>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, id: impl Into<AssetId>) {
        self.entries.insert(path.into(), id.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the asset for a path fragment, or `None` when nothing matches.
    pub fn resolve(&self, path: &str, matching: AssetMatching) -> Option<&AssetId> {
        match matching {
            AssetMatching::Suffix => self.resolve_suffix(path),
            AssetMatching::Substring => self.resolve_substring(path),
        }
    }

    fn resolve_suffix(&self, path: &str) -> Option<&AssetId> {
        let wanted = normalize(path);
        if wanted.is_empty() {
            return None;
        }
        let mut suffix_match = None;
        for (key, id) in &self.entries {
            let key = normalize(key);
            if key == wanted {
                return Some(id);
            }
            if suffix_match.is_none()
                && key
                    .strip_suffix(wanted)
                    .is_some_and(|head| head.ends_with('/'))
            {
                suffix_match = Some(id);
            }
        }
        suffix_match
    }

    fn resolve_substring(&self, path: &str) -> Option<&AssetId> {
        self.entries
            .iter()
            .filter(|(key, _)| key.contains(path))
            .map(|(_, id)| id)
            .last()
    }
}

impl<K: Into<String>, V: Into<AssetId>> FromIterator<(K, V)> for AssetTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AssetTable {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Strips leading `/` and `./` segments.
fn normalize(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}
