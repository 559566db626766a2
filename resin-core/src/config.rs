use serde::{Deserialize, Serialize};

use crate::asset::AssetMatching;

/// What to do with a relation-link field that has no target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationPolicy {
    /// Omit the edge and log a warning.
    #[default]
    Skip,
    /// Fail the whole entry.
    Fail,
}

/// Build configuration shared by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for inline `src` values that are not absolute URLs.
    pub host: String,
    /// Locales to emit one node per entry for. Empty means unlocalized.
    #[serde(alias = "availableLngs")]
    pub available_lngs: Vec<String>,
    /// Layout component tags whose settings may hold asset references.
    #[serde(alias = "customComponents")]
    pub custom_components: Vec<String>,
    /// Suffix that marks a node key as an edge to another node.
    pub edge_suffix: String,
    /// Prefix of rewritten inline asset URLs.
    pub static_prefix: String,
    pub asset_matching: AssetMatching,
    pub on_missing_relation: RelationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            available_lngs: Vec::new(),
            custom_components: Vec::new(),
            edge_suffix: "___NODE".to_string(),
            static_prefix: "/static/".to_string(),
            asset_matching: AssetMatching::default(),
            on_missing_relation: RelationPolicy::default(),
        }
    }
}

impl Config {
    /// Returns the edge key for a field name, e.g. `author___NODE`.
    pub fn edge_key(&self, field: &str) -> String {
        format!("{field}{}", self.edge_suffix)
    }

    pub fn is_custom_component(&self, component: &str) -> bool {
        self.custom_components.iter().any(|c| c == component)
    }

    pub fn is_localized(&self) -> bool {
        !self.available_lngs.is_empty()
    }
}
