use std::path::Path;

use resin_core::{AssetTable, Collection, Singleton};
use serde::Deserialize;

use crate::error::ToolError;

/// Everything fetched from the CMS for one build.
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub singletons: Vec<Singleton>,
    /// Downloaded asset path → asset node id.
    #[serde(default)]
    pub assets: AssetTable,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
