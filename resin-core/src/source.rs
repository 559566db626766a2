//! Records as they arrive from the CMS.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::FieldSchema;

/// One content record of a collection.
///
/// Keys are field names, possibly locale-suffixed (`title_fr`). The entry is
/// never modified by the pipeline; its JSON form is what node digests cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Map<String, Value>);

impl Entry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Entry(fields)
    }

    /// The stable CMS identifier, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get("_id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Entry(fields)
    }
}

/// A named collection: its field schema and its entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub fields: FieldSchema,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// A single unstructured record outside any collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Singleton {
    pub name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}
