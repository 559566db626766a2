use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The category a field falls into, derived from its schema type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Image,
    Asset,
    /// A link to an entry of another collection.
    RelationLink,
    Layout,
    /// Anything else; passed through unchanged.
    Other,
}

impl FieldKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "image" => FieldKind::Image,
            "asset" => FieldKind::Asset,
            "collectionlink" => FieldKind::RelationLink,
            "layout" => FieldKind::Layout,
            _ => FieldKind::Other,
        }
    }
}

/// Schema entry for one field of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type", default)]
    pub type_tag: String,
    /// Whether the entry carries `<field>_<locale>` variants.
    #[serde(default)]
    pub localize: bool,
}

impl FieldDef {
    pub fn new(type_tag: impl Into<String>, localize: bool) -> Self {
        Self {
            type_tag: type_tag.into(),
            localize,
        }
    }

    pub fn kind(&self) -> FieldKind {
        FieldKind::from_tag(&self.type_tag)
    }
}

/// Field name → definition, in schema order.
pub type FieldSchema = IndexMap<String, FieldDef>;

/// Field names of a schema partitioned by [`FieldKind`].
///
/// Every schema key lands in exactly one group, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldGroups {
    pub image: Vec<String>,
    pub asset: Vec<String>,
    pub relation_link: Vec<String>,
    pub layout: Vec<String>,
    pub other: Vec<String>,
}

impl FieldGroups {
    /// Total number of classified fields.
    pub fn len(&self) -> usize {
        self.image.len()
            + self.asset.len()
            + self.relation_link.len()
            + self.layout.len()
            + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions the fields of a schema by kind.
pub fn classify(schema: &FieldSchema) -> FieldGroups {
    let mut groups = FieldGroups::default();
    for (name, def) in schema {
        let group = match def.kind() {
            FieldKind::Image => &mut groups.image,
            FieldKind::Asset => &mut groups.asset,
            FieldKind::RelationLink => &mut groups.relation_link,
            FieldKind::Layout => &mut groups.layout,
            FieldKind::Other => &mut groups.other,
        };
        group.push(name.clone());
    }
    groups
}
