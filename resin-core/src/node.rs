use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::asset::AssetTable;
use crate::compose::Composer;
use crate::config::Config;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::fetch::AssetFetcher;
use crate::inflect::singular;
use crate::schema::FieldGroups;
use crate::sink::NodeSink;
use crate::source::{Collection, Entry, Singleton};

/// Node type shared by all singletons.
pub const SINGLETON_TYPE: &str = "singleton";

/// Keys owned by the node envelope; data fields with these names are dropped.
const RESERVED_KEYS: [&str; 5] = ["id", "lang", "children", "parent", "internal"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    #[serde(rename = "type")]
    pub kind: String,
    pub content_digest: Digest,
}

/// A node of the site graph.
///
/// Serializes flat: the composed fields first, then the envelope keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    pub id: String,
    pub children: Vec<String>,
    pub parent: Option<String>,
    pub internal: Internal,
}

impl Node {
    fn new(
        mut fields: Map<String, Value>,
        id: String,
        lang: Option<String>,
        kind: String,
        content_digest: Digest,
    ) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }
        Node {
            fields,
            lang,
            id,
            children: Vec::new(),
            parent: None,
            internal: Internal {
                kind,
                content_digest,
            },
        }
    }
}

/// Builds nodes from entries and singletons and hands them to the sink.
///
/// Nodes are only ever created. An entry's nodes are all composed before any
/// of them reaches the sink, so a locale that fails to compose leaves no
/// partial output. A sink that rejects a node stops the entry there; nodes
/// the sink already accepted stay created and the entry is reported failed.
pub struct Assembler<'a, F, S> {
    config: &'a Config,
    composer: Composer<'a, F>,
    sink: &'a S,
}

impl<'a, F: AssetFetcher, S: NodeSink> Assembler<'a, F, S> {
    pub fn new(config: &'a Config, table: &'a AssetTable, fetcher: &'a F, sink: &'a S) -> Self {
        Assembler {
            config,
            composer: Composer::new(config, table, fetcher),
            sink,
        }
    }

    /// Composes the node of one entry for one locale, without creating it.
    ///
    /// The id is `<_id>` or `<_id>_<locale>`; the digest covers the entry's
    /// JSON form plus the locale.
    pub async fn assemble(
        &self,
        collection: &Collection,
        groups: &FieldGroups,
        entry: &Entry,
        locale: Option<&str>,
    ) -> Result<Node> {
        let entry_id = entry.id().ok_or(Error::MissingEntryId)?;
        let fields = self
            .composer
            .compose(&collection.fields, groups, entry, locale)
            .await?;
        let id = match locale {
            Some(locale) => format!("{entry_id}_{locale}"),
            None => entry_id.to_string(),
        };
        let digest = Digest::of_json(entry, locale)?;
        Ok(Node::new(
            fields,
            id,
            locale.map(str::to_string),
            // Node type is the singular collection name.
            singular(&collection.name),
            digest,
        ))
    }

    /// Creates every node of an entry: one per configured locale, or a single
    /// unlocalized node when no locales are configured.
    #[instrument(skip_all, fields(collection = %collection.name, entry = ?entry.id()))]
    pub async fn create_entry_nodes(
        &self,
        collection: &Collection,
        groups: &FieldGroups,
        entry: &Entry,
    ) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        if self.config.is_localized() {
            for locale in &self.config.available_lngs {
                nodes.push(self.assemble(collection, groups, entry, Some(locale)).await?);
            }
        } else {
            nodes.push(self.assemble(collection, groups, entry, None).await?);
        }
        for node in &nodes {
            self.create(node)?;
        }
        Ok(nodes)
    }

    /// Composes a singleton's node. Singletons have no locale dimension and
    /// their digest covers the raw data only.
    pub fn assemble_singleton(&self, singleton: &Singleton) -> Result<Node> {
        let digest = Digest::of_json(&singleton.data, None)?;
        let mut fields = singleton.data.clone();
        fields.insert("name".to_string(), Value::String(singleton.name.clone()));
        Ok(Node::new(
            fields,
            format!("singleton-{}", singleton.name),
            None,
            SINGLETON_TYPE.to_string(),
            digest,
        ))
    }

    pub fn create_singleton_node(&self, singleton: &Singleton) -> Result<Node> {
        let node = self.assemble_singleton(singleton)?;
        self.create(&node)?;
        Ok(node)
    }

    fn create(&self, node: &Node) -> Result<()> {
        debug!(id = %node.id, kind = %node.internal.kind, "creating node");
        self.sink.create(node).map_err(|err| Error::Sink {
            id: node.id.clone(),
            source: Box::new(err),
        })
    }
}
