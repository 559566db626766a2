use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::asset::AssetTable;
use crate::config::Config;
use crate::error::Error;
use crate::fetch::AssetFetcher;
use crate::node::{Assembler, Node};
use crate::schema::classify;
use crate::sink::NodeSink;
use crate::source::{Collection, Singleton};

/// An entry or singleton that produced no nodes.
#[derive(Debug)]
pub struct EntryFailure {
    /// Collection name, or the singleton's name.
    pub collection: String,
    pub entry_id: Option<String>,
    pub error: Error,
}

/// Outcome of a build: every created node plus every isolated failure.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub nodes: Vec<Node>,
    pub failures: Vec<EntryFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs collections and singletons through the assembler.
pub struct Pipeline<'a, F, S> {
    assembler: Assembler<'a, F, S>,
}

impl<'a, F: AssetFetcher, S: NodeSink> Pipeline<'a, F, S> {
    pub fn new(config: &'a Config, table: &'a AssetTable, fetcher: &'a F, sink: &'a S) -> Self {
        Pipeline {
            assembler: Assembler::new(config, table, fetcher, sink),
        }
    }

    /// Builds nodes for every entry and singleton.
    ///
    /// Entries of a collection are assembled concurrently and all of them are
    /// awaited before the next collection starts. A failing entry is recorded
    /// in the report and does not stop the build.
    #[instrument(skip_all, fields(collections = collections.len(), singletons = singletons.len()))]
    pub async fn run(&self, collections: &[Collection], singletons: &[Singleton]) -> BuildReport {
        let mut report = BuildReport::default();

        for collection in collections {
            let groups = classify(&collection.fields);
            let results = join_all(
                collection
                    .entries
                    .iter()
                    .map(|entry| self.assembler.create_entry_nodes(collection, &groups, entry)),
            )
            .await;

            for (entry, result) in collection.entries.iter().zip(results) {
                match result {
                    Ok(nodes) => report.nodes.extend(nodes),
                    Err(error) => {
                        warn!(
                            collection = %collection.name,
                            entry = ?entry.id(),
                            %error,
                            "entry skipped"
                        );
                        report.failures.push(EntryFailure {
                            collection: collection.name.clone(),
                            entry_id: entry.id().map(str::to_string),
                            error,
                        });
                    }
                }
            }
        }

        for singleton in singletons {
            match self.assembler.create_singleton_node(singleton) {
                Ok(node) => report.nodes.push(node),
                Err(error) => {
                    warn!(singleton = %singleton.name, %error, "singleton skipped");
                    report.failures.push(EntryFailure {
                        collection: singleton.name.clone(),
                        entry_id: None,
                        error,
                    });
                }
            }
        }

        info!(
            nodes = report.nodes.len(),
            failures = report.failures.len(),
            "build finished"
        );
        report
    }
}
