use std::convert::Infallible;
use std::sync::{PoisonError, RwLock};

use crate::node::Node;

/// Receives each node exactly once, when it is created.
///
/// This is the host framework's node-creation callback. Sinks take `&self` so
/// entries can be assembled concurrently; implementations lock internally.
pub trait NodeSink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn create(&self, node: &Node) -> Result<(), Self::Error>;
}

/// Collects nodes in memory, in creation order.
#[derive(Debug, Default)]
pub struct MemorySink {
    nodes: RwLock<Vec<Node>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every node created so far.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Looks up a created node by id.
    pub fn get(&self, id: &str) -> Option<Node> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|node| node.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NodeSink for MemorySink {
    type Error = Infallible;

    fn create(&self, node: &Node) -> Result<(), Self::Error> {
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(node.clone());
        Ok(())
    }
}

/// Adapts a plain callback into a [`NodeSink`].
pub struct SinkFn<C>(pub C);

impl<C> NodeSink for SinkFn<C>
where
    C: Fn(&Node) + Send + Sync,
{
    type Error = Infallible;

    fn create(&self, node: &Node) -> Result<(), Self::Error> {
        (self.0)(node);
        Ok(())
    }
}
