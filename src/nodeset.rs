//! Named node groupings.
//!
//! A node set is purely organisational: it is never consulted by
//! connection legality or execution ordering. Membership is kept in
//! insertion order so set contents serialize deterministically.

use crate::node::NodeId;
use indexmap::IndexSet;

#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    name: String,
    nodes: IndexSet<NodeId>,
}

impl NodeSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a node; returns false when it was already a member.
    pub fn add(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Removes a node; returns false when it was not a member.
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.nodes.shift_remove(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
