//! Directed edges between node attributes.
//!
//! Edges live in an arena owned by the graph; nodes and attributes
//! never hold live references to them. Both endpoint attributes are
//! addressed through plain [`AttrRef`] handles, so tearing an edge
//! down is an explicit arena-and-index operation with nothing left to
//! garbage collection.

use crate::attr::{AttrPath, AttrRole, DataType};
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an edge within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Handle addressing one attribute of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrRef {
    pub node: NodeId,
    pub role: AttrRole,
    pub path: AttrPath,
}

impl AttrRef {
    pub fn new(node: NodeId, role: AttrRole, path: impl Into<AttrPath>) -> Self {
        Self {
            node,
            role,
            path: path.into(),
        }
    }

    pub fn input(node: NodeId, path: impl Into<AttrPath>) -> Self {
        Self::new(node, AttrRole::Input, path)
    }

    pub fn output(node: NodeId, path: impl Into<AttrPath>) -> Self {
        Self::new(node, AttrRole::Output, path)
    }

    /// Role-qualified path, e.g. `output.result`. This is the form
    /// edge records use in snapshots.
    pub fn qualified_path(&self) -> String {
        if self.path.is_root() {
            self.role.root_name().to_string()
        } else {
            format!("{}.{}", self.role.root_name(), self.path)
        }
    }

    /// Splits a role-qualified path back into role and relative path.
    pub fn parse_qualified(node: NodeId, qualified: &str) -> Option<Self> {
        let (role, rest) = match qualified.split_once('.') {
            Some(("input", rest)) => (AttrRole::Input, rest),
            Some(("output", rest)) => (AttrRole::Output, rest),
            None if qualified == "input" => (AttrRole::Input, ""),
            None if qualified == "output" => (AttrRole::Output, ""),
            _ => return None,
        };
        Some(Self::new(node, role, rest))
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.qualified_path())
    }
}

/// An immutable directed link between a source attribute and a
/// destination attribute.
///
/// Edges are only ever constructed by the graph's connect operation
/// (or by snapshot restore, which trusts the saved topology); the
/// destination always carries the input role and holds at most one
/// incoming edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    source: AttrRef,
    dest: AttrRef,
    data_type: DataType,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, source: AttrRef, dest: AttrRef, data_type: DataType) -> Self {
        Self {
            id,
            source,
            dest,
            data_type,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> &AttrRef {
        &self.source
    }

    pub fn dest(&self) -> &AttrRef {
        &self.dest
    }

    pub fn source_node(&self) -> NodeId {
        self.source.node
    }

    pub fn dest_node(&self) -> NodeId {
        self.dest.node
    }

    /// Type fixed at creation to the source attribute's data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Given one endpoint, returns the other, or `None` when the
    /// handle matches neither side.
    pub fn opposite(&self, attr: &AttrRef) -> Option<&AttrRef> {
        if attr == &self.source {
            Some(&self.dest)
        } else if attr == &self.dest {
            Some(&self.source)
        } else {
            None
        }
    }

    /// True when either endpoint lies on the given node.
    pub fn touches_node(&self, node: NodeId) -> bool {
        self.source.node == node || self.dest.node == node
    }
}
