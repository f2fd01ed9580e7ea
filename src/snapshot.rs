//! Saving and restoring whole graphs.
//!
//! A [`GraphRecord`] is the stable on-disk shape of a graph: plain
//! data, no logic. Records serialize to pretty JSON for inspection and
//! to bincode for compact artifacts. Restoring goes through the node
//! catalogue so every typed node gets its behaviour back; attribute
//! trees and settings are taken verbatim from the record rather than
//! rebuilt, because the saved graph may have diverged from the type's
//! initial pattern (arrays matched to data, user edits).

use crate::attr::{AttrRole, NodeAttr};
use crate::catalogue::NodeCatalogue;
use crate::edge::AttrRef;
use crate::error::SnapshotError;
use crate::graph::Graph;
use crate::node::{Node, NodeId, Settings};
use crate::nodeset::NodeSet;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;

/// One endpoint of a saved edge: the node uid plus the role-qualified
/// attribute path, e.g. `"output.result"`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EndpointRecord {
    pub node: NodeId,
    pub attr: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub source: EndpointRecord,
    pub dest: EndpointRecord,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NodeRecord {
    pub uid: NodeId,
    pub name: String,
    pub type_name: String,
    pub position: [f32; 2],
    pub input: NodeAttr,
    pub output: NodeAttr,
    pub settings: Settings,
}

/// The complete serializable shape of a graph.
///
/// Nodes are keyed by their uid rendered as a string so the record
/// stays a legal JSON object; insertion order is creation order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GraphRecord {
    pub name: String,
    pub is_acyclic: bool,
    pub nodes: IndexMap<String, NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub node_sets: IndexMap<String, Vec<NodeId>>,
}

impl GraphRecord {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_to_vec(self, standard()).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_from_slice(bytes, standard())
            .map(|(record, _)| record) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}

impl Graph {
    /// Captures the graph as a plain data record. Execution state and
    /// path indices are transient and deliberately not part of it.
    pub fn to_record(&self) -> GraphRecord {
        let nodes = self
            .nodes()
            .map(|node| {
                (
                    node.uid().0.to_string(),
                    NodeRecord {
                        uid: node.uid(),
                        name: node.name().to_string(),
                        type_name: node.type_name().to_string(),
                        position: node.position,
                        input: node.role_root(AttrRole::Input).clone(),
                        output: node.role_root(AttrRole::Output).clone(),
                        settings: node.settings().clone(),
                    },
                )
            })
            .collect();
        let edges = self
            .edges()
            .map(|edge| EdgeRecord {
                source: EndpointRecord {
                    node: edge.source().node,
                    attr: edge.source().qualified_path(),
                },
                dest: EndpointRecord {
                    node: edge.dest().node,
                    attr: edge.dest().qualified_path(),
                },
            })
            .collect();
        let node_sets = self
            .node_sets()
            .map(|(name, set)| (name.to_string(), set.nodes().collect()))
            .collect();
        GraphRecord {
            name: self.name().to_string(),
            is_acyclic: self.is_acyclic(),
            nodes,
            edges,
            node_sets,
        }
    }

    /// Rebuilds a graph from a record. Typed nodes are bound to their
    /// logic through `catalogue`; an unregistered type is an error.
    /// Edges are restored last, once every endpoint tree exists; the
    /// record is trusted, so no legality re-validation runs.
    pub fn from_record(
        record: GraphRecord,
        catalogue: &NodeCatalogue,
    ) -> Result<Self, SnapshotError> {
        let mut graph = Graph::new(record.name);
        graph.set_acyclic(record.is_acyclic);
        debug!(
            "restoring graph '{}': {} nodes, {} edges",
            graph.name(),
            record.nodes.len(),
            record.edges.len()
        );

        for (_, rec) in record.nodes {
            let mut node = Node::new(rec.name);
            node.uid = rec.uid;
            node.position = rec.position;
            if !rec.type_name.is_empty() {
                node.logic = Some(catalogue.resolve(&rec.type_name)?);
                node.set_type_name(rec.type_name);
            }
            // Saved trees win over the type's initial pattern.
            node.set_role_root(AttrRole::Input, rec.input);
            node.set_role_root(AttrRole::Output, rec.output);
            node.set_settings(rec.settings);
            graph.add_node(node)?;
        }

        for rec in record.edges {
            let source = AttrRef::parse_qualified(rec.source.node, &rec.source.attr)
                .ok_or_else(|| {
                    SnapshotError::Decode(format!("malformed edge endpoint '{}'", rec.source.attr))
                })?;
            let dest = AttrRef::parse_qualified(rec.dest.node, &rec.dest.attr).ok_or_else(|| {
                SnapshotError::Decode(format!("malformed edge endpoint '{}'", rec.dest.attr))
            })?;
            graph.insert_edge_unchecked(source, dest)?;
        }

        for (name, members) in record.node_sets {
            let mut set = NodeSet::new(name);
            for id in members {
                set.add(id);
            }
            graph.insert_node_set(set);
        }
        Ok(graph)
    }

    /// Saves the graph to a file as pretty-printed JSON.
    pub fn save_json(&self, path: &str) -> Result<(), SnapshotError> {
        let json = self.to_record().to_json()?;
        fs::write(path, json).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads a graph from a JSON snapshot file.
    pub fn load_json(path: &str, catalogue: &NodeCatalogue) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_record(GraphRecord::from_json(&json)?, catalogue)
    }

    /// Saves the graph to a file using the compact bincode format.
    pub fn save_binary(&self, path: &str) -> Result<(), SnapshotError> {
        let bytes = self.to_record().to_bytes()?;
        fs::write(path, bytes).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads a graph from a bincode snapshot file.
    pub fn load_binary(path: &str, catalogue: &NodeCatalogue) -> Result<Self, SnapshotError> {
        let bytes = fs::read(path).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_record(GraphRecord::from_bytes(&bytes)?, catalogue)
    }
}
