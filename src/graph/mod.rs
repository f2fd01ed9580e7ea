//! The graph: owner of nodes, edges and the attribute-edge index.
//!
//! The graph is the single source of truth on connectivity. Nodes and
//! attributes hold no edge references; every edge lives in the arena
//! here and is indexed under both endpoint handles. The two index
//! sides and the arena are kept mutually consistent by construction:
//! every mutation runs through [`Graph::connect`] /
//! [`Graph::disconnect`] or the attribute-removal cleanup.

use crate::attr::{ArrayEntry, AttrPath, AttrRole, AttrSpec, Value};
use crate::catalogue::NodeCatalogue;
use crate::edge::{AttrRef, Edge, EdgeId};
use crate::error::{ConnectionRejection, GraphError};
use crate::node::{Node, NodeId, NodeState};
use crate::nodeset::NodeSet;
use ahash::AHashMap;
use indexmap::IndexMap;
use log::{debug, trace};
use std::fmt;

mod events;
mod executor;
mod exepath;
mod topology;

pub use events::{Entity, GraphEvent, Observer};
pub use executor::ExecutionReport;
pub use exepath::ExecutionPath;

pub struct Graph {
    name: String,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    attr_index: AHashMap<AttrRef, Vec<EdgeId>>,
    node_sets: IndexMap<String, NodeSet>,
    pub(crate) state: NodeState,
    is_acyclic: bool,
    next_node_uid: u64,
    next_edge_uid: u64,
    observers: Vec<Observer>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("state", &self.state)
            .field("is_acyclic", &self.is_acyclic)
            .finish_non_exhaustive()
    }
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            attr_index: AHashMap::new(),
            node_sets: IndexMap::new(),
            state: NodeState::Neutral,
            is_acyclic: true,
            next_node_uid: 1,
            next_edge_uid: 1,
            observers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_acyclic(&self) -> bool {
        self.is_acyclic
    }

    /// Turning acyclic mode off drops the directionality and cycle
    /// checks on new connections. Existing edges are never repaired.
    pub fn set_acyclic(&mut self, acyclic: bool) {
        self.is_acyclic = acyclic;
    }

    /// Registers a synchronous observer for change notifications.
    pub fn observe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub(crate) fn emit(&mut self, event: GraphEvent) {
        for obs in self.observers.iter_mut() {
            obs(&event);
        }
    }

    /// Structural mutation is only legal while the graph is neutral.
    fn ensure_unlocked(&self) -> Result<(), GraphError> {
        if self.state != NodeState::Neutral {
            return Err(GraphError::GraphLocked { state: self.state });
        }
        Ok(())
    }

    // --- node management ---

    /// Creates a node of a registered type and adds it to the graph.
    pub fn create_node(
        &mut self,
        catalogue: &NodeCatalogue,
        type_name: &str,
        name: impl Into<String>,
    ) -> Result<NodeId, GraphError> {
        self.ensure_unlocked()?;
        let logic = catalogue.resolve(type_name)?;
        let node = Node::new(name).with_logic(type_name, logic)?;
        self.add_node(node)
    }

    /// Adds an already-built node. Assigns a fresh uid unless the node
    /// carries one from a snapshot.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        self.ensure_unlocked()?;
        if self.nodes.values().any(|n| n.name() == node.name()) {
            return Err(GraphError::DuplicateName {
                scope: format!("graph '{}'", self.name),
                name: node.name().to_string(),
            });
        }
        if node.uid == NodeId(0) {
            node.uid = NodeId(self.next_node_uid);
            self.next_node_uid += 1;
        } else {
            self.next_node_uid = self.next_node_uid.max(node.uid.0 + 1);
        }
        let uid = node.uid;
        debug!("graph '{}': adding node '{}' ({})", self.name, node.name(), uid);
        self.nodes.insert(uid, node);
        self.emit(GraphEvent::NodeAdded { node: uid });
        Ok(uid)
    }

    /// Removes a node, destroying every edge that touched it first so
    /// no dangling index entry survives.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        self.ensure_unlocked()?;
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let touching: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.touches_node(id))
            .map(|e| e.id())
            .collect();
        for edge_id in touching {
            self.remove_edge_internal(edge_id)?;
        }
        for set in self.node_sets.values_mut() {
            set.remove(id);
        }
        let node = self.nodes.shift_remove(&id).expect("checked above");
        debug!("graph '{}': removed node '{}' ({})", self.name, node.name(), id);
        self.emit(GraphEvent::NodeRemoved { node: id });
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn node_by_name(&self, name: &str) -> Result<&Node, GraphError> {
        self.nodes
            .values()
            .find(|n| n.name() == name)
            .ok_or_else(|| GraphError::NodeNameNotFound(name.to_string()))
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.selected)
            .map(|n| n.uid())
            .collect()
    }

    /// Renames a node; the uid stays stable.
    pub fn rename_node(&mut self, id: NodeId, new_name: impl Into<String>) -> Result<(), GraphError> {
        let new_name = new_name.into();
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        if self
            .nodes
            .values()
            .any(|n| n.name() == new_name && n.uid() != id)
        {
            return Err(GraphError::DuplicateName {
                scope: format!("graph '{}'", self.name),
                name: new_name,
            });
        }
        self.nodes
            .get_mut(&id)
            .expect("checked above")
            .set_name(new_name);
        Ok(())
    }

    // --- attribute management (edge-aware) ---

    /// Adds an attribute to a node that is already in the graph.
    pub fn add_attribute(
        &mut self,
        id: NodeId,
        role: AttrRole,
        parent: &AttrPath,
        spec: AttrSpec,
    ) -> Result<AttrPath, GraphError> {
        self.ensure_unlocked()?;
        let path = self.node_mut(id)?.add_attr(role, parent, spec)?;
        self.emit(GraphEvent::AttributesChanged { node: id });
        Ok(path)
    }

    /// Removes an attribute subtree, destroying every edge that
    /// touched it. The role roots themselves cannot be removed.
    pub fn remove_attribute(
        &mut self,
        id: NodeId,
        role: AttrRole,
        path: &AttrPath,
    ) -> Result<(), GraphError> {
        self.ensure_unlocked()?;
        if path.is_root() {
            return Err(GraphError::AttrNotFound {
                node: id,
                path: path.clone(),
            });
        }
        let node = self.node(id)?;
        if node.attr(role, path).is_none() {
            return Err(GraphError::AttrNotFound {
                node: id,
                path: path.clone(),
            });
        }

        self.remove_edges_under(id, role, path)?;

        // Detach the subtree from its parent.
        let (parent_path, leaf_name) = split_parent(path);
        let node = self.node_mut(id)?;
        let parent = node
            .role_root_mut(role)
            .find_mut(&parent_path)
            .expect("parent of an existing path exists");
        parent.remove_child(&leaf_name);
        self.emit(GraphEvent::AttributesChanged { node: id });
        Ok(())
    }

    /// Reconciles an array attribute's children against `entries`,
    /// cleaning up edges on removed children while preserving the
    /// edges of children present in both.
    pub fn match_array_to_spec(
        &mut self,
        id: NodeId,
        role: AttrRole,
        array_path: &AttrPath,
        entries: &[ArrayEntry],
    ) -> Result<(), GraphError> {
        self.ensure_unlocked()?;
        let node = self.node(id)?;
        let array = node
            .attr(role, array_path)
            .ok_or_else(|| GraphError::AttrNotFound {
                node: id,
                path: array_path.clone(),
            })?;

        let wanted: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let excess: Vec<AttrPath> = array
            .children()
            .iter()
            .filter(|c| !wanted.contains(&c.name()))
            .map(|c| array_path.join(c.name()))
            .collect();
        for removed in &excess {
            self.remove_edges_under(id, role, removed)?;
        }

        let node = self.node_mut(id)?;
        let array = node
            .role_root_mut(role)
            .find_mut(array_path)
            .expect("checked above");
        array.match_array_to_spec(entries)?;
        self.emit(GraphEvent::AttributesChanged { node: id });
        Ok(())
    }

    /// Destroys every edge with an endpoint on or under the given
    /// attribute path. Both edge sides are checked: with acyclic mode
    /// off an input attribute can sit on the source side of an edge.
    fn remove_edges_under(
        &mut self,
        id: NodeId,
        role: AttrRole,
        path: &AttrPath,
    ) -> Result<(), GraphError> {
        let doomed: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| {
                [e.source(), e.dest()]
                    .iter()
                    .any(|end| end.node == id && end.role == role && end.path.is_within(path))
            })
            .map(|e| e.id())
            .collect();
        for edge_id in doomed {
            self.remove_edge_internal(edge_id)?;
        }
        Ok(())
    }

    /// Convenience: writes an attribute value in place.
    pub fn set_attr_value(
        &mut self,
        id: NodeId,
        role: AttrRole,
        path: &AttrPath,
        value: Value,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        match node.attr_mut(role, path) {
            Some(attr) => {
                attr.set_value(value);
                Ok(())
            }
            None => Err(GraphError::AttrNotFound {
                node: id,
                path: path.clone(),
            }),
        }
    }

    pub fn attr_value(
        &self,
        id: NodeId,
        role: AttrRole,
        path: &AttrPath,
    ) -> Result<&Value, GraphError> {
        let node = self.node(id)?;
        node.attr(role, path)
            .map(|a| a.value())
            .ok_or_else(|| GraphError::AttrNotFound {
                node: id,
                path: path.clone(),
            })
    }

    // --- connection legality ---

    /// Validates an attribute handle against the live trees.
    fn check_endpoint(&self, attr: &AttrRef) -> Result<(), GraphError> {
        let node = self.node(attr.node)?;
        if node.attr(attr.role, &attr.path).is_none() {
            return Err(GraphError::AttrNotFound {
                node: attr.node,
                path: attr.path.clone(),
            });
        }
        Ok(())
    }

    /// Pure legality predicate: no state is touched. Rejections carry
    /// the specific rule that failed.
    pub fn check_legal_connection(
        &self,
        source: &AttrRef,
        dest: &AttrRef,
    ) -> Result<(), GraphError> {
        let illegal = |reason: ConnectionRejection| GraphError::IllegalConnection {
            source_attr: source.clone(),
            dest_attr: dest.clone(),
            reason,
        };

        if source.node == dest.node {
            return Err(illegal(ConnectionRejection::SelfLoop));
        }
        if self.is_acyclic {
            if source.role == AttrRole::Input || dest.role == AttrRole::Output {
                return Err(illegal(ConnectionRejection::WrongDirection));
            }
            if self.nodes_in_future(dest.node)?.contains(&source.node) {
                return Err(illegal(ConnectionRejection::SourceInDestFuture));
            }
            if self.nodes_in_history(source.node)?.contains(&dest.node) {
                return Err(illegal(ConnectionRejection::DestInSourceHistory));
            }
        }
        Ok(())
    }

    pub fn is_legal_connection(&self, source: &AttrRef, dest: &AttrRef) -> bool {
        self.check_legal_connection(source, dest).is_ok()
    }

    // --- edges ---

    /// Connects a source attribute to a destination attribute.
    ///
    /// A previous incoming edge on the destination is silently
    /// replaced: input attributes hold at most one incoming edge.
    pub fn connect(&mut self, source: AttrRef, dest: AttrRef) -> Result<EdgeId, GraphError> {
        self.ensure_unlocked()?;
        self.check_endpoint(&source)?;
        self.check_endpoint(&dest)?;
        self.check_legal_connection(&source, &dest)?;

        let data_type = self
            .node(source.node)?
            .attr(source.role, &source.path)
            .expect("endpoint checked above")
            .data_type();

        // Replace, not append: clear the destination's incident entry.
        let previous: Vec<EdgeId> = self
            .attr_index
            .get(&dest)
            .map(|v| v.clone())
            .unwrap_or_default();
        for edge_id in previous {
            self.remove_edge_internal(edge_id)?;
        }

        let id = EdgeId(self.next_edge_uid);
        self.next_edge_uid += 1;
        let edge = Edge::new(id, source.clone(), dest.clone(), data_type);
        trace!("graph '{}': connect {} -> {}", self.name, source, dest);
        self.edges.insert(id, edge);
        self.attr_index.entry(source.clone()).or_default().push(id);
        self.attr_index.entry(dest.clone()).or_default().push(id);
        self.emit(GraphEvent::EdgeAdded {
            edge: id,
            source,
            dest,
        });
        Ok(id)
    }

    /// Explicitly removes an edge. Blocked while executing, like every
    /// other structural mutation.
    pub fn disconnect(&mut self, edge: EdgeId) -> Result<(), GraphError> {
        self.ensure_unlocked()?;
        self.remove_edge_internal(edge)
    }

    /// Arena + index teardown shared by disconnect, replacement and
    /// attribute/node removal. Always severs both index sides.
    fn remove_edge_internal(&mut self, id: EdgeId) -> Result<(), GraphError> {
        let edge = self
            .edges
            .shift_remove(&id)
            .ok_or(GraphError::EdgeNotFound(id))?;
        for end in [edge.source(), edge.dest()] {
            if let Some(entry) = self.attr_index.get_mut(end) {
                entry.retain(|e| *e != id);
                if entry.is_empty() {
                    self.attr_index.remove(end);
                }
            }
        }
        trace!("graph '{}': removed edge {}", self.name, id);
        self.emit(GraphEvent::EdgeRemoved {
            edge: id,
            source: edge.source().clone(),
            dest: edge.dest().clone(),
        });
        Ok(())
    }

    /// Restores an edge from a trusted snapshot: no legality check, no
    /// replacement semantics, saved order preserved.
    pub(crate) fn insert_edge_unchecked(
        &mut self,
        source: AttrRef,
        dest: AttrRef,
    ) -> Result<EdgeId, GraphError> {
        self.check_endpoint(&source)?;
        self.check_endpoint(&dest)?;
        let data_type = self
            .node(source.node)?
            .attr(source.role, &source.path)
            .expect("endpoint checked above")
            .data_type();
        let id = EdgeId(self.next_edge_uid);
        self.next_edge_uid += 1;
        self.edges
            .insert(id, Edge::new(id, source.clone(), dest.clone(), data_type));
        self.attr_index.entry(source.clone()).or_default().push(id);
        self.attr_index.entry(dest.clone()).or_default().push(id);
        self.emit(GraphEvent::EdgeAdded {
            edge: id,
            source,
            dest,
        });
        Ok(id)
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GraphError> {
        self.edges.get(&id).ok_or(GraphError::EdgeNotFound(id))
    }

    /// Edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The edges incident to one attribute handle, in creation order.
    pub fn attr_edges(&self, attr: &AttrRef) -> Vec<&Edge> {
        self.attr_index
            .get(attr)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Finds the edge joining two attribute handles, if present.
    pub fn find_edge(&self, source: &AttrRef, dest: &AttrRef) -> Option<EdgeId> {
        self.attr_index
            .get(source)?
            .iter()
            .copied()
            .find(|id| self.edges.get(id).map(|e| e.dest() == dest).unwrap_or(false))
    }

    /// All edges on one side of a node: `outputs` selects edges whose
    /// source lies on the node, otherwise edges whose destination does.
    pub fn node_edges(&self, id: NodeId, outputs: bool) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|e| {
                if outputs {
                    e.source_node() == id
                } else {
                    e.dest_node() == id
                }
            })
            .collect()
    }

    pub fn all_node_edges(&self, id: NodeId) -> Vec<&Edge> {
        self.edges.values().filter(|e| e.touches_node(id)).collect()
    }

    /// Input attribute handles on a node that currently carry an edge.
    pub fn connected_inputs(&self, id: NodeId) -> Vec<AttrRef> {
        let mut out: Vec<AttrRef> = Vec::new();
        for edge in self.node_edges(id, false) {
            if !out.contains(edge.dest()) {
                out.push(edge.dest().clone());
            }
        }
        out
    }

    /// Output attribute handles on a node that currently carry at
    /// least one edge. An output feeding several inputs appears once.
    pub fn connected_outputs(&self, id: NodeId) -> Vec<AttrRef> {
        let mut out: Vec<AttrRef> = Vec::new();
        for edge in self.node_edges(id, true) {
            if !out.contains(edge.source()) {
                out.push(edge.source().clone());
            }
        }
        out
    }

    // --- node sets ---

    /// Adds a node to a named set, creating the set on demand.
    pub fn add_node_to_set(&mut self, id: NodeId, set_name: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        self.node_sets
            .entry(set_name.to_string())
            .or_insert_with(|| NodeSet::new(set_name))
            .add(id);
        Ok(())
    }

    pub fn remove_node_from_set(&mut self, id: NodeId, set_name: &str) -> Result<(), GraphError> {
        let set = self
            .node_sets
            .get_mut(set_name)
            .ok_or_else(|| GraphError::SetNotFound(set_name.to_string()))?;
        if !set.remove(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        Ok(())
    }

    pub fn node_set(&self, set_name: &str) -> Result<&NodeSet, GraphError> {
        self.node_sets
            .get(set_name)
            .ok_or_else(|| GraphError::SetNotFound(set_name.to_string()))
    }

    /// Members of a named set, in insertion order.
    pub fn nodes_in_set(&self, set_name: &str) -> Result<Vec<NodeId>, GraphError> {
        Ok(self.node_set(set_name)?.nodes().collect())
    }

    pub fn node_set_names(&self) -> Vec<&str> {
        self.node_sets.keys().map(|k| k.as_str()).collect()
    }

    /// Names of every set containing the given node.
    pub fn sets_containing(&self, id: NodeId) -> Vec<&str> {
        self.node_sets
            .iter()
            .filter(|(_, set)| set.contains(id))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub(crate) fn node_sets(&self) -> impl Iterator<Item = (&str, &NodeSet)> {
        self.node_sets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert_node_set(&mut self, set: NodeSet) {
        self.node_sets.insert(set.name().to_string(), set);
    }

    // --- ordering helpers ---

    /// Position of a node in creation order; used wherever iteration
    /// over node sets must be deterministic.
    pub(crate) fn creation_index(&self, id: NodeId) -> usize {
        self.nodes.get_index_of(&id).unwrap_or(usize::MAX)
    }

    /// Sorts a collection of node ids into creation order.
    pub(crate) fn in_creation_order(&self, ids: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = ids.into_iter().collect();
        out.sort_by_key(|id| self.creation_index(*id));
        out
    }
}

/// Splits a non-root path into (parent path, leaf name).
fn split_parent(path: &AttrPath) -> (AttrPath, String) {
    let s = path.as_str();
    match s.rsplit_once('.') {
        Some((parent, leaf)) => (AttrPath::new(parent), leaf.to_string()),
        None => (AttrPath::root(), s.to_string()),
    }
}
