//! Topology queries over the attribute-edge index.
//!
//! Everything here is computed live from the index on each call -
//! nothing is cached, so results always reflect the current edge set.
//! Every transitive query tracks visited nodes per call; termination
//! never depends on the graph being acyclic.

use super::Graph;
use crate::edge::EdgeId;
use crate::error::GraphError;
use crate::node::NodeId;
use indexmap::IndexSet;
use itertools::Itertools;

impl Graph {
    /// Direct neighbours of a node, one hop along its edges.
    /// `future` follows outgoing edges, `history` incoming ones.
    pub fn adjacent_nodes(
        &self,
        id: NodeId,
        future: bool,
        history: bool,
    ) -> Result<IndexSet<NodeId>, GraphError> {
        self.node(id)?;
        let mut out = IndexSet::new();
        if future {
            for edge in self.node_edges(id, true) {
                out.insert(edge.dest_node());
            }
        }
        if history {
            for edge in self.node_edges(id, false) {
                out.insert(edge.source_node());
            }
        }
        Ok(out)
    }

    /// Every node transitively upstream of the given one.
    pub fn nodes_in_history(&self, id: NodeId) -> Result<IndexSet<NodeId>, GraphError> {
        self.walk(id, false)
    }

    /// Every node transitively downstream of the given one.
    pub fn nodes_in_future(&self, id: NodeId) -> Result<IndexSet<NodeId>, GraphError> {
        self.walk(id, true)
    }

    /// Directed closure from one node, excluding the node itself.
    fn walk(&self, id: NodeId, future: bool) -> Result<IndexSet<NodeId>, GraphError> {
        self.node(id)?;
        let mut visited = IndexSet::new();
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for next in self.adjacent_nodes(current, future, !future)? {
                if next != id && visited.insert(next) {
                    frontier.push(next);
                }
            }
        }
        Ok(visited)
    }

    /// Union of the histories of a set of nodes.
    pub fn combined_history(
        &self,
        ids: &[NodeId],
    ) -> Result<IndexSet<NodeId>, GraphError> {
        let mut out = IndexSet::new();
        for id in ids {
            out.extend(self.nodes_in_history(*id)?);
        }
        Ok(out)
    }

    /// Union of the futures of a set of nodes.
    pub fn combined_future(&self, ids: &[NodeId]) -> Result<IndexSet<NodeId>, GraphError> {
        let mut out = IndexSet::new();
        for id in ids {
            out.extend(self.nodes_in_future(*id)?);
        }
        Ok(out)
    }

    /// Nodes lying on paths between the given targets: the
    /// intersection of the targets' combined history and combined
    /// future, unioned with the targets themselves when `include` is
    /// set, differenced otherwise.
    pub fn nodes_between(
        &self,
        targets: &[NodeId],
        include: bool,
    ) -> Result<IndexSet<NodeId>, GraphError> {
        let history = self.combined_history(targets)?;
        let future = self.combined_future(targets)?;
        let mut between: IndexSet<NodeId> = history
            .iter()
            .copied()
            .filter(|id| future.contains(id))
            .collect();
        if include {
            between.extend(targets.iter().copied());
        } else {
            for id in targets {
                between.shift_remove(id);
            }
        }
        Ok(self.ordered_set(between))
    }

    /// Nodes with no incoming edges, in creation order.
    pub fn seed_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .map(|n| n.uid())
            .filter(|id| self.node_edges(*id, false).is_empty())
            .collect()
    }

    /// Nodes with no outgoing edges, in creation order.
    pub fn end_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .map(|n| n.uid())
            .filter(|id| self.node_edges(*id, true).is_empty())
            .collect()
    }

    /// Edges both of whose endpoints lie strictly between the given
    /// nodes (the selection itself excluded).
    pub fn contained_edges(
        &self,
        targets: &[NodeId],
    ) -> Result<Vec<EdgeId>, GraphError> {
        let inner = self.nodes_between(targets, false)?;
        Ok(self
            .edges()
            .filter(|e| inner.contains(&e.source_node()) && inner.contains(&e.dest_node()))
            .map(|e| e.id())
            .collect())
    }

    /// Partitions a node set into maximal weakly-connected components.
    ///
    /// Connectivity ignores edge direction; two selected nodes share
    /// an island whenever an undirected path joins them, even when
    /// that path passes through unselected nodes. Every input node
    /// lands in exactly one island and the islands cover the input.
    pub fn islands(&self, ids: &[NodeId]) -> Result<Vec<IndexSet<NodeId>>, GraphError> {
        let input: IndexSet<NodeId> = self
            .in_creation_order(ids.iter().copied())
            .into_iter()
            .collect();
        let mut assigned: IndexSet<NodeId> = IndexSet::new();
        let mut islands = Vec::new();

        for seed in &input {
            if assigned.contains(seed) {
                continue;
            }
            // Undirected closure through the whole graph.
            let mut component = IndexSet::new();
            let mut frontier = vec![*seed];
            component.insert(*seed);
            while let Some(current) = frontier.pop() {
                for next in self.adjacent_nodes(current, true, true)? {
                    if component.insert(next) {
                        frontier.push(next);
                    }
                }
            }
            let island: IndexSet<NodeId> = input
                .iter()
                .copied()
                .filter(|id| component.contains(id))
                .collect();
            assigned.extend(island.iter().copied());
            islands.push(island);
        }
        Ok(islands)
    }

    /// The longest continuous path of nodes between any (seed, end)
    /// pair, as an ordered sequence. Ties keep the first pair in
    /// iteration order; both inputs are walked in the given order, so
    /// the result is deterministic.
    pub fn longest_path(
        &mut self,
        seeds: &[NodeId],
        ends: &[NodeId],
    ) -> Result<Vec<NodeId>, GraphError> {
        let mut max_path: IndexSet<NodeId> = IndexSet::new();
        for (seed, end) in seeds.iter().cartesian_product(ends.iter()) {
            let path = self.nodes_between(&[*seed, *end], true)?;
            if path.len() > max_path.len() {
                max_path = path;
            }
        }
        self.order_nodes(&max_path.into_iter().collect::<Vec<_>>())
    }

    /// Sorts a node set into dependency order using the indices of an
    /// execution path built over that set.
    pub fn order_nodes(&mut self, ids: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        super::ExecutionPath::to_nodes(self, ids)?;
        let mut out: Vec<NodeId> = ids.to_vec();
        let mut keyed: Vec<(u32, usize, NodeId)> = Vec::with_capacity(out.len());
        for id in out.drain(..) {
            let index = self.node(id)?.exec_index().unwrap_or(u32::MAX);
            keyed.push((index, self.creation_index(id), id));
        }
        keyed.sort();
        Ok(keyed.into_iter().map(|(_, _, id)| id).collect())
    }

    /// Reorders a set into creation order (the fixed iteration order
    /// every deterministic query relies on).
    fn ordered_set(&self, set: IndexSet<NodeId>) -> IndexSet<NodeId> {
        self.in_creation_order(set).into_iter().collect()
    }
}
