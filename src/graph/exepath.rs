//! The execution path builder: turns an unordered node subset into a
//! dependency-respecting sequence.
//!
//! Indices are transient: every build resets them on the nodes it
//! touches, assigns fresh 1-based positions, and never reuses them
//! across builds. The core correctness property is that for every
//! edge whose endpoints are both in the sequence, the source's index
//! is strictly smaller than the destination's.

use super::Graph;
use crate::error::GraphError;
use crate::node::NodeId;
use indexmap::IndexSet;
use log::debug;

/// One computed execution ordering, built per request.
#[derive(Debug, Clone)]
pub struct ExecutionPath {
    /// The execution order.
    pub sequence: Vec<NodeId>,
    /// Graph seeds that are ancestors of (or are themselves) targets.
    pub seed_nodes: Vec<NodeId>,
    /// Targets plus seeds; the frame the path is grown inside.
    pub boundary_nodes: IndexSet<NodeId>,
    /// Every node that may receive an index during this build.
    pub all_nodes: IndexSet<NodeId>,
}

impl ExecutionPath {
    /// Builds the path covering the targets' critical paths.
    pub fn to_nodes(graph: &mut Graph, targets: &[NodeId]) -> Result<Self, GraphError> {
        for id in targets {
            graph.node(*id)?;
        }

        let seed_nodes = Self::seeds_for(graph, targets)?;
        let mut boundary_nodes: IndexSet<NodeId> = targets.iter().copied().collect();
        boundary_nodes.extend(seed_nodes.iter().copied());

        let boundary_vec: Vec<NodeId> = boundary_nodes.iter().copied().collect();
        let mut all_nodes = boundary_nodes.clone();
        all_nodes.extend(graph.nodes_between(&boundary_vec, true)?);

        let mut path = ExecutionPath {
            sequence: Vec::new(),
            seed_nodes,
            boundary_nodes,
            all_nodes,
        };
        path.build(graph, targets)?;
        debug!(
            "graph '{}': built execution path over {} node(s)",
            graph.name(),
            path.sequence.len()
        );
        Ok(path)
    }

    /// Builds the path covering the whole graph.
    pub fn to_all(graph: &mut Graph) -> Result<Self, GraphError> {
        let targets = graph.node_ids();
        Self::to_nodes(graph, &targets)
    }

    /// Graph-level seeds that matter to the targets: seeds inside the
    /// targets' combined history, plus targets that have no incoming
    /// edges themselves. Creation order throughout.
    fn seeds_for(graph: &Graph, targets: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        let mut relevant = graph.combined_history(targets)?;
        for id in targets {
            if graph.node_edges(*id, false).is_empty() {
                relevant.insert(*id);
            }
        }
        Ok(graph
            .seed_nodes()
            .into_iter()
            .filter(|id| relevant.contains(id))
            .collect())
    }

    fn build(&mut self, graph: &mut Graph, targets: &[NodeId]) -> Result<(), GraphError> {
        // Indices from any previous build must never leak into this
        // one.
        for id in &self.all_nodes {
            graph.node_mut(*id)?.index = None;
        }

        let mut current_index: u32 = 1;
        let seeds = self.seed_nodes.clone();
        for seed in seeds {
            self.assign(graph, seed, &mut current_index)?;

            let mut probe: Vec<NodeId> = targets.to_vec();
            probe.push(seed);
            let between = graph.nodes_between(&probe, true)?;
            let mut visiting = IndexSet::new();
            for id in between {
                self.assign_upstream_first(graph, id, &mut current_index, &mut visiting)?;
            }
        }
        Ok(())
    }

    /// Ensures every direct upstream neighbour carries an index before
    /// the node itself is assigned one: depth-first, upstream-first.
    /// The visiting set keeps the recursion finite even when acyclic
    /// mode was switched off and the graph carries a cycle.
    fn assign_upstream_first(
        &mut self,
        graph: &mut Graph,
        id: NodeId,
        current_index: &mut u32,
        visiting: &mut IndexSet<NodeId>,
    ) -> Result<(), GraphError> {
        if graph.node(id)?.index.is_some() || !visiting.insert(id) {
            return Ok(());
        }
        let upstream = graph.in_creation_order(graph.adjacent_nodes(id, false, true)?);
        for up in upstream {
            if graph.node(up)?.index.is_none() {
                self.assign_upstream_first(graph, up, current_index, visiting)?;
            }
        }
        visiting.shift_remove(&id);
        self.assign(graph, id, current_index)
    }

    /// Assigns the next index and appends to the sequence; a node that
    /// already carries an index from this build is left alone.
    fn assign(
        &mut self,
        graph: &mut Graph,
        id: NodeId,
        current_index: &mut u32,
    ) -> Result<(), GraphError> {
        let node = graph.node_mut(id)?;
        if node.index.is_some() {
            return Ok(());
        }
        node.index = Some(*current_index);
        *current_index += 1;
        self.sequence.push(id);
        Ok(())
    }

    /// The sequence as a set, for membership tests.
    pub fn node_set(&self) -> IndexSet<NodeId> {
        self.sequence.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}
