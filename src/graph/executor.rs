//! Graph-level execution: builds a path, walks it, and drives each
//! node's stage state machine.
//!
//! While a run is in flight the graph state is `Executing` and every
//! structural mutation fails fast with `GraphLocked`. The run always
//! finalises back to `Neutral`, whatever happened inside - only nodes
//! keep a lasting `Complete`/`Failed` state.
//!
//! Failure policy: a failed node poisons only its downstream
//! dependents. Before each sequence step the executor checks that all
//! of the node's direct upstream neighbours are satisfied (complete or
//! approved); otherwise the node is skipped and left neutral - it
//! never ran, so it holds no stale result.

use super::{Entity, ExecutionPath, Graph, GraphEvent};
use crate::attr::Value;
use crate::edge::AttrRef;
use crate::error::{GraphError, StageError};
use crate::node::{NodeId, NodeState};
use log::{debug, warn};

/// Outcome of one graph-level run: "completed with failures" rather
/// than an error, as long as the walk itself finished.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Nodes that ran all requested stages to completion, in order.
    pub executed: Vec<NodeId>,
    /// Nodes whose main stage raised, with the stage error.
    pub failed: Vec<(NodeId, StageError)>,
    /// Nodes skipped because an upstream dependency did not complete.
    pub skipped: Vec<NodeId>,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Uids of failed nodes, for caller-side reporting.
    pub fn failed_nodes(&self) -> Vec<NodeId> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }
}

impl Graph {
    /// Executes the given target nodes (with their critical paths) in
    /// dependency order, running every stage of each node.
    pub fn execute_nodes(&mut self, targets: &[NodeId]) -> Result<ExecutionReport, GraphError> {
        self.execute_to_stage(targets, None)
    }

    /// Executes the whole graph.
    pub fn execute_all(&mut self) -> Result<ExecutionReport, GraphError> {
        let targets = self.node_ids();
        self.execute_to_stage(&targets, None)
    }

    /// Executes targets up to (excluding) the given stage index; a
    /// `None` limit runs every stage. Nodes with fewer stages than the
    /// limit simply run all of theirs.
    pub fn execute_to_stage(
        &mut self,
        targets: &[NodeId],
        stage_limit: Option<usize>,
    ) -> Result<ExecutionReport, GraphError> {
        self.ensure_unlocked()?;
        let path = ExecutionPath::to_nodes(self, targets)?;

        self.set_graph_state(NodeState::Executing);
        let report = self.walk_sequence(&path, stage_limit);
        // Finaliser: the graph never lingers in a completed state.
        self.set_graph_state(NodeState::Neutral);

        let report = report?;
        debug!(
            "graph '{}': run finished ({} executed, {} failed, {} skipped)",
            self.name(),
            report.executed.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn walk_sequence(
        &mut self,
        path: &ExecutionPath,
        stage_limit: Option<usize>,
    ) -> Result<ExecutionReport, GraphError> {
        let mut report = ExecutionReport::default();
        for id in &path.sequence {
            let id = *id;
            if !self.upstream_satisfied(id)? {
                warn!(
                    "graph '{}': skipping node {} (upstream incomplete)",
                    self.name(),
                    id
                );
                report.skipped.push(id);
                continue;
            }
            match self.exec_to_stage(id, stage_limit)? {
                Ok(()) => report.executed.push(id),
                Err(stage_err) => report.failed.push((id, stage_err)),
            }
        }
        Ok(report)
    }

    /// All direct upstream neighbours are complete or approved.
    fn upstream_satisfied(&self, id: NodeId) -> Result<bool, GraphError> {
        for up in self.adjacent_nodes(id, false, true)? {
            if !self.node(up)?.state().is_satisfied() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs stages `0..limit` of one node, stopping at the first
    /// failing stage. The outer `Result` carries structural errors;
    /// the inner one the contained stage outcome.
    pub fn exec_to_stage(
        &mut self,
        id: NodeId,
        stage_limit: Option<usize>,
    ) -> Result<Result<(), StageError>, GraphError> {
        let stage_count = self.node(id)?.stage_names().len();
        let end = stage_limit.unwrap_or(stage_count).min(stage_count);
        for stage_index in 0..end {
            if let Err(e) = self.exec_stage(id, stage_index)? {
                return Ok(Err(e));
            }
        }
        Ok(Ok(()))
    }

    /// One stage as the (pre, main, post) triple: pre marks the node
    /// executing, main is the caller-supplied logic, post records the
    /// outcome and, on success, propagates outputs downstream.
    pub fn exec_stage(
        &mut self,
        id: NodeId,
        stage_index: usize,
    ) -> Result<Result<(), StageError>, GraphError> {
        // pre
        self.set_node_state(id, NodeState::Executing)?;

        // main, with the logic temporarily taken out of the node so it
        // can borrow the node's attribute trees mutably.
        let result = {
            let node = self.node_mut(id)?;
            match node.logic.take() {
                Some(mut logic) => {
                    let stages = logic.stage_names();
                    let outcome = match stages.get(stage_index) {
                        Some(&stage) => logic.run_stage(stage, node),
                        None => Ok(()),
                    };
                    node.logic = Some(logic);
                    outcome
                }
                // A node without logic runs an implicit no-op stage.
                None => Ok(()),
            }
        };

        // post
        match result {
            Err(e) => {
                self.set_node_state(id, NodeState::Failed)?;
                Ok(Err(e))
            }
            Ok(()) => {
                self.set_node_state(id, NodeState::Complete)?;
                self.propagate_outputs(id)?;
                Ok(Ok(()))
            }
        }
    }

    /// Copies the value of every connected output attribute into the
    /// input attribute on the far side of each edge.
    pub fn propagate_outputs(&mut self, id: NodeId) -> Result<(), GraphError> {
        let transfers: Vec<(AttrRef, Value)> = self
            .node_edges(id, true)
            .iter()
            .filter_map(|edge| {
                let value = self
                    .node(edge.source_node())
                    .ok()?
                    .attr(edge.source().role, &edge.source().path)?
                    .value()
                    .clone();
                Some((edge.dest().clone(), value))
            })
            .collect();
        for (dest, value) in transfers {
            self.set_attr_value(dest.node, dest.role, &dest.path, value)?;
        }
        Ok(())
    }

    /// Drives the given nodes (or every node) back to neutral.
    /// Idempotent: resetting an already-neutral node is a no-op.
    pub fn reset_nodes(&mut self, targets: Option<&[NodeId]>) -> Result<(), GraphError> {
        self.ensure_unlocked()?;
        let ids = match targets {
            Some(t) => t.to_vec(),
            None => self.node_ids(),
        };
        for id in ids {
            if self.node(id)?.state() != NodeState::Neutral {
                self.set_node_state(id, NodeState::Neutral)?;
            }
        }
        Ok(())
    }

    /// User-applied approval; legal only from `Complete`. The engine
    /// itself never sets this state.
    pub fn approve_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let state = self.node(id)?.state();
        if state != NodeState::Complete {
            return Err(GraphError::InvalidStateTransition {
                node: id,
                from: state,
                to: NodeState::Approved,
            });
        }
        self.set_node_state(id, NodeState::Approved)
    }

    pub(crate) fn set_node_state(&mut self, id: NodeId, state: NodeState) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        let old = node.state;
        if old == state {
            return Ok(());
        }
        node.state = state;
        self.emit(GraphEvent::StateChanged {
            entity: Entity::Node(id),
            old,
            new: state,
        });
        Ok(())
    }

    fn set_graph_state(&mut self, state: NodeState) {
        let old = self.state;
        if old == state {
            return;
        }
        self.state = state;
        self.emit(GraphEvent::StateChanged {
            entity: Entity::Graph,
            old,
            new: state,
        });
    }
}
