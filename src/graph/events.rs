//! Discrete change notifications for UI collaborators.
//!
//! Every event fires synchronously at the point of mutation, in
//! mutation order; there is no batching or debouncing.

use crate::edge::{AttrRef, EdgeId};
use crate::node::{NodeId, NodeState};

/// The entity whose state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Graph,
    Node(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded {
        node: NodeId,
    },
    NodeRemoved {
        node: NodeId,
    },
    EdgeAdded {
        edge: EdgeId,
        source: AttrRef,
        dest: AttrRef,
    },
    EdgeRemoved {
        edge: EdgeId,
        source: AttrRef,
        dest: AttrRef,
    },
    AttributesChanged {
        node: NodeId,
    },
    StateChanged {
        entity: Entity,
        old: NodeState,
        new: NodeState,
    },
}

/// Synchronous observer callback registered on a graph.
pub type Observer = Box<dyn FnMut(&GraphEvent)>;
