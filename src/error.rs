use crate::attr::AttrPath;
use crate::edge::{AttrRef, EdgeId};
use crate::node::{NodeId, NodeState};
use thiserror::Error;

/// The specific rule a rejected connection would have broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRejection {
    /// Source and destination belong to the same node.
    SelfLoop,
    /// Source is an input attribute, or destination is an output attribute.
    WrongDirection,
    /// The source node already lies in the destination node's future.
    SourceInDestFuture,
    /// The destination node already lies in the source node's history.
    DestInSourceHistory,
}

impl std::fmt::Display for ConnectionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ConnectionRejection::SelfLoop => "source and destination are on the same node",
            ConnectionRejection::WrongDirection => {
                "connection runs against attribute roles (output -> input only)"
            }
            ConnectionRejection::SourceInDestFuture => {
                "source node is in the destination node's future (would close a cycle)"
            }
            ConnectionRejection::DestInSourceHistory => {
                "destination node is in the source node's history (would close a cycle)"
            }
        };
        f.write_str(msg)
    }
}

/// Errors raised by structural graph operations.
///
/// Structural errors are local and synchronous: when one is returned,
/// the operation simply did not happen and no partial state remains.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    // The endpoint fields avoid the name `source`, which thiserror
    // reserves for the error chain.
    #[error("illegal connection from '{source_attr}' to '{dest_attr}': {reason}")]
    IllegalConnection {
        source_attr: AttrRef,
        dest_attr: AttrRef,
        reason: ConnectionRejection,
    },

    #[error("graph is locked for structural changes while in state '{state}'")]
    GraphLocked { state: NodeState },

    #[error("node '{0}' not found in graph")]
    NodeNotFound(NodeId),

    #[error("no node named '{0}' in graph")]
    NodeNameNotFound(String),

    #[error("attribute '{path}' not found on node '{node}'")]
    AttrNotFound { node: NodeId, path: AttrPath },

    #[error("edge '{0}' not found in graph")]
    EdgeNotFound(EdgeId),

    #[error("node set '{0}' not found in graph")]
    SetNotFound(String),

    #[error("name '{name}' already exists in {scope}")]
    DuplicateName { scope: String, name: String },

    #[error("node type '{0}' is not registered in the catalogue")]
    UnknownNodeType(String),

    #[error("node '{node}' cannot move from state '{from}' to '{to}'")]
    InvalidStateTransition {
        node: NodeId,
        from: NodeState,
        to: NodeState,
    },
}

/// Errors raised inside a node's main execution stage.
///
/// Stage errors are contained per node: the node is marked failed, its
/// downstream dependents are skipped, and the rest of the path still
/// runs. They never abort the graph-level walk.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("stage '{stage}' on node '{node}' failed: {message}")]
    Failed {
        node: String,
        stage: String,
        message: String,
    },

    #[error("input '{path}' carries no usable value")]
    MissingInput { path: AttrPath },

    #[error("expected {expected} on '{path}', found '{found}'")]
    TypeMismatch {
        path: AttrPath,
        expected: String,
        found: String,
    },
}

/// Errors raised while saving or restoring a graph snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("could not access snapshot file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
