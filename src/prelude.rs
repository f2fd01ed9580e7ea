//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kairo crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! # struct Doubler;
//! # impl NodeLogic for Doubler {
//! #     fn define_attrs(&self, node: &mut Node) -> std::result::Result<(), GraphError> {
//! #         node.add_input(&AttrPath::root(), AttrSpec::new("value", DataType::Float))?;
//! #         node.add_output(&AttrPath::root(), AttrSpec::new("result", DataType::Float))?;
//! #         Ok(())
//! #     }
//! #     fn run_stage(&mut self, _stage: &str, node: &mut Node) -> std::result::Result<(), StageError> {
//! #         let v = node.input_value("value").and_then(|v| v.as_float()).unwrap_or(0.0);
//! #         node.set_output_value("result", Value::Float(v * 2.0));
//! #         Ok(())
//! #     }
//! # }
//! # fn run_example() -> Result<()> {
//! // Register node types, build a graph and execute it.
//! let mut catalogue = NodeCatalogue::new();
//! catalogue.register("doubler", || Box::new(Doubler));
//!
//! let mut graph = Graph::new("example");
//! let a = graph.create_node(&catalogue, "doubler", "a")?;
//! let b = graph.create_node(&catalogue, "doubler", "b")?;
//! graph.connect(AttrRef::output(a, "result"), AttrRef::input(b, "value"))?;
//!
//! let report = graph.execute_all()?;
//! println!("executed {} nodes", report.executed.len());
//! # Ok(())
//! # }
//! ```

// Graph and execution
pub use crate::graph::{
    Entity, ExecutionPath, ExecutionReport, Graph, GraphEvent, Observer,
};

// Nodes and behaviour
pub use crate::catalogue::NodeCatalogue;
pub use crate::node::{Node, NodeId, NodeLogic, NodeState, SettingEntry, Settings};
pub use crate::nodeset::NodeSet;

// Attributes and values
pub use crate::attr::{ArrayEntry, AttrPath, AttrRole, AttrSpec, DataType, NodeAttr, Value};

// Edges
pub use crate::edge::{AttrRef, Edge, EdgeId};

// Snapshots
pub use crate::snapshot::{EdgeRecord, EndpointRecord, GraphRecord, NodeRecord};

// Error types
pub use crate::error::{ConnectionRejection, GraphError, SnapshotError, StageError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
