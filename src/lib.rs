//! # Kairo - Dependency Graph Engine
//!
//! **Kairo** is a node-based dependency graph engine. Nodes carry typed,
//! hierarchical attribute trees; directed edges connect output attributes to
//! input attributes under acyclicity checks; a deterministic planner turns any
//! set of target nodes into a topologically ordered execution path, which the
//! executor walks while tracking per-node state.
//!
//! ## Core Workflow
//!
//! 1.  **Describe behaviour**: Implement the [`NodeLogic`](node::NodeLogic)
//!     trait for each node type. The logic declares the node's attribute
//!     pattern and settings, and provides the body of its execution stages.
//! 2.  **Register**: Put a factory for every node type into a
//!     [`NodeCatalogue`](catalogue::NodeCatalogue).
//! 3.  **Build**: Create nodes in a [`Graph`](graph::Graph) and connect their
//!     attributes. Every connection is validated against direction and cycle
//!     rules before it is accepted.
//! 4.  **Execute**: Ask the graph to execute any target nodes. The engine
//!     plans the minimal upstream path, runs it in dependency order, and
//!     reports which nodes ran, failed or were skipped.
//! 5.  **Persist**: Save the whole graph to JSON or a compact binary snapshot
//!     and restore it later through the same catalogue.
//!
//! ## Quick Start
//!
//! ```rust
//! use kairo::prelude::{
//!     AttrPath, AttrRef, AttrRole, AttrSpec, DataType, Graph, GraphError, Node, NodeCatalogue,
//!     NodeLogic, StageError, Value,
//! };
//!
//! // A node type that doubles its input.
//! struct Doubler;
//!
//! impl NodeLogic for Doubler {
//!     fn define_attrs(&self, node: &mut Node) -> Result<(), GraphError> {
//!         node.add_input(&AttrPath::root(), AttrSpec::new("value", DataType::Float))?;
//!         node.add_output(&AttrPath::root(), AttrSpec::new("result", DataType::Float))?;
//!         Ok(())
//!     }
//!
//!     fn run_stage(&mut self, _stage: &str, node: &mut Node) -> Result<(), StageError> {
//!         let v = node
//!             .input_value("value")
//!             .and_then(|v| v.as_float())
//!             .unwrap_or(0.0);
//!         node.set_output_value("result", Value::Float(v * 2.0));
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let mut catalogue = NodeCatalogue::new();
//!     catalogue.register("doubler", || Box::new(Doubler));
//!
//!     let mut graph = Graph::new("quickstart");
//!     let a = graph.create_node(&catalogue, "doubler", "a")?;
//!     let b = graph.create_node(&catalogue, "doubler", "b")?;
//!
//!     // Feed a's result into b's value; b now depends on a.
//!     graph.connect(AttrRef::output(a, "result"), AttrRef::input(b, "value"))?;
//!
//!     graph.set_attr_value(a, AttrRole::Input, &AttrPath::new("value"), Value::Float(3.0))?;
//!     let report = graph.execute_all()?;
//!     assert_eq!(report.executed, vec![a, b]);
//!
//!     let result = graph.attr_value(b, AttrRole::Output, &AttrPath::new("result"))?;
//!     assert_eq!(result.as_float(), Some(12.0));
//!     Ok(())
//! }
//! ```

pub mod attr;
pub mod catalogue;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodeset;
pub mod prelude;
pub mod snapshot;
