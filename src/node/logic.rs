use crate::error::{GraphError, StageError};
use crate::node::Node;

/// Caller-supplied behaviour of a node type.
///
/// The engine wraps every stage in its own pre/post glue: `pre` moves
/// the node to `Executing`, the main body is [`NodeLogic::run_stage`],
/// and `post` records `Complete` or `Failed` and propagates output
/// values downstream. Implementations only provide the main body and
/// the attribute/settings pattern of the type.
///
/// A node without logic is legal: it runs one implicit no-op stage and
/// still participates in ordering and propagation.
pub trait NodeLogic {
    /// Ordered stage names. Most node types need a single stage.
    fn stage_names(&self) -> Vec<&'static str> {
        vec!["main"]
    }

    /// Defines the attribute pattern of the node type. Called once
    /// during two-phase construction, after the bare node exists.
    fn define_attrs(&self, node: &mut Node) -> Result<(), GraphError>;

    /// Defines the settings tree of the node type, if any.
    fn define_settings(&self, _node: &mut Node) {}

    /// The main body of one stage. Reads the node's input values and
    /// writes its outputs; a returned error marks the node failed and
    /// skips its downstream dependents.
    fn run_stage(&mut self, stage: &str, node: &mut Node) -> Result<(), StageError>;
}
