//! Nodes: typed, connectable entities owned by a graph.
//!
//! A node owns two attribute role roots (input and output), a settings
//! tree and an execution state. It knows nothing about other nodes or
//! edges - all connectivity lives in the graph's edge arena.

use crate::attr::{AttrPath, AttrRole, AttrSpec, NodeAttr, Value};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

mod logic;
mod settings;

pub use logic::NodeLogic;
pub use settings::{SettingEntry, Settings};

/// Stable identifier of a node within its graph; survives renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Execution state shared by nodes and the graph itself.
///
/// `Neutral -> Executing -> Complete | Failed -> Neutral` via reset;
/// `Approved` is user-applied, reachable only from `Complete`, and
/// never set by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Neutral,
    Executing,
    Complete,
    Failed,
    Approved,
}

impl NodeState {
    /// States that count as "upstream satisfied" when the executor
    /// decides whether a dependent node may run.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, NodeState::Complete | NodeState::Approved)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Neutral => "neutral",
            NodeState::Executing => "executing",
            NodeState::Complete => "complete",
            NodeState::Failed => "failed",
            NodeState::Approved => "approved",
        };
        f.write_str(name)
    }
}

/// A single node in a graph.
pub struct Node {
    pub(crate) uid: NodeId,
    name: String,
    type_name: String,
    input: NodeAttr,
    output: NodeAttr,
    settings: Settings,
    pub(crate) state: NodeState,
    /// Canvas position; pass-through presentation metadata.
    pub position: [f32; 2],
    /// Selection flag; pass-through presentation metadata.
    pub selected: bool,
    /// Transient position in the most recent execution path build.
    pub(crate) index: Option<u32>,
    pub(crate) logic: Option<Box<dyn NodeLogic>>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("state", &self.state)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Constructs a bare node. The uid is assigned when the node is
    /// added to a graph; logic-defined attributes are added by
    /// [`Node::init`] - construction stays in two explicit phases.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uid: NodeId(0),
            name: name.into(),
            type_name: String::new(),
            input: NodeAttr::new_root(AttrRole::Input),
            output: NodeAttr::new_root(AttrRole::Output),
            settings: Settings::new(),
            state: NodeState::Neutral,
            position: [0.0, 0.0],
            selected: false,
            index: None,
            logic: None,
        }
    }

    /// Attaches behaviour and runs the explicit initialisation phase:
    /// the logic defines the settings tree, then the attribute pattern.
    pub fn with_logic(
        mut self,
        type_name: impl Into<String>,
        logic: Box<dyn NodeLogic>,
    ) -> Result<Self, GraphError> {
        self.type_name = type_name.into();
        self.logic = Some(logic);
        self.init()?;
        Ok(self)
    }

    fn init(&mut self) -> Result<(), GraphError> {
        if let Some(logic) = self.logic.take() {
            logic.define_settings(self);
            let result = logic.define_attrs(self);
            self.logic = Some(logic);
            result?;
        }
        Ok(())
    }

    pub fn uid(&self) -> NodeId {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Index assigned by the most recent execution path build, if any.
    pub fn exec_index(&self) -> Option<u32> {
        self.index
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub(crate) fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    // --- attribute access ---

    pub fn role_root(&self, role: AttrRole) -> &NodeAttr {
        match role {
            AttrRole::Input => &self.input,
            AttrRole::Output => &self.output,
        }
    }

    pub fn role_root_mut(&mut self, role: AttrRole) -> &mut NodeAttr {
        match role {
            AttrRole::Input => &mut self.input,
            AttrRole::Output => &mut self.output,
        }
    }

    pub(crate) fn set_role_root(&mut self, role: AttrRole, root: NodeAttr) {
        match role {
            AttrRole::Input => self.input = root,
            AttrRole::Output => self.output = root,
        }
    }

    pub fn attr(&self, role: AttrRole, path: &AttrPath) -> Option<&NodeAttr> {
        self.role_root(role).find(path)
    }

    pub fn attr_mut(&mut self, role: AttrRole, path: &AttrPath) -> Option<&mut NodeAttr> {
        self.role_root_mut(role).find_mut(path)
    }

    /// Adds an input attribute under the given parent (the input root
    /// when `parent` is empty).
    pub fn add_input(&mut self, parent: &AttrPath, spec: AttrSpec) -> Result<AttrPath, GraphError> {
        self.add_attr(AttrRole::Input, parent, spec)
    }

    pub fn add_output(
        &mut self,
        parent: &AttrPath,
        spec: AttrSpec,
    ) -> Result<AttrPath, GraphError> {
        self.add_attr(AttrRole::Output, parent, spec)
    }

    pub fn add_attr(
        &mut self,
        role: AttrRole,
        parent: &AttrPath,
        spec: AttrSpec,
    ) -> Result<AttrPath, GraphError> {
        let uid = self.uid;
        let parent_attr =
            self.role_root_mut(role)
                .find_mut(parent)
                .ok_or_else(|| GraphError::AttrNotFound {
                    node: uid,
                    path: parent.clone(),
                })?;
        let name = spec.name.clone();
        parent_attr.add_child(spec)?;
        Ok(parent.join(&name))
    }

    /// Finds the first input attribute with the given name, anywhere
    /// in the input tree.
    pub fn get_input(&self, name: &str) -> Option<(AttrPath, &NodeAttr)> {
        self.input.find_by_name(name)
    }

    pub fn get_output(&self, name: &str) -> Option<(AttrPath, &NodeAttr)> {
        self.output.find_by_name(name)
    }

    /// Convenience for logic bodies: the value of a named input.
    pub fn input_value(&self, name: &str) -> Option<&Value> {
        self.get_input(name).map(|(_, a)| a.value())
    }

    /// Convenience for logic bodies: sets the value of a named output.
    pub fn set_output_value(&mut self, name: &str, value: Value) -> bool {
        if let Some((path, _)) = self.output.find_by_name(name) {
            if let Some(attr) = self.output.find_mut(&path) {
                attr.set_value(value);
                return true;
            }
        }
        false
    }

    pub fn search_inputs(&self, needle: &str) -> Vec<AttrPath> {
        Self::search(&self.input, needle)
    }

    pub fn search_outputs(&self, needle: &str) -> Vec<AttrPath> {
        Self::search(&self.output, needle)
    }

    fn search(root: &NodeAttr, needle: &str) -> Vec<AttrPath> {
        root.collect_paths(&AttrPath::root(), false)
            .into_iter()
            .filter(|p| {
                p.as_str()
                    .rsplit('.')
                    .next()
                    .map(|s| s.contains(needle))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Stage names of this node's logic; a node without logic exposes
    /// one implicit "main" stage.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.logic
            .as_ref()
            .map(|l| l.stage_names())
            .unwrap_or_else(|| vec!["main"])
    }
}
