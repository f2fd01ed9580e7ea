//! Node type registry.
//!
//! The catalogue is an injected collaborator: the graph consults it
//! only when creating a node by type name (and when restoring a
//! snapshot). Registration is a one-time startup action - there is no
//! hot reload.

use crate::error::GraphError;
use crate::node::NodeLogic;
use indexmap::IndexMap;

type LogicFactory = Box<dyn Fn() -> Box<dyn NodeLogic>>;

/// Maps node type names to logic constructors.
#[derive(Default)]
pub struct NodeCatalogue {
    factories: IndexMap<String, LogicFactory>,
}

impl NodeCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one node type. Re-registering a name replaces the
    /// previous factory.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn NodeLogic> + 'static,
    {
        self.factories.insert(type_name.into(), Box::new(factory));
    }

    /// Constructs a fresh logic instance for a registered type name.
    pub fn resolve(&self, type_name: &str) -> Result<Box<dyn NodeLogic>, GraphError> {
        self.factories
            .get(type_name)
            .map(|f| f())
            .ok_or_else(|| GraphError::UnknownNodeType(type_name.to_string()))
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
