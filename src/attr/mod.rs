//! Hierarchical, typed attribute trees owned by nodes.
//!
//! Every node carries exactly two role roots, "input" and "output".
//! Attributes nest (compound and array attributes hold children),
//! names are unique among siblings, and each attribute's role is
//! stamped at creation from the root it descends from - it is never
//! inferred from path text.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

mod value;
pub use value::{DataType, Value};

/// Which fixed sub-tree of the owning node an attribute descends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrRole {
    Input,
    Output,
}

impl AttrRole {
    pub fn root_name(&self) -> &'static str {
        match self {
            AttrRole::Input => "input",
            AttrRole::Output => "output",
        }
    }
}

impl fmt::Display for AttrRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_name())
    }
}

/// Position of an attribute in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HierarchyKind {
    Root,
    Leaf,
    Compound,
    Array,
}

/// Dot-joined attribute address, relative to the role root.
///
/// The empty path addresses the role root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrPath(String);

impl AttrPath {
    pub fn root() -> Self {
        AttrPath(String::new())
    }

    pub fn new(path: impl Into<String>) -> Self {
        AttrPath(path.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Extends this path with one more child name.
    pub fn join(&self, name: &str) -> AttrPath {
        if self.0.is_empty() {
            AttrPath(name.to_string())
        } else {
            AttrPath(format!("{}.{}", self.0, name))
        }
    }

    /// True when `self` addresses `other` or one of its descendants.
    pub fn is_within(&self, other: &AttrPath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0 || self.0.starts_with(&format!("{}.", other.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttrPath {
    fn from(s: &str) -> Self {
        AttrPath::new(s)
    }
}

/// Everything needed to create one attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrSpec {
    pub name: String,
    pub data_type: DataType,
    pub is_array: bool,
    pub default: Option<Value>,
    pub desc: String,
}

impl AttrSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_array: false,
            default: None,
            desc: String::new(),
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }
}

/// One desired child entry for [`NodeAttr::match_array_to_spec`].
///
/// Unset fields fall back to the array's child template.
#[derive(Debug, Clone)]
pub struct ArrayEntry {
    pub name: String,
    pub data_type: Option<DataType>,
    pub default: Option<Value>,
}

impl ArrayEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            default: None,
        }
    }

    pub fn typed(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type),
            default: None,
        }
    }
}

/// A single element of a node's attribute tree.
///
/// The tree itself holds no connection data; edges live in the graph's
/// arena and refer to attributes through [`crate::edge::AttrRef`]
/// handles, so a deep copy of a subtree naturally carries no edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttr {
    name: String,
    data_type: DataType,
    is_array: bool,
    kind: HierarchyKind,
    role: AttrRole,
    value: Value,
    desc: String,
    children: Vec<NodeAttr>,
    /// Default spec applied when array reconciliation creates entries.
    child_template: Option<AttrSpec>,
}

impl NodeAttr {
    /// Creates the fixed role root ("input" or "output") of a node.
    pub(crate) fn new_root(role: AttrRole) -> Self {
        Self {
            name: role.root_name().to_string(),
            data_type: DataType::Null,
            is_array: false,
            kind: HierarchyKind::Root,
            role,
            value: Value::Null,
            desc: String::new(),
            children: Vec::new(),
            child_template: None,
        }
    }

    fn from_spec(spec: &AttrSpec, role: AttrRole) -> Self {
        let value = spec
            .default
            .clone()
            .unwrap_or_else(|| spec.data_type.default_value());
        Self {
            name: spec.name.clone(),
            data_type: spec.data_type,
            is_array: spec.is_array,
            kind: if spec.is_array {
                HierarchyKind::Array
            } else {
                HierarchyKind::Leaf
            },
            role,
            value,
            desc: spec.desc.clone(),
            children: Vec::new(),
            child_template: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn kind(&self) -> HierarchyKind {
        self.kind
    }

    pub fn role(&self) -> AttrRole {
        self.role
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn children(&self) -> &[NodeAttr] {
        &self.children
    }

    /// Any attribute may carry connections, compound and array roots
    /// included - aggregate connections are allowed by design.
    pub fn is_connectable(&self) -> bool {
        true
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Sets the default spec used for array entries created through
    /// [`NodeAttr::match_array_to_spec`].
    pub fn set_child_template(&mut self, template: AttrSpec) {
        self.child_template = Some(template);
    }

    pub fn child(&self, name: &str) -> Option<&NodeAttr> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut NodeAttr> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Resolves a dot path below this attribute.
    pub fn find(&self, path: &AttrPath) -> Option<&NodeAttr> {
        let mut current = self;
        for segment in path.segments() {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &AttrPath) -> Option<&mut NodeAttr> {
        let mut current = self;
        for segment in path.segments() {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Adds a child attribute, failing on a sibling name collision.
    pub fn add_child(&mut self, spec: AttrSpec) -> Result<&mut NodeAttr, GraphError> {
        if self.child(&spec.name).is_some() {
            return Err(GraphError::DuplicateName {
                scope: format!("attribute '{}'", self.name),
                name: spec.name.clone(),
            });
        }
        let attr = NodeAttr::from_spec(&spec, self.role);
        if self.kind == HierarchyKind::Leaf {
            self.kind = HierarchyKind::Compound;
        }
        self.children.push(attr);
        Ok(self.children.last_mut().unwrap())
    }

    /// Removes a direct child and returns its subtree, or `None` when
    /// no child carries that name. The graph layer is responsible for
    /// severing edges that touched the subtree.
    pub fn remove_child(&mut self, name: &str) -> Option<NodeAttr> {
        let pos = self.children.iter().position(|c| c.name == name)?;
        let removed = self.children.remove(pos);
        if self.children.is_empty() && self.kind == HierarchyKind::Compound {
            self.kind = HierarchyKind::Leaf;
        }
        Some(removed)
    }

    /// All descendant paths below this attribute, depth first, in
    /// declaration order. The attribute's own (given) path is included
    /// first when `include_self` is set.
    pub fn collect_paths(&self, prefix: &AttrPath, include_self: bool) -> Vec<AttrPath> {
        let mut out = Vec::new();
        if include_self {
            out.push(prefix.clone());
        }
        for child in &self.children {
            let p = prefix.join(&child.name);
            out.extend(child.collect_paths(&p, true));
        }
        out
    }

    /// Finds the first attribute with the given name anywhere below
    /// this one, depth first.
    pub fn find_by_name(&self, name: &str) -> Option<(AttrPath, &NodeAttr)> {
        self.find_by_name_inner(&AttrPath::root(), name)
    }

    fn find_by_name_inner<'a>(
        &'a self,
        prefix: &AttrPath,
        name: &str,
    ) -> Option<(AttrPath, &'a NodeAttr)> {
        for child in &self.children {
            let p = prefix.join(&child.name);
            if child.name == name {
                return Some((p, child));
            }
            if let Some(found) = child.find_by_name_inner(&p, name) {
                return Some(found);
            }
        }
        None
    }

    /// Deep-copies this subtree for use as a new array element.
    ///
    /// The copy carries no connections (edges are not stored in the
    /// tree) and must be given a name unique among its future siblings.
    pub fn copy_for_array(&self, new_name: impl Into<String>) -> NodeAttr {
        let mut copy = self.clone();
        copy.name = new_name.into();
        copy
    }

    /// Reconciles this array's children against an ordered list of
    /// desired entries.
    ///
    /// Children absent from `entries` are removed and returned (the
    /// graph layer cleans their edges up); names absent from the
    /// children are created from the child template overridden per
    /// entry. Children present in both are left untouched, which is
    /// the whole point: their edges survive.
    pub fn match_array_to_spec(
        &mut self,
        entries: &[ArrayEntry],
    ) -> Result<Vec<NodeAttr>, GraphError> {
        let wanted: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

        let excess: Vec<String> = self
            .children
            .iter()
            .filter(|c| !wanted.contains(&c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();
        let mut removed = Vec::with_capacity(excess.len());
        for name in excess {
            if let Some(sub) = self.remove_child(&name) {
                removed.push(sub);
            }
        }

        for entry in entries {
            if self.child(&entry.name).is_some() {
                continue;
            }
            let template = self.child_template.clone().unwrap_or_else(|| {
                AttrSpec::new(entry.name.clone(), self.data_type)
            });
            let spec = AttrSpec {
                name: entry.name.clone(),
                data_type: entry.data_type.unwrap_or(template.data_type),
                is_array: template.is_array,
                default: entry.default.clone().or(template.default),
                desc: template.desc,
            };
            self.add_child(spec)?;
        }
        Ok(removed)
    }
}
