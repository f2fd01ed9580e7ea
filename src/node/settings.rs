//! Typed settings tree carried by every node.
//!
//! Settings hold per-node configuration that is not wired into the
//! graph: values plus optional constraints a front end can render.
//! The engine itself only reads and round-trips them.

use crate::attr::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One settings entry: a value plus optional constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingEntry {
    pub value: Value,
    #[serde(default)]
    pub options: Option<Vec<Value>>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// A named tree of setting entries. Groups nest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    entries: IndexMap<String, SettingEntry>,
    groups: IndexMap<String, Settings>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut SettingEntry {
        let entry = self.entries.entry(name.into()).or_default();
        entry.value = value;
        entry
    }

    pub fn set_entry(&mut self, name: impl Into<String>, entry: SettingEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Boolean settings get a fixed true/false option pair, matching
    /// how option lists are presented elsewhere.
    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) {
        self.set_entry(
            name,
            SettingEntry {
                value: Value::Int(value as i64),
                options: Some(vec![Value::Int(1), Value::Int(0)]),
                min: None,
                max: None,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&SettingEntry> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    /// Returns the named nested group, creating it when absent.
    pub fn group_mut(&mut self, name: impl Into<String>) -> &mut Settings {
        self.groups.entry(name.into()).or_default()
    }

    pub fn group(&self, name: &str) -> Option<&Settings> {
        self.groups.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SettingEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }
}
