//! Plan output records handed to the output writer.

use serde::Serialize;

use crate::domain::{Placement, Priority};

/// An executable load tag for an enqueued module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadTag {
    pub id: String,
    /// Composed address
    pub src: String,
    /// Effective fetch priority
    pub priority: Priority,
    /// Priority the module was registered with
    pub declared_priority: Priority,
    /// Effective placement
    pub placement: Placement,
    /// Static dependency ids, declaration order
    pub static_dependencies: Vec<String>,
    /// Dynamic dependency ids, declaration order
    pub dynamic_dependencies: Vec<String>,
}

impl LoadTag {
    /// True when propagation moved the priority away from the declared value.
    pub fn priority_changed(&self) -> bool {
        self.priority != self.declared_priority
    }
}

/// A preload hint for a statically imported, non-enqueued module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadEntry {
    pub id: String,
    pub href: String,
    pub priority: Priority,
    pub declared_priority: Priority,
    pub placement: Placement,
}

impl PreloadEntry {
    pub fn priority_changed(&self) -> bool {
        self.priority != self.declared_priority
    }
}

/// One row of the resolution table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub id: String,
    pub address: String,
}

/// A per-module data block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntry {
    pub id: String,
    pub data: serde_json::Value,
}
