//! Module record and dependency edges

use serde::{Deserialize, Serialize};

use super::attrs::{Placement, Priority, Version};

/// How a dependency is imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// Resolved eagerly; eligible for preloading and priority propagation
    #[default]
    Static,
    /// Resolved only if and when imported at runtime
    Dynamic,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Static => "static",
            ImportKind::Dynamic => "dynamic",
        }
    }
}

/// An edge from a module to another module id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyRef {
    #[serde(rename = "id")]
    pub target_id: String,
    #[serde(rename = "import")]
    pub import_kind: ImportKind,
}

impl DependencyRef {
    pub fn new(target_id: impl Into<String>, import_kind: ImportKind) -> Self {
        Self {
            target_id: target_id.into(),
            import_kind,
        }
    }

    /// Static edge to `target_id`
    pub fn eager(target_id: impl Into<String>) -> Self {
        Self::new(target_id, ImportKind::Static)
    }

    /// Dynamic edge to `target_id`
    pub fn lazy(target_id: impl Into<String>) -> Self {
        Self::new(target_id, ImportKind::Dynamic)
    }

    pub fn is_static(&self) -> bool {
        self.import_kind == ImportKind::Static
    }
}

impl From<&str> for DependencyRef {
    fn from(target_id: &str) -> Self {
        Self::eager(target_id)
    }
}

impl From<String> for DependencyRef {
    fn from(target_id: String) -> Self {
        Self::eager(target_id)
    }
}

/// Manifest form: a bare id (static) or `{ id, import }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Id(String),
    Edge {
        id: String,
        #[serde(default)]
        import: ImportKind,
    },
}

impl<'de> Deserialize<'de> for DependencyRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match RawDependency::deserialize(deserializer)? {
            RawDependency::Id(id) => DependencyRef::eager(id),
            RawDependency::Edge { id, import } => DependencyRef::new(id, import),
        })
    }
}

/// Registration options as supplied by callers.
///
/// Values stay as raw strings until registration so that an unknown value can
/// be clamped to its default and reported instead of rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority.as_str().to_string());
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement.as_str().to_string());
        self
    }

    /// Set a priority value without validating it.
    pub fn with_raw_priority(mut self, value: impl Into<String>) -> Self {
        self.priority = Some(value.into());
        self
    }

    /// Set a placement value without validating it.
    pub fn with_raw_placement(mut self, value: impl Into<String>) -> Self {
        self.placement = Some(value.into());
        self
    }
}

/// A registrable loadable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Unique key
    pub id: String,

    /// Source location; `None` keeps the module in the graph but gives it no
    /// tag, preload or table entry of its own
    pub address: Option<String>,

    /// Outgoing edges in declaration order
    pub dependencies: Vec<DependencyRef>,

    pub version: Version,

    /// Declared fetch priority
    pub priority: Priority,

    /// Declared document placement
    pub placement: Placement,
}

impl Module {
    /// Create a module with default loading hints.
    pub fn new(id: impl Into<String>, address: Option<String>) -> Self {
        Self {
            id: id.into(),
            address: address.filter(|a| !a.is_empty()),
            dependencies: vec![],
            version: Version::default(),
            priority: Priority::default(),
            placement: Placement::default(),
        }
    }

    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Iterate the dependency edges of one import kind.
    pub fn dependencies_of_kind(&self, kind: ImportKind) -> impl Iterator<Item = &DependencyRef> {
        self.dependencies.iter().filter(move |d| d.import_kind == kind)
    }
}
