//! YAML manifest describing a set of modules and the queue.
//!
//! ```yaml
//! modules:
//!   - id: app
//!     address: /js/app.js
//!     version: "1.2.0"
//!     priority: high
//!     dependencies:
//!       - ui
//!       - { id: editor, import: dynamic }
//!     data:
//!       nonce: abc
//! enqueue: [app]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DependencyRef, ModuleOptions, Version};
use crate::error::{ModschedError, Result};
use crate::scheduler::SchedulerState;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,

    /// Ids to enqueue, in order
    #[serde(default)]
    pub enqueue: Vec<String>,
}

/// One module entry of a manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleSpec {
    pub id: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,

    #[serde(default)]
    pub version: Version,

    /// Kept as a raw YAML scalar so a wrong type is reported like a wrong value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ModuleSpec {
    fn options(&self) -> ModuleOptions {
        ModuleOptions {
            priority: self.priority.as_ref().map(scalar_to_string),
            placement: self.placement.as_ref().map(scalar_to_string),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let manifest = Self::parse(&content)?;
        log::info!(
            "Loaded manifest from {} ({} modules, {} enqueued)",
            path.as_ref().display(),
            manifest.modules.len(),
            manifest.enqueue.len()
        );
        Ok(manifest)
    }

    /// Parse and validate manifest YAML.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject empty and duplicate module ids.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                return Err(ModschedError::InvalidManifest("module with empty id".to_string()));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(ModschedError::InvalidManifest(format!("duplicate module id '{}'", module.id)));
            }
        }
        if let Some(id) = self.enqueue.iter().find(|id| id.trim().is_empty()) {
            return Err(ModschedError::InvalidManifest(format!("empty id in enqueue list: {:?}", id)));
        }
        Ok(())
    }

    /// Register every module and enqueue the listed ids on `state`.
    pub fn apply(&self, state: &mut SchedulerState) {
        for module in &self.modules {
            state.register(
                &module.id,
                module.address.as_deref(),
                module.dependencies.iter().cloned(),
                module.version.clone(),
                module.options(),
            );
            if let Some(data) = &module.data {
                state.set_module_data(&module.id, data.clone());
            }
        }
        for id in &self.enqueue {
            state.enqueue(id);
        }
    }
}
