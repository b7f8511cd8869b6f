//! Scheduler state and the public registration / print API.
//!
//! One `SchedulerState` lives for one render pass. The registry and the queue
//! are separate collections joined only when a plan is built, so ids can be
//! enqueued before they are registered. Every print operation rebuilds the
//! plan from current state; nothing is cached between calls.

use std::collections::HashMap;

use crate::address::{AddressComposer, VersionQueryComposer};
use crate::diagnostics::Diagnostic;
use crate::domain::{DependencyRef, Module, ModuleOptions, Placement, Priority, Version};
use crate::graph::Registry;
use crate::plan::{DataEntry, EmissionPlan, LoadTag, Planner, PreloadEntry, TableEntry, partition_queue};
use crate::queue::Queue;
use crate::resolve;

pub struct SchedulerState {
    registry: Registry,
    queue: Queue,
    module_data: HashMap<String, serde_json::Value>,
    composer: Box<dyn AddressComposer + Send>,
    registration_diagnostics: Vec<Diagnostic>,
}

impl SchedulerState {
    /// Create an empty state using [`VersionQueryComposer`] with no ambient version.
    pub fn new() -> Self {
        Self::with_composer(VersionQueryComposer::default())
    }

    /// Create an empty state with a custom address composer.
    pub fn with_composer(composer: impl AddressComposer + Send + 'static) -> Self {
        Self {
            registry: Registry::new(),
            queue: Queue::new(),
            module_data: HashMap::new(),
            composer: Box::new(composer),
            registration_diagnostics: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register (or overwrite) a module. Never fails: unrecognized option
    /// values fall back to their defaults and are reported.
    pub fn register<D>(
        &mut self,
        id: &str,
        address: Option<&str>,
        dependencies: D,
        version: Version,
        options: ModuleOptions,
    ) where
        D: IntoIterator,
        D::Item: Into<DependencyRef>,
    {
        let mut module = Module::new(id, address.map(str::to_string));
        module.dependencies = dependencies.into_iter().map(Into::into).collect();
        module.version = version;

        if let Some(raw) = options.priority.as_deref() {
            module.priority = self.parse_or_report(id, raw);
        }
        if let Some(raw) = options.placement.as_deref() {
            module.placement = self.parse_or_report(id, raw);
        }

        if self.registry.insert(module) {
            log::debug!("Re-registered module '{}'", id);
        } else {
            log::debug!("Registered module '{}'", id);
        }
    }

    /// Queue `id` for output. It does not need to be registered yet.
    pub fn enqueue(&mut self, id: &str) {
        if !self.queue.push(id) {
            log::debug!("Module '{}' is already enqueued", id);
        }
    }

    /// Register `id` if it is not registered yet, then queue it. An already
    /// registered module keeps its first registration.
    pub fn enqueue_with<D>(
        &mut self,
        id: &str,
        address: Option<&str>,
        dependencies: D,
        version: Version,
        options: ModuleOptions,
    ) where
        D: IntoIterator,
        D::Item: Into<DependencyRef>,
    {
        if self.registry.contains(id) {
            log::debug!("Module '{}' already registered; ignoring enqueue arguments", id);
        } else {
            self.register(id, address, dependencies, version, options);
        }
        self.enqueue(id);
    }

    /// Remove `id` from the queue only.
    pub fn dequeue(&mut self, id: &str) {
        if !self.queue.remove(id) {
            log::debug!("Dequeue of '{}' ignored: not enqueued", id);
        }
    }

    /// Remove `id` from both the registry and the queue.
    pub fn deregister(&mut self, id: &str) {
        let was_queued = self.queue.remove(id);
        if self.registry.remove(id).is_none() && !was_queued {
            log::debug!("Deregister of '{}' ignored: unknown module", id);
        }
        self.module_data.remove(id);
    }

    /// Change the declared priority of a registered module.
    pub fn set_priority(&mut self, id: &str, value: &str) -> bool {
        if !self.registry.contains(id) {
            log::debug!("set_priority on unknown module '{}' ignored", id);
            return false;
        }
        let priority: Priority = self.parse_or_report(id, value);
        if let Some(module) = self.registry.get_mut(id) {
            module.priority = priority;
        }
        true
    }

    /// Change the declared placement of a registered module.
    pub fn set_placement(&mut self, id: &str, value: &str) -> bool {
        if !self.registry.contains(id) {
            log::debug!("set_placement on unknown module '{}' ignored", id);
            return false;
        }
        let placement: Placement = self.parse_or_report(id, value);
        if let Some(module) = self.registry.get_mut(id) {
            module.placement = placement;
        }
        true
    }

    /// Attach a data block emitted alongside `id` when it is planned.
    pub fn set_module_data(&mut self, id: &str, data: serde_json::Value) {
        self.module_data.insert(id.to_string(), data);
    }

    pub fn get_queue(&self) -> Vec<String> {
        self.queue.ids().to_vec()
    }

    pub fn get_dependencies(&self, id: &str) -> &[DependencyRef] {
        self.registry.get_dependencies(id)
    }

    /// Dependency ids of `id` that are not registered.
    pub fn check_dependencies(&self, id: &str) -> Vec<String> {
        self.registry.missing_dependencies(id)
    }

    /// Diagnostics raised by registration and setters so far.
    pub fn registration_diagnostics(&self) -> &[Diagnostic] {
        &self.registration_diagnostics
    }

    pub fn effective_placement(&self, id: &str) -> Placement {
        resolve::effective_placement(&self.registry, id)
    }

    pub fn effective_priority(&self, id: &str) -> Priority {
        let exclusions = partition_queue(&self.registry, &self.queue);
        resolve::effective_priority(&self.registry, &exclusions.active_queue, id)
    }

    /// Build the full plan for the current state.
    pub fn plan(&self) -> EmissionPlan {
        Planner::new(&self.registry, &self.queue, &*self.composer, &self.module_data).build()
    }

    pub fn plan_preloads(&self) -> Vec<PreloadEntry> {
        self.plan().preloads
    }

    pub fn plan_load_tags(&self, placement: Placement) -> Vec<LoadTag> {
        self.plan().load_tags_for(placement)
    }

    pub fn plan_resolution_table(&self) -> Vec<TableEntry> {
        self.plan().resolution_table
    }

    pub fn plan_module_data(&self) -> Vec<DataEntry> {
        self.plan().module_data
    }

    fn parse_or_report<T>(&mut self, id: &str, raw: &str) -> T
    where
        T: std::str::FromStr<Err = crate::domain::InvalidAttribute> + Default,
    {
        match raw.parse::<T>() {
            Ok(value) => value,
            Err(err) => {
                let diagnostic = Diagnostic::InvalidAttribute {
                    id: id.to_string(),
                    attribute: err.attribute.to_string(),
                    value: err.value,
                };
                log::warn!("{}", diagnostic);
                self.registration_diagnostics.push(diagnostic);
                T::default()
            }
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerState")
            .field("registry", &self.registry)
            .field("queue", &self.queue)
            .field("module_data", &self.module_data.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_DEPS: [&str; 0] = [];

    fn state() -> SchedulerState {
        SchedulerState::new()
    }

    #[test]
    fn test_register_and_get_dependencies() {
        let mut s = state();
        s.register("a", Some("/a.js"), ["b"], Version::Ambient, ModuleOptions::new());
        assert_eq!(s.get_dependencies("a"), [DependencyRef::eager("b")]);
        assert!(s.get_dependencies("zzz").is_empty());
    }

    #[test]
    fn test_invalid_priority_clamped_and_reported() {
        let mut s = state();
        s.register(
            "a",
            Some("/a.js"),
            NO_DEPS,
            Version::Ambient,
            ModuleOptions::new().with_raw_priority("urgent"),
        );
        assert_eq!(s.registry().get("a").unwrap().priority, Priority::Auto);
        assert_eq!(
            s.registration_diagnostics(),
            [Diagnostic::InvalidAttribute {
                id: "a".to_string(),
                attribute: "priority".to_string(),
                value: "urgent".to_string(),
            }]
        );
    }

    #[test]
    fn test_invalid_placement_clamped() {
        let mut s = state();
        s.register(
            "a",
            Some("/a.js"),
            NO_DEPS,
            Version::Ambient,
            ModuleOptions::new().with_raw_placement("footer"),
        );
        assert_eq!(s.registry().get("a").unwrap().placement, Placement::Early);
        assert_eq!(s.registration_diagnostics().len(), 1);
    }

    #[test]
    fn test_reregister_keeps_queue_membership() {
        let mut s = state();
        s.register("a", Some("/a.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        s.enqueue("a");
        s.register("a", Some("/a2.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        assert_eq!(s.get_queue(), ["a"]);
        assert_eq!(s.registry().get("a").unwrap().address.as_deref(), Some("/a2.js"));
    }

    #[test]
    fn test_enqueue_with_first_registration_wins() {
        let mut s = state();
        s.register("a", Some("/first.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        s.enqueue_with("a", Some("/second.js"), ["x"], Version::Ambient, ModuleOptions::new());
        assert_eq!(s.registry().get("a").unwrap().address.as_deref(), Some("/first.js"));
        assert!(s.get_dependencies("a").is_empty());
        assert_eq!(s.get_queue(), ["a"]);
    }

    #[test]
    fn test_enqueue_with_registers_unknown() {
        let mut s = state();
        s.enqueue_with("a", Some("/a.js"), NO_DEPS, Version::Unversioned, ModuleOptions::new());
        assert!(s.registry().contains("a"));
        assert_eq!(s.get_queue(), ["a"]);
    }

    #[test]
    fn test_dequeue_and_deregister() {
        let mut s = state();
        s.register("a", Some("/a.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        s.register("b", Some("/b.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        s.enqueue("a");
        s.enqueue("b");

        s.dequeue("a");
        assert_eq!(s.get_queue(), ["b"]);
        assert!(s.registry().contains("a"));

        s.deregister("b");
        assert!(s.get_queue().is_empty());
        assert!(!s.registry().contains("b"));
    }

    #[test]
    fn test_unknown_id_operations_are_noops() {
        let mut s = state();
        s.dequeue("ghost");
        s.deregister("ghost");
        assert!(!s.set_priority("ghost", "high"));
        assert!(!s.set_placement("ghost", "late"));
        assert!(s.registration_diagnostics().is_empty());
    }

    #[test]
    fn test_setters() {
        let mut s = state();
        s.register("a", Some("/a.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        assert!(s.set_priority("a", "high"));
        assert!(s.set_placement("a", "late"));
        let module = s.registry().get("a").unwrap();
        assert_eq!(module.priority, Priority::High);
        assert_eq!(module.placement, Placement::Late);

        assert!(s.set_priority("a", "bogus"));
        assert_eq!(s.registry().get("a").unwrap().priority, Priority::Auto);
        assert_eq!(s.registration_diagnostics().len(), 1);
    }

    #[test]
    fn test_check_dependencies() {
        let mut s = state();
        s.register("m", Some("/m.js"), ["ghost", "n"], Version::Ambient, ModuleOptions::new());
        s.register("n", Some("/n.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        assert_eq!(s.check_dependencies("m"), ["ghost"]);
    }

    #[test]
    fn test_effective_values_are_not_written_back() {
        let mut s = state();
        s.register("dep", Some("/dep.js"), NO_DEPS, Version::Ambient, ModuleOptions::new());
        s.register(
            "app",
            Some("/app.js"),
            ["dep"],
            Version::Ambient,
            ModuleOptions::new().with_priority(Priority::High),
        );
        s.enqueue("app");
        assert_eq!(s.effective_priority("dep"), Priority::High);
        assert_eq!(s.registry().get("dep").unwrap().priority, Priority::Auto);
    }
}
