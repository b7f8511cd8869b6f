//! Emission planning.
//!
//! A plan is rebuilt from the registry and queue on every call:
//! 1. Modules with unregistered dependencies are excluded, along with
//!    everything that depends on them
//! 2. The surviving closure of the queue is put in topological order
//! 3. Effective priority and placement are resolved
//! 4. Each module lands in the outputs it qualifies for:
//!    - load tag: enqueued
//!    - preload: reached through static edges, not enqueued
//!    - resolution table: a (static or dynamic) dependency of a queued module
//!
//! Modules without an address keep their place in the graph but produce no
//! load tag, preload or table entry.

mod entries;
mod order;

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::address::AddressComposer;
use crate::diagnostics::Diagnostic;
use crate::domain::{ImportKind, Placement};
use crate::graph::{EdgeFilter, Registry};
use crate::queue::Queue;
use crate::resolve::{resolve_placements, resolve_priorities};

pub use entries::{DataEntry, LoadTag, PreloadEntry, TableEntry};
pub use order::{Ordering, topological_order};

/// Split of the queue into modules that can be emitted and those that cannot.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    /// Queued ids that are registered and not excluded, queue order
    pub active_queue: Vec<String>,
    /// Modules left out of every output this pass
    pub excluded: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Find modules reachable from the queue that cannot be emitted.
///
/// A module is excluded when one of its dependency ids is unregistered, or
/// when it depends (through any edge kind) on an excluded module.
pub fn partition_queue(registry: &Registry, queue: &Queue) -> Exclusions {
    let mut diagnostics = Vec::new();

    for id in queue.ids().iter().filter(|id| !registry.contains(id)) {
        log::debug!("Module '{}' is enqueued but not registered", id);
        diagnostics.push(Diagnostic::UnregisteredEnqueue { id: id.clone() });
    }

    let reach = registry.reachable(queue.ids().iter().map(String::as_str), EdgeFilter::Any);

    let mut direct: Vec<&str> = Vec::new();
    for id in &reach {
        let missing = registry.missing_dependencies(id);
        if missing.is_empty() {
            continue;
        }
        let diagnostic = Diagnostic::MissingDependencies {
            id: id.to_string(),
            missing,
        };
        log::warn!("{}", diagnostic);
        diagnostics.push(diagnostic);
        direct.push(*id);
    }

    let mut excluded = BTreeSet::new();
    if !direct.is_empty() {
        let blocked = registry.dependents_closure(direct.iter().copied(), EdgeFilter::Any);
        for id in reach.iter().filter(|id| blocked.contains(**id)) {
            if !direct.contains(id) {
                log::debug!("Module '{}' depends on an excluded module and will not be emitted", id);
            }
            excluded.insert(id.to_string());
        }
    }

    let active_queue = queue
        .ids()
        .iter()
        .filter(|id| registry.contains(id) && !excluded.contains(*id))
        .cloned()
        .collect();

    Exclusions {
        active_queue,
        excluded,
        diagnostics,
    }
}

/// Everything the output writer needs for one render pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmissionPlan {
    /// Topological order of every emitted-or-participating module
    pub order: Vec<String>,
    pub excluded: BTreeSet<String>,
    pub load_tags: Vec<LoadTag>,
    pub preloads: Vec<PreloadEntry>,
    pub resolution_table: Vec<TableEntry>,
    pub module_data: Vec<DataEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EmissionPlan {
    /// Load tags whose effective placement is `placement`, in emission order.
    pub fn load_tags_for(&self, placement: Placement) -> Vec<LoadTag> {
        self.load_tags
            .iter()
            .filter(|tag| tag.placement == placement)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.load_tags.is_empty() && self.preloads.is_empty() && self.resolution_table.is_empty()
    }
}

/// Builds an [`EmissionPlan`] from borrowed scheduler state.
pub struct Planner<'a> {
    registry: &'a Registry,
    queue: &'a Queue,
    composer: &'a dyn AddressComposer,
    module_data: &'a HashMap<String, serde_json::Value>,
}

impl<'a> Planner<'a> {
    pub fn new(
        registry: &'a Registry,
        queue: &'a Queue,
        composer: &'a dyn AddressComposer,
        module_data: &'a HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            registry,
            queue,
            composer,
            module_data,
        }
    }

    pub fn build(&self) -> EmissionPlan {
        let Exclusions {
            active_queue,
            excluded,
            mut diagnostics,
        } = partition_queue(self.registry, self.queue);

        let ordering = topological_order(self.registry, active_queue.iter().map(String::as_str), &excluded);
        diagnostics.extend(ordering.cycles);

        let priorities = resolve_priorities(self.registry, &active_queue);
        let queued: HashSet<&str> = active_queue.iter().map(String::as_str).collect();

        let roots = || active_queue.iter().map(String::as_str);
        let static_closure: HashSet<&str> = self
            .registry
            .dependency_closure(roots(), EdgeFilter::Only(ImportKind::Static))
            .into_iter()
            .collect();
        let dependency_closure: HashSet<&str> = self
            .registry
            .dependency_closure(roots(), EdgeFilter::Any)
            .into_iter()
            .collect();
        let placements = resolve_placements(self.registry, &ordering.order);

        let mut plan = EmissionPlan {
            excluded,
            ..Default::default()
        };

        for id in &ordering.order {
            let Some(module) = self.registry.get(id) else {
                continue;
            };
            let is_queued = queued.contains(id.as_str());
            let placement = placements.get(id).copied().unwrap_or_default();
            let priority = priorities.get(id).copied().unwrap_or(module.priority);
            let address = module
                .address
                .as_deref()
                .map(|raw| self.composer.compose(id, raw, &module.version));

            if is_queued && !module.has_address() {
                log::debug!("Module '{}' has no address; no load tag emitted", id);
            }

            if let Some(src) = &address
                && is_queued
            {
                plan.load_tags.push(LoadTag {
                    id: id.clone(),
                    src: src.clone(),
                    priority,
                    declared_priority: module.priority,
                    placement,
                    static_dependencies: module
                        .dependencies_of_kind(ImportKind::Static)
                        .map(|d| d.target_id.clone())
                        .collect(),
                    dynamic_dependencies: module
                        .dependencies_of_kind(ImportKind::Dynamic)
                        .map(|d| d.target_id.clone())
                        .collect(),
                });
            }

            if let Some(href) = &address
                && !is_queued
                && static_closure.contains(id.as_str())
            {
                plan.preloads.push(PreloadEntry {
                    id: id.clone(),
                    href: href.clone(),
                    priority,
                    declared_priority: module.priority,
                    placement,
                });
            }

            if let Some(address) = &address
                && dependency_closure.contains(id.as_str())
            {
                plan.resolution_table.push(TableEntry {
                    id: id.clone(),
                    address: address.clone(),
                });
            }

            if let Some(data) = self.module_data.get(id)
                && has_content(data)
            {
                plan.module_data.push(DataEntry {
                    id: id.clone(),
                    data: data.clone(),
                });
            }
        }

        plan.order = ordering.order;
        plan.diagnostics = diagnostics;
        plan
    }
}

fn has_content(data: &serde_json::Value) -> bool {
    match data {
        serde_json::Value::Null => false,
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::VersionQueryComposer;
    use crate::domain::{DependencyRef, Module, Priority, Version};

    fn add(registry: &mut Registry, id: &str, deps: Vec<DependencyRef>) {
        let mut module = Module::new(id, Some(format!("/{}.js", id)));
        module.dependencies = deps;
        module.version = Version::Unversioned;
        registry.insert(module);
    }

    fn build(registry: &Registry, queue: &Queue) -> EmissionPlan {
        let composer = VersionQueryComposer::default();
        let data = HashMap::new();
        Planner::new(registry, queue, &composer, &data).build()
    }

    fn ids<T, F: Fn(&T) -> &str>(items: &[T], f: F) -> Vec<String> {
        items.iter().map(|item| f(item).to_string()).collect()
    }

    #[test]
    fn test_outputs_partition() {
        // app -> ui -> core, app ~> lazy -> util
        let mut registry = Registry::new();
        add(&mut registry, "core", vec![]);
        add(&mut registry, "util", vec![]);
        add(&mut registry, "ui", vec!["core".into()]);
        add(&mut registry, "lazy", vec!["util".into()]);
        add(&mut registry, "app", vec!["ui".into(), DependencyRef::lazy("lazy")]);

        let mut queue = Queue::new();
        queue.push("app");
        let plan = build(&registry, &queue);

        assert_eq!(plan.order, ["core", "ui", "util", "lazy", "app"]);
        assert_eq!(ids(&plan.load_tags, |t| t.id.as_str()), ["app"]);
        assert_eq!(ids(&plan.preloads, |p| p.id.as_str()), ["core", "ui"]);
        assert_eq!(ids(&plan.resolution_table, |e| e.id.as_str()), ["core", "ui", "util", "lazy"]);
        assert_eq!(plan.load_tags[0].static_dependencies, ["ui"]);
        assert_eq!(plan.load_tags[0].dynamic_dependencies, ["lazy"]);
    }

    #[test]
    fn test_enqueued_dependency_stays_in_table() {
        let mut registry = Registry::new();
        add(&mut registry, "lib", vec![]);
        add(&mut registry, "app", vec!["lib".into()]);

        let mut queue = Queue::new();
        queue.push("app");
        queue.push("lib");
        let plan = build(&registry, &queue);

        assert_eq!(ids(&plan.load_tags, |t| t.id.as_str()), ["lib", "app"]);
        assert!(plan.preloads.is_empty());
        assert_eq!(ids(&plan.resolution_table, |e| e.id.as_str()), ["lib"]);
    }

    #[test]
    fn test_missing_dependency_excludes_dependents() {
        let mut registry = Registry::new();
        add(&mut registry, "m", vec!["ghost".into()]);
        add(&mut registry, "top", vec!["m".into()]);
        add(&mut registry, "n", vec![]);

        let mut queue = Queue::new();
        queue.push("top");
        queue.push("n");
        let plan = build(&registry, &queue);

        assert_eq!(ids(&plan.load_tags, |t| t.id.as_str()), ["n"]);
        assert!(plan.excluded.contains("m"));
        assert!(plan.excluded.contains("top"));
        assert_eq!(
            plan.diagnostics,
            vec![Diagnostic::MissingDependencies {
                id: "m".to_string(),
                missing: vec!["ghost".to_string()],
            }]
        );
    }

    #[test]
    fn test_addressless_module_participates() {
        let mut registry = Registry::new();
        add(&mut registry, "leaf", vec![]);
        registry.insert({
            let mut agg = Module::new("agg", None);
            agg.dependencies = vec!["leaf".into()];
            agg.priority = Priority::High;
            agg
        });

        let mut queue = Queue::new();
        queue.push("agg");
        let plan = build(&registry, &queue);

        assert!(plan.load_tags.is_empty());
        assert_eq!(ids(&plan.preloads, |p| p.id.as_str()), ["leaf"]);
        assert_eq!(plan.preloads[0].priority, Priority::High);
    }

    #[test]
    fn test_module_data_only_for_planned_modules() {
        let mut registry = Registry::new();
        add(&mut registry, "a", vec![]);
        add(&mut registry, "b", vec![]);
        let mut queue = Queue::new();
        queue.push("a");

        let mut data = HashMap::new();
        data.insert("a".to_string(), serde_json::json!({ "nonce": "x" }));
        data.insert("b".to_string(), serde_json::json!({ "nonce": "y" }));
        let composer = VersionQueryComposer::default();
        let plan = Planner::new(&registry, &queue, &composer, &data).build();

        assert_eq!(ids(&plan.module_data, |d| d.id.as_str()), ["a"]);
    }

    #[test]
    fn test_plan_is_empty_when_nothing_can_be_emitted() {
        let mut registry = Registry::new();
        add(&mut registry, "m", vec!["ghost".into()]);
        registry.insert(Module::new("bare", None));

        let mut queue = Queue::new();
        assert!(build(&registry, &queue).is_empty());

        queue.push("m");
        queue.push("bare");
        let plan = build(&registry, &queue);
        assert!(plan.is_empty());
        assert_eq!(plan.order, ["bare"]);
    }

    #[test]
    fn test_long_chain_plan() {
        let mut registry = Registry::new();
        registry.insert({
            let mut bottom = Module::new("m0", Some("/m0.js".to_string()));
            bottom.placement = Placement::Late;
            bottom.version = Version::Unversioned;
            bottom
        });
        for i in 1..20_000 {
            add(&mut registry, &format!("m{}", i), vec![format!("m{}", i - 1).into()]);
        }

        let mut queue = Queue::new();
        queue.push("m19999");
        let plan = build(&registry, &queue);

        assert_eq!(plan.order.len(), 20_000);
        assert_eq!(plan.load_tags.len(), 1);
        assert_eq!(plan.load_tags[0].placement, Placement::Late);
        assert_eq!(plan.preloads.len(), 19_999);
        assert!(plan.preloads.iter().all(|p| p.placement == Placement::Late));
        assert_eq!(plan.resolution_table.len(), 19_999);
    }

    #[test]
    fn test_missing_dependency_at_chain_bottom_blocks_whole_chain() {
        let mut registry = Registry::new();
        add(&mut registry, "m0", vec!["ghost".into()]);
        for i in 1..5_000 {
            add(&mut registry, &format!("m{}", i), vec![format!("m{}", i - 1).into()]);
        }
        add(&mut registry, "solo", vec![]);

        let mut queue = Queue::new();
        queue.push("m4999");
        queue.push("solo");
        let plan = build(&registry, &queue);

        assert_eq!(plan.excluded.len(), 5_000);
        assert_eq!(ids(&plan.load_tags, |t| t.id.as_str()), ["solo"]);
        assert_eq!(plan.diagnostics.len(), 1);
    }

    #[test]
    fn test_empty_data_skipped() {
        assert!(!has_content(&serde_json::json!({})));
        assert!(!has_content(&serde_json::Value::Null));
        assert!(has_content(&serde_json::json!({ "k": 1 })));
    }
}
