//! Document placement propagation.
//!
//! Placement flows from a dependency to everything that needs it: if any
//! module a module pulls in (through any edge kind) is declared late, the
//! module itself must be emitted late. Queue membership plays no part.

use std::collections::{HashMap, HashSet};

use crate::domain::Placement;
use crate::graph::{EdgeFilter, Registry};

/// Effective placement of `id`. Unregistered ids are early.
pub fn effective_placement(registry: &Registry, id: &str) -> Placement {
    let Some(module) = registry.get(id) else {
        return Placement::Early;
    };
    if module.placement.is_late() {
        return Placement::Late;
    }

    let late_dependency = registry
        .get_recursive_dependencies(id, EdgeFilter::Any)
        .iter()
        .filter_map(|dep| registry.get(dep))
        .any(|dep| dep.placement.is_late());

    if late_dependency {
        Placement::Late
    } else {
        Placement::Early
    }
}

/// Every registered module that must be emitted late: the ones declared
/// late and everything depending on them through any edge kind.
pub fn late_modules(registry: &Registry) -> HashSet<&str> {
    let declared = registry
        .iter()
        .filter(|module| module.placement.is_late())
        .map(|module| module.id.as_str());
    registry.dependents_closure(declared, EdgeFilter::Any)
}

/// Effective placement for each of `ids`, from a single pass over the graph.
pub fn resolve_placements<'a, I>(registry: &Registry, ids: I) -> HashMap<String, Placement>
where
    I: IntoIterator<Item = &'a String>,
{
    let late = late_modules(registry);
    ids.into_iter()
        .map(|id| {
            let placement = if late.contains(id.as_str()) {
                Placement::Late
            } else {
                Placement::Early
            };
            (id.clone(), placement)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyRef, Module};

    fn add(registry: &mut Registry, id: &str, placement: Placement, deps: Vec<DependencyRef>) {
        let mut module = Module::new(id, Some(format!("/{}.js", id)));
        module.placement = placement;
        module.dependencies = deps;
        registry.insert(module);
    }

    #[test]
    fn test_declared_late() {
        let mut registry = Registry::new();
        add(&mut registry, "a", Placement::Late, vec![]);
        assert_eq!(effective_placement(&registry, "a"), Placement::Late);
    }

    #[test]
    fn test_late_propagates_through_chain() {
        let mut registry = Registry::new();
        add(&mut registry, "d", Placement::Late, vec![]);
        add(&mut registry, "c", Placement::Early, vec!["d".into()]);
        add(&mut registry, "b", Placement::Early, vec!["c".into()]);
        add(&mut registry, "a", Placement::Early, vec!["b".into()]);

        for id in ["a", "b", "c", "d"] {
            assert_eq!(effective_placement(&registry, id), Placement::Late, "{}", id);
        }
    }

    #[test]
    fn test_late_propagates_through_dynamic_edge() {
        let mut registry = Registry::new();
        add(&mut registry, "d", Placement::Late, vec![]);
        add(&mut registry, "c", Placement::Early, vec![DependencyRef::lazy("d")]);
        assert_eq!(effective_placement(&registry, "c"), Placement::Late);
    }

    #[test]
    fn test_late_does_not_flow_to_dependencies() {
        let mut registry = Registry::new();
        add(&mut registry, "dep", Placement::Early, vec![]);
        add(&mut registry, "app", Placement::Late, vec!["dep".into()]);
        assert_eq!(effective_placement(&registry, "dep"), Placement::Early);
    }

    #[test]
    fn test_unregistered_is_early() {
        let registry = Registry::new();
        assert_eq!(effective_placement(&registry, "ghost"), Placement::Early);
    }

    #[test]
    fn test_late_set_matches_per_module_placement() {
        let mut registry = Registry::new();
        add(&mut registry, "footer", Placement::Late, vec![]);
        add(&mut registry, "widget", Placement::Early, vec![DependencyRef::lazy("footer")]);
        add(&mut registry, "page", Placement::Early, vec!["widget".into(), "ghost".into()]);
        add(&mut registry, "core", Placement::Early, vec![]);
        add(&mut registry, "app", Placement::Early, vec!["core".into()]);

        let late = late_modules(&registry);
        for module in registry.iter() {
            assert_eq!(
                late.contains(module.id.as_str()),
                effective_placement(&registry, &module.id).is_late(),
                "{}",
                module.id
            );
        }
        assert_eq!(late.len(), 3);
    }

    #[test]
    fn test_resolve_placements_on_long_chain() {
        let mut registry = Registry::new();
        add(&mut registry, "m0", Placement::Late, vec![]);
        for i in 1..20_000 {
            add(&mut registry, &format!("m{}", i), Placement::Early, vec![format!("m{}", i - 1).into()]);
        }
        let ids: Vec<String> = registry.iter().map(|m| m.id.clone()).collect();
        let resolved = resolve_placements(&registry, &ids);
        assert!(resolved.values().all(|p| p.is_late()));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut registry = Registry::new();
        add(&mut registry, "a", Placement::Early, vec!["b".into()]);
        add(&mut registry, "b", Placement::Early, vec!["a".into(), "z".into()]);
        add(&mut registry, "z", Placement::Late, vec![]);
        assert_eq!(effective_placement(&registry, "a"), Placement::Late);

        let ids = vec!["a".to_string(), "z".to_string()];
        let resolved = resolve_placements(&registry, &ids);
        assert_eq!(resolved["a"], Placement::Late);
        assert_eq!(resolved.len(), 2);
    }
}
