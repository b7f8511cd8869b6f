//! Fetch priority propagation.
//!
//! Priority flows the opposite way to placement: from enqueued modules down
//! to what they statically import. Rules:
//! - Enqueued modules start from their own declared priority
//! - Each static edge carries the dependent's value to the dependency,
//!   keeping the highest (`high` > `auto` > `low`)
//! - Dynamic edges stop propagation
//! - A module that receives a propagated value takes it even when it is lower
//!   than its own declaration, unless it is itself enqueued
//! - Anything no enqueued module reaches statically keeps its declared value
//!
//! Values only ever rise within a three-level lattice, so the worklist reaches
//! a fixed point on any graph, cycles included.

use std::collections::HashMap;

use crate::domain::{ImportKind, Priority};
use crate::graph::Registry;

/// Effective priorities for every module in the static closure of `queue`.
///
/// Queued ids that are not registered are ignored.
pub fn resolve_priorities(registry: &Registry, queue: &[String]) -> HashMap<String, Priority> {
    let mut values: HashMap<&str, Priority> = HashMap::new();
    let mut worklist: Vec<&str> = Vec::new();

    for id in queue {
        if let Some(module) = registry.get(id) {
            values.insert(module.id.as_str(), module.priority);
            worklist.push(module.id.as_str());
        }
    }

    while let Some(current) = worklist.pop() {
        let Some(carried) = values.get(current).copied() else {
            continue;
        };
        let Some(module) = registry.get(current) else {
            continue;
        };

        for dep in module.dependencies_of_kind(ImportKind::Static) {
            let Some(target) = registry.get(&dep.target_id) else {
                continue;
            };
            let raised = match values.get(target.id.as_str()) {
                Some(existing) if *existing >= carried => false,
                _ => true,
            };
            if raised {
                values.insert(target.id.as_str(), carried);
                worklist.push(target.id.as_str());
            }
        }
    }

    values.into_iter().map(|(id, p)| (id.to_string(), p)).collect()
}

/// Effective priority of `id` given the current queue.
pub fn effective_priority(registry: &Registry, queue: &[String], id: &str) -> Priority {
    resolve_priorities(registry, queue)
        .get(id)
        .copied()
        .or_else(|| registry.get(id).map(|m| m.priority))
        .unwrap_or_default()
}
