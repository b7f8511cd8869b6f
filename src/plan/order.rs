//! Stable topological emission order.
//!
//! Depth-first post-order starting from each root in the order given,
//! following dependencies in declaration order. The result depends only on
//! root order and edge order, never on registration order, and every
//! dependency precedes its dependents except across a back edge.

use std::collections::{BTreeSet, HashSet};

use crate::diagnostics::Diagnostic;
use crate::domain::Module;
use crate::graph::Registry;

/// Result of ordering a set of roots.
#[derive(Debug, Clone, Default)]
pub struct Ordering {
    /// Every registered, non-skipped module reachable from the roots
    pub order: Vec<String>,
    /// One diagnostic per back edge found
    pub cycles: Vec<Diagnostic>,
}

struct Frame<'a> {
    module: &'a Module,
    next_edge: usize,
}

struct Walk<'a> {
    registry: &'a Registry,
    skip: &'a BTreeSet<String>,
    done: HashSet<&'a str>,
    on_path: HashSet<&'a str>,
    stack: Vec<Frame<'a>>,
    order: Vec<String>,
    cycles: Vec<Diagnostic>,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, root: &'a str) {
        self.enter(root);

        while let Some(frame) = self.stack.last_mut() {
            let module = frame.module;
            let edge = frame.next_edge;
            frame.next_edge += 1;

            match module.dependencies.get(edge) {
                Some(dep) => self.enter(dep.target_id.as_str()),
                None => {
                    self.stack.pop();
                    self.on_path.remove(module.id.as_str());
                    self.done.insert(module.id.as_str());
                    self.order.push(module.id.clone());
                }
            }
        }
    }

    /// Push a frame for `id` unless it is finished, unknown, skipped or
    /// already on the current path.
    fn enter(&mut self, id: &'a str) {
        if self.done.contains(id) {
            return;
        }
        if self.on_path.contains(id) {
            let pos = self.stack.iter().position(|f| f.module.id == id).unwrap_or(0);
            let mut ids: Vec<String> = self.stack[pos..].iter().map(|f| f.module.id.clone()).collect();
            ids.push(id.to_string());
            log::debug!("Back edge while ordering modules: {}", ids.join(" -> "));
            self.cycles.push(Diagnostic::Cycle { ids });
            return;
        }
        let Some(module) = self.registry.get(id) else {
            return;
        };
        if self.skip.contains(id) {
            return;
        }

        self.on_path.insert(module.id.as_str());
        self.stack.push(Frame { module, next_edge: 0 });
    }
}

/// Order every module reachable from `roots` (any edge kind), dependencies
/// first. Unregistered ids and ids in `skip` are left out.
pub fn topological_order<'a, I>(registry: &'a Registry, roots: I, skip: &'a BTreeSet<String>) -> Ordering
where
    I: IntoIterator<Item = &'a str>,
{
    let mut walk = Walk {
        registry,
        skip,
        done: HashSet::new(),
        on_path: HashSet::new(),
        stack: Vec::new(),
        order: Vec::new(),
        cycles: Vec::new(),
    };
    for root in roots {
        walk.visit(root);
    }
    Ordering {
        order: walk.order,
        cycles: walk.cycles,
    }
}
