//! Graph store: the registered-module table and edge queries.
//!
//! Forward edges live on the module records. Reverse edges are computed on
//! demand because every plan is rebuilt from scratch.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::domain::{DependencyRef, ImportKind, Module};

/// Which edge kinds a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter {
    Any,
    Only(ImportKind),
}

impl EdgeFilter {
    pub fn accepts(&self, dep: &DependencyRef) -> bool {
        match self {
            EdgeFilter::Any => true,
            EdgeFilter::Only(kind) => dep.import_kind == *kind,
        }
    }
}

/// Registered modules, kept in first-registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    order: Vec<String>,
    modules: HashMap<String, Module>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a module. An overwrite keeps the original slot.
    /// Returns true if an existing record was replaced.
    pub fn insert(&mut self, module: Module) -> bool {
        let id = module.id.clone();
        let replaced = self.modules.insert(id.clone(), module).is_some();
        if !replaced {
            self.order.push(id);
        }
        replaced
    }

    pub fn remove(&mut self, id: &str) -> Option<Module> {
        let removed = self.modules.remove(id)?;
        self.order.retain(|registered| registered != id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Modules in first-registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    /// Outgoing edges of `id` in declaration order; empty for unknown ids.
    pub fn get_dependencies(&self, id: &str) -> &[DependencyRef] {
        self.modules.get(id).map_or(&[], |m| m.dependencies.as_slice())
    }

    /// Registered modules with an edge to `id` accepted by `filter` (one hop).
    pub fn get_dependents(&self, id: &str, filter: EdgeFilter) -> BTreeSet<String> {
        self.iter()
            .filter(|m| m.dependencies.iter().any(|d| d.target_id == id && filter.accepts(d)))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Every module that transitively depends on `id` through edges accepted
    /// by `filter`. `id` itself is only included when it sits on a cycle.
    pub fn get_recursive_dependents(&self, id: &str, filter: EdgeFilter) -> BTreeSet<String> {
        let reverse = self.reverse_edges(filter);
        let mut out = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for dependent in reverse.get(current).into_iter().flatten() {
                if out.insert(dependent.to_string()) {
                    queue.push_back(*dependent);
                }
            }
        }

        out
    }

    /// Every registered module reachable from `id` through edges accepted by
    /// `filter`, in depth-first discovery order. Unregistered targets are
    /// skipped.
    pub fn get_recursive_dependencies(&self, id: &str, filter: EdgeFilter) -> Vec<String> {
        let mut visited = HashSet::from([id.to_string()]);
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self
            .get_dependencies(id)
            .iter()
            .rev()
            .filter(|d| filter.accepts(d))
            .map(|d| d.target_id.as_str())
            .collect();

        while let Some(current) = stack.pop() {
            if !self.contains(current) || !visited.insert(current.to_string()) {
                continue;
            }
            out.push(current.to_string());
            for dep in self.get_dependencies(current).iter().rev() {
                if filter.accepts(dep) {
                    stack.push(&dep.target_id);
                }
            }
        }

        out
    }

    /// `roots` and every registered module reachable from them through edges
    /// accepted by `filter`, in depth-first discovery order, each root before
    /// the modules it pulls in. Unregistered roots are skipped.
    pub fn reachable<'a, 'r, I>(&'a self, roots: I, filter: EdgeFilter) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'r str>,
    {
        self.walk(roots, filter, true)
    }

    /// Registered modules reachable from any of `roots` through at least one
    /// edge accepted by `filter`, in depth-first discovery order. A root only
    /// appears when some root (itself included) reaches it.
    pub fn dependency_closure<'a, 'r, I>(&'a self, roots: I, filter: EdgeFilter) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'r str>,
    {
        self.walk(roots, filter, false)
    }

    /// `seeds` plus every module that transitively depends on one of them
    /// through edges accepted by `filter`.
    pub fn dependents_closure<'a, I>(&'a self, seeds: I, filter: EdgeFilter) -> HashSet<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let reverse = self.reverse_edges(filter);
        let mut out: HashSet<&'a str> = HashSet::new();
        let mut queue: VecDeque<&'a str> = VecDeque::new();
        for seed in seeds {
            if out.insert(seed) {
                queue.push_back(seed);
            }
        }

        while let Some(current) = queue.pop_front() {
            for dependent in reverse.get(current).into_iter().flatten() {
                if out.insert(*dependent) {
                    queue.push_back(*dependent);
                }
            }
        }

        out
    }

    fn walk<'a, 'r, I>(&'a self, roots: I, filter: EdgeFilter, include_roots: bool) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'r str>,
    {
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut out = Vec::new();

        for root in roots {
            let mut stack: Vec<&str> = if include_roots {
                vec![root]
            } else {
                self.get_dependencies(root)
                    .iter()
                    .rev()
                    .filter(|d| filter.accepts(d))
                    .map(|d| d.target_id.as_str())
                    .collect()
            };

            while let Some(current) = stack.pop() {
                let Some(module) = self.modules.get(current) else {
                    continue;
                };
                if !visited.insert(module.id.as_str()) {
                    continue;
                }
                out.push(module.id.as_str());
                for dep in module.dependencies.iter().rev() {
                    if filter.accepts(dep) {
                        stack.push(&dep.target_id);
                    }
                }
            }
        }

        out
    }

    /// Dependency ids of `id` that are not registered, in declaration order.
    pub fn missing_dependencies(&self, id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.get_dependencies(id)
            .iter()
            .filter(|d| !self.contains(&d.target_id))
            .filter(|d| seen.insert(d.target_id.as_str()))
            .map(|d| d.target_id.clone())
            .collect()
    }

    /// `dependency -> dependents` for edges accepted by `filter`.
    pub(crate) fn reverse_edges(&self, filter: EdgeFilter) -> HashMap<&str, Vec<&str>> {
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
        for module in self.iter() {
            for dep in module.dependencies.iter().filter(|d| filter.accepts(d)) {
                reverse.entry(dep.target_id.as_str()).or_default().push(module.id.as_str());
            }
        }
        reverse
    }
}
