//! Ordered, de-duplicated set of module ids marked for explicit output.
//!
//! The queue is independent of the registry: ids may be queued before they
//! are registered and are joined with the registry only at plan time.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    order: Vec<String>,
    members: HashSet<String>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` at the end unless already present. Returns true if added.
    pub fn push(&mut self, id: &str) -> bool {
        if !self.members.insert(id.to_string()) {
            return false;
        }
        self.order.push(id.to_string());
        true
    }

    /// Remove `id`, keeping the order of the survivors. Returns true if it was queued.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|queued| queued != id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
