//! Derived loading attributes.
//!
//! Two independent passes over the same edge set:
//! - **Placement**: dependency → dependent, every edge kind
//! - **Priority**: dependent → dependency, static edges only
//!
//! Neither pass writes back to the module records.

mod placement;
mod priority;

pub use placement::{effective_placement, late_modules, resolve_placements};
pub use priority::{effective_priority, resolve_priorities};
