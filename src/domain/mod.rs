//! Domain types for modsched
//!
//! - Module: a registrable unit with an address, dependency edges and loading hints
//! - DependencyRef / ImportKind: static or dynamic edges between modules
//! - Priority / Placement / Version: declared loading hints

pub mod attrs;
pub mod module;

pub use attrs::{InvalidAttribute, Placement, Priority, Version};
pub use module::{DependencyRef, ImportKind, Module, ModuleOptions};
