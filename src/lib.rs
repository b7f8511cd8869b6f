//! modsched - dependency-aware scheduling of loadable modules
//!
//! Given registered modules and the subset enqueued for output, modsched
//! decides which modules get load tags, which are preloaded, what goes in the
//! resolution table, and the effective fetch priority and placement of each,
//! all derived from the dependency graph.

pub mod address;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod plan;
pub mod queue;
pub mod render;
pub mod resolve;
pub mod scheduler;

pub use error::{ModschedError, Result};
pub use scheduler::SchedulerState;
