//! Module graph
//!
//! Per-module fact collection, the merge operators that combine module
//! results, and the global graph they are folded into.

pub mod global;
pub mod merge;
pub mod merger;
pub mod module;

pub use global::GlobalDependencyGraph;
pub use merge::{
    Inheritance, IntermediateMap, IntermediateResult, IntermediateResults, IntermediateSet, Merge,
};
pub use merger::Merger;
pub use module::{Adjacency, ModuleContext, ModuleInventory, ModuleResult};
