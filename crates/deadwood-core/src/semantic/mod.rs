//! Semantic analysis module
//!
//! Provides the per-unit symbol table, name resolution and the unit analyzer.

pub mod analyzer;
pub mod imports;
pub mod resolver;
pub mod scope;
pub mod types;

pub use analyzer::{Target, UnitAnalysis, UnitAnalyzer, UnitError, UnresolvedReference};
pub use imports::ImportTable;
pub use resolver::{Inventory, ReferenceKind, Resolution, Resolver, RootNamespace, UnitContext};
pub use scope::{Scope, ScopeKind, ScopeStack};
pub use types::{AncestorIter, DeclaredType, TypeId, UnitTypes};
