//! Type dependency discovery for multi-module Java builds
//!
//! Resolves the names written in Java sources to fully-qualified symbols,
//! collects per-module dependency facts and merges them along the module
//! graph into one global dependency graph.

pub mod analysis;
pub mod build;
pub mod config;
pub mod diagnostic;
pub mod extractor;
pub mod graph;
pub mod parser;
pub mod semantic;
pub mod symbol;
pub mod syntax;

pub use analysis::{AnalysisEngine, BuildAnalysis};
pub use build::{BuildError, BuildGraph, Module, SourceFile};
pub use config::{Config, ConfigError};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use extractor::{Extractor, ExtractorRegistry};
pub use graph::{GlobalDependencyGraph, ModuleContext, ModuleResult};
pub use parser::{JavaParser, ParseError};
pub use symbol::{Symbol, SymbolError};
