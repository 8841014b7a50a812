//! Module context and module result
//!
//! A [`ModuleContext`] is owned by exactly one module pass and collects the
//! facts reported by extractors. Once every extractor has finished it is
//! sealed into an immutable [`ModuleResult`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::diagnostic::Diagnostic;
use crate::graph::merge::{Inheritance, IntermediateResult, IntermediateResults};
use crate::semantic::resolver::Inventory;
use crate::symbol::{Symbol, SymbolError};

pub type Adjacency = BTreeMap<Symbol, BTreeSet<Symbol>>;

#[derive(Debug)]
pub struct ModuleContext {
    name: String,
    inherited: Arc<Inheritance>,
    declared: BTreeSet<Symbol>,
    dependencies: Adjacency,
    intermediate: IntermediateResults,
    diagnostics: Vec<Diagnostic>,
    current_file: Option<PathBuf>,
}

impl ModuleContext {
    pub fn new(name: &str, inherited: Arc<Inheritance>) -> Self {
        Self {
            name: name.to_string(),
            inherited,
            declared: BTreeSet::new(),
            dependencies: Adjacency::new(),
            intermediate: IntermediateResults::new(),
            diagnostics: Vec::new(),
            current_file: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the following facts are attributed to in diagnostics.
    pub fn set_current_file(&mut self, file: Option<&Path>) {
        self.current_file = file.map(Path::to_path_buf);
    }

    /// Records a declared symbol. A malformed name is dropped with a diagnostic.
    pub fn add_declared_symbol(&mut self, symbol: &str) -> bool {
        match Symbol::parse(symbol) {
            Ok(symbol) => {
                self.declare(symbol);
                true
            }
            Err(e) => {
                self.malformed(&e);
                false
            }
        }
    }

    /// Records an edge. Malformed names drop the edge with a diagnostic.
    pub fn add_dependency(&mut self, depender: &str, dependee: &str) -> bool {
        match (Symbol::parse(depender), Symbol::parse(dependee)) {
            (Ok(depender), Ok(dependee)) => {
                self.depend(depender, dependee);
                true
            }
            (Err(e), _) | (_, Err(e)) => {
                self.malformed(&e);
                false
            }
        }
    }

    pub(crate) fn declare(&mut self, symbol: Symbol) {
        self.declared.insert(symbol);
    }

    pub(crate) fn depend(&mut self, depender: Symbol, dependee: Symbol) {
        self.dependencies.entry(depender).or_default().insert(dependee);
    }

    pub fn put_intermediate(&mut self, key: &str, result: IntermediateResult) {
        self.intermediate.put(key, result);
    }

    /// The result stored under `key` by the transitive dependencies, already merged.
    pub fn inherited_intermediate(&self, key: &str) -> Option<&IntermediateResult> {
        self.inherited.intermediate.get(key)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!(module = %self.name, "{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn malformed(&mut self, error: &SymbolError) {
        let mut diagnostic = Diagnostic::malformed_fact(&self.name, error.to_string());
        if let Some(file) = &self.current_file {
            diagnostic = diagnostic.with_file(file);
        }
        self.report(diagnostic);
    }

    pub fn declared(&self) -> &BTreeSet<Symbol> {
        &self.declared
    }

    /// Symbols analyzed in this module or any of its transitive dependencies.
    pub fn inventory(&self) -> ModuleInventory<'_> {
        ModuleInventory {
            own: &self.declared,
            inherited: &self.inherited,
        }
    }

    pub fn seal(self) -> ModuleResult {
        ModuleResult {
            name: self.name,
            declared: self.declared,
            dependencies: self.dependencies,
            intermediate: self.intermediate,
            diagnostics: self.diagnostics,
        }
    }
}

pub struct ModuleInventory<'a> {
    own: &'a BTreeSet<Symbol>,
    inherited: &'a Inheritance,
}

impl Inventory for ModuleInventory<'_> {
    fn contains(&self, symbol: &str) -> bool {
        self.own.contains(symbol) || self.inherited.symbols.contains(symbol)
    }
}

/// Sealed facts of one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleResult {
    pub name: String,
    pub declared: BTreeSet<Symbol>,
    pub dependencies: Adjacency,
    pub intermediate: IntermediateResults,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModuleResult {
    /// The part of this result that dependent modules inherit, before merging
    /// with what this module inherited itself.
    pub fn own_inheritance(&self) -> Inheritance {
        Inheritance {
            symbols: self.declared.iter().cloned().collect(),
            intermediate: self.intermediate.clone(),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }
}
