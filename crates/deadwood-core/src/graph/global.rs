//! Global dependency graph
//!
//! The union of every module's facts, serialized as the JSON artifact the
//! reachability sweep consumes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::module::{Adjacency, ModuleResult};
use crate::symbol::Symbol;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDependencyGraph {
    pub analyzed: BTreeSet<Symbol>,
    pub dependencies: Adjacency,
}

impl GlobalDependencyGraph {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ModuleResult>) -> Self {
        let mut graph = Self::default();
        for result in results {
            graph.analyzed.extend(result.declared.iter().cloned());
            for (depender, dependees) in &result.dependencies {
                graph
                    .dependencies
                    .entry(depender.clone())
                    .or_default()
                    .extend(dependees.iter().cloned());
            }
        }
        graph
    }

    /// Drops dependees that are not analyzed symbols, and dependers left without edges.
    pub fn internal_only(&self) -> Self {
        let dependencies: BTreeMap<Symbol, BTreeSet<Symbol>> = self
            .dependencies
            .iter()
            .map(|(depender, dependees)| {
                let internal: BTreeSet<Symbol> = dependees
                    .iter()
                    .filter(|d| self.analyzed.contains(*d))
                    .cloned()
                    .collect();
                (depender.clone(), internal)
            })
            .filter(|(_, dependees)| !dependees.is_empty())
            .collect();

        Self {
            analyzed: self.analyzed.clone(),
            dependencies,
        }
    }

    pub fn dependees_of(&self, depender: &str) -> Option<&BTreeSet<Symbol>> {
        self.dependencies.get(depender)
    }

    pub fn has_edge(&self, depender: &str, dependee: &str) -> bool {
        self.dependees_of(depender)
            .is_some_and(|dependees| dependees.contains(dependee))
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
