//! Build graph
//!
//! The modules of a build and their ordered dependency lists. The order of
//! a module's dependencies is significant: it decides sibling precedence when
//! their results are merged.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("module '{name}' is declared more than once")]
    DuplicateModule { name: String },
    #[error("module '{module}' depends on unknown module '{dependency}'")]
    UnknownDependency { module: String, dependency: String },
    #[error("module dependencies form a cycle through '{module}'")]
    Cycle { module: String },
}

/// A candidate file of a module, on disk or held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    Path(PathBuf),
    Inline { path: PathBuf, text: String },
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        match self {
            SourceFile::Path(path) | SourceFile::Inline { path, .. } => path,
        }
    }

    pub fn is_java(&self) -> bool {
        self.path().extension().is_some_and(|ext| ext == "java")
    }

    pub fn read(&self) -> std::io::Result<Cow<'_, str>> {
        match self {
            SourceFile::Path(path) => std::fs::read_to_string(path).map(Cow::Owned),
            SourceFile::Inline { text, .. } => Ok(Cow::Borrowed(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub sources: Vec<SourceFile>,
    pub dependencies: Vec<String>,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sources: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(SourceFile::Path(path.into()));
        self
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>, text: &str) -> Self {
        self.sources.push(SourceFile::Inline {
            path: path.into(),
            text: text.to_string(),
        });
        self
    }

    pub fn with_dependency(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct BuildGraph {
    modules: Vec<Module>,
    order: Vec<usize>,
}

impl BuildGraph {
    /// Validates module names and dependencies and computes a topological order.
    pub fn new(modules: Vec<Module>) -> Result<Self, BuildError> {
        let mut index = HashMap::new();
        for (i, module) in modules.iter().enumerate() {
            if index.insert(module.name.clone(), i).is_some() {
                return Err(BuildError::DuplicateModule {
                    name: module.name.clone(),
                });
            }
        }

        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..modules.len()).map(|i| graph.add_node(i)).collect();
        for (i, module) in modules.iter().enumerate() {
            for dependency in &module.dependencies {
                let Some(&dep) = index.get(dependency) else {
                    return Err(BuildError::UnknownDependency {
                        module: module.name.clone(),
                        dependency: dependency.clone(),
                    });
                };
                graph.add_edge(nodes[dep], nodes[i], ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| BuildError::Cycle {
                module: modules[graph[cycle.node_id()]].name.clone(),
            })?
            .into_iter()
            .map(|node| graph[node])
            .collect();

        Ok(Self { modules, order })
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Every module after all of its dependencies.
    pub fn topological_order(&self) -> impl Iterator<Item = &Module> {
        self.order.iter().map(|&i| &self.modules[i])
    }

    /// Modules grouped so each group depends only on earlier groups.
    /// Within a group modules keep their declaration order.
    pub fn waves(&self) -> Vec<Vec<&Module>> {
        let mut level: HashMap<&str, usize> = HashMap::new();
        for module in self.topological_order() {
            let depth = module
                .dependencies
                .iter()
                .filter_map(|d| level.get(d.as_str()))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level.insert(&module.name, depth);
        }

        let count = level.values().max().map_or(0, |max| max + 1);
        let mut waves: Vec<Vec<&Module>> = vec![Vec::new(); count];
        for module in &self.modules {
            if let Some(&l) = level.get(module.name.as_str()) {
                waves[l].push(module);
            }
        }
        waves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(modules: &[&Module]) -> Vec<String> {
        modules.iter().map(|m| m.name.clone()).collect()
    }

    #[test]
    fn orders_dependencies_first() {
        let graph = BuildGraph::new(vec![
            Module::new("app").with_dependency("lib").with_dependency("core"),
            Module::new("lib").with_dependency("core"),
            Module::new("core"),
        ])
        .expect("valid build");

        let order: Vec<&str> = graph.topological_order().map(|m| m.name.as_str()).collect();
        let position = |name: &str| order.iter().position(|n| *n == name).expect("present");
        assert!(position("core") < position("lib"));
        assert!(position("lib") < position("app"));
    }

    #[test]
    fn waves_group_independent_modules() {
        let graph = BuildGraph::new(vec![
            Module::new("d").with_dependency("b").with_dependency("c"),
            Module::new("b").with_dependency("a"),
            Module::new("c").with_dependency("a"),
            Module::new("a"),
        ])
        .expect("valid build");

        let waves: Vec<Vec<String>> = graph.waves().iter().map(|w| names(w)).collect();
        assert_eq!(
            waves,
            vec![
                vec!["a".to_string()],
                vec!["b".to_string(), "c".to_string()],
                vec!["d".to_string()]
            ]
        );
    }

    #[test]
    fn rejects_duplicate_modules() {
        let err = BuildGraph::new(vec![Module::new("core"), Module::new("core")])
            .expect_err("duplicate");
        assert_eq!(
            err,
            BuildError::DuplicateModule {
                name: "core".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_dependencies() {
        let err = BuildGraph::new(vec![Module::new("app").with_dependency("missing")])
            .expect_err("unknown");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn rejects_cycles() {
        let err = BuildGraph::new(vec![
            Module::new("a").with_dependency("b"),
            Module::new("b").with_dependency("a"),
        ])
        .expect_err("cycle");
        assert!(matches!(err, BuildError::Cycle { .. }));
    }

    #[test]
    fn inline_sources_are_read_without_disk() {
        let module = Module::new("core").with_source("src/A.java", "class A {}");
        let source = &module.sources[0];

        assert!(source.is_java());
        assert_eq!(source.read().expect("readable"), "class A {}");
        assert_eq!(source.path(), Path::new("src/A.java"));
    }
}
