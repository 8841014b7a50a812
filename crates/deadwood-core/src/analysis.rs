//! Analysis engine for Java builds
//!
//! Drives every module of a build through parsing, unit analysis, extractor
//! passes and finalization, in topological waves, and folds the sealed
//! module results into the global dependency graph.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::build::{BuildGraph, Module, SourceFile};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::extractor::ExtractorRegistry;
use crate::graph::global::GlobalDependencyGraph;
use crate::graph::merge::Inheritance;
use crate::graph::merger::Merger;
use crate::graph::module::{ModuleContext, ModuleResult};
use crate::parser::JavaParser;
use crate::semantic::analyzer::{UnitAnalysis, UnitAnalyzer};
use crate::semantic::resolver::RootNamespace;
use crate::symbol::Symbol;

/// Results of analyzing a whole build.
#[derive(Debug, Clone)]
pub struct BuildAnalysis {
    /// Module results in topological order.
    pub modules: Vec<ModuleResult>,
    pub graph: GlobalDependencyGraph,
}

impl BuildAnalysis {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.modules.iter().flat_map(|m| m.diagnostics.iter())
    }

    pub fn has_parse_failures(&self) -> bool {
        self.diagnostics()
            .any(|d| d.kind == DiagnosticKind::ParseFailure)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleResult> {
        self.modules.iter().find(|m| m.name == name)
    }
}

#[derive(Debug)]
pub struct AnalysisEngine {
    parser: JavaParser,
    analyzer: UnitAnalyzer,
    root: Option<RootNamespace>,
    extractors: ExtractorRegistry,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            parser: JavaParser::new(),
            analyzer: UnitAnalyzer::new(),
            root: Some(RootNamespace::java_lang()),
            extractors: ExtractorRegistry::new(),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let mut parser = JavaParser::new().with_max_depth(config.analysis.max_depth);
        if let Some(timeout) = config.analysis.parse_timeout() {
            parser = parser.with_timeout(timeout);
        }

        Self {
            parser,
            analyzer: UnitAnalyzer::new().with_max_depth(config.analysis.max_depth),
            root: Some(config.resolver.root()),
            extractors: ExtractorRegistry::new(),
        }
    }

    pub fn with_parser(mut self, parser: JavaParser) -> Self {
        self.parser = parser;
        self
    }

    /// Disables the root-namespace fallback.
    pub fn without_root(mut self) -> Self {
        self.root = None;
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    pub fn analyze(&self, build: &BuildGraph) -> BuildAnalysis {
        let mut merger = Merger::new();
        let mut modules = Vec::with_capacity(build.len());

        for (index, wave) in build.waves().into_iter().enumerate() {
            debug!(wave = index, modules = wave.len(), "analyzing wave");

            let sealed: Vec<(ModuleResult, Arc<Inheritance>)> = wave
                .par_iter()
                .map(|module| {
                    let inherited = Arc::new(merger.inherited(&module.dependencies));
                    let result = self.analyze_module(module, Arc::clone(&inherited));
                    (result, inherited)
                })
                .collect();

            for (result, inherited) in sealed {
                merger.store(&result, &inherited);
                modules.push(result);
            }
        }

        let graph = GlobalDependencyGraph::from_results(&modules);
        info!(
            modules = modules.len(),
            analyzed = graph.analyzed.len(),
            edges = graph.edge_count(),
            "build analyzed"
        );

        BuildAnalysis { modules, graph }
    }

    /// Analyzes one module given what it inherits from its dependencies.
    pub fn analyze_module(&self, module: &Module, inherited: Arc<Inheritance>) -> ModuleResult {
        let mut ctx = ModuleContext::new(&module.name, inherited);
        let mut extractors = self.extractors.instantiate();

        let outcomes: Vec<Result<UnitAnalysis, Diagnostic>> = module
            .sources
            .par_iter()
            .filter(|source| source.is_java())
            .map(|source| self.analyze_unit(&module.name, source))
            .collect();

        let mut units = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(unit) => {
                    for symbol in unit.declared() {
                        ctx.declare(symbol.clone());
                    }
                    units.push(unit);
                }
                Err(diagnostic) => ctx.report(diagnostic),
            }
        }

        for source in &module.sources {
            ctx.set_current_file(Some(source.path()));
            for extractor in &mut extractors {
                extractor.on_file(&mut ctx, source);
            }
        }
        ctx.set_current_file(None);

        let edges: Vec<(Symbol, Symbol)> = {
            let inventory = ctx.inventory();
            let root = self.root.as_ref();
            units
                .par_iter()
                .flat_map_iter(|unit| unit.resolve(&inventory, root))
                .collect()
        };
        for (depender, dependee) in edges {
            ctx.depend(depender, dependee);
        }

        for extractor in &mut extractors {
            debug!(module = %module.name, extractor = extractor.name(), "completing extractor");
            extractor.on_analysis_complete(&mut ctx);
        }

        let result = ctx.seal();
        info!(
            module = %result.name,
            units = units.len(),
            declared = result.declared.len(),
            edges = result.edge_count(),
            diagnostics = result.diagnostics.len(),
            "module analyzed"
        );
        result
    }

    fn analyze_unit(&self, module: &str, source: &SourceFile) -> Result<UnitAnalysis, Diagnostic> {
        let path = source.path();
        let text = source
            .read()
            .map_err(|e| Diagnostic::parse_failure(module, path, format!("unreadable: {e}")))?;

        let unit = self.parser.parse(&text).map_err(|e| {
            Diagnostic::parse_failure(module, path, e.message.clone()).with_line(e.line)
        })?;

        let analysis = self
            .analyzer
            .analyze(&unit)
            .map_err(|e| Diagnostic::parse_failure(module, path, e.to_string()))?;

        debug!(
            file = %path.display(),
            types = unit.type_count(),
            pending = analysis.pending.len(),
            "unit analyzed"
        );
        Ok(analysis)
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::build::Module;
    use crate::config::AnalysisConfig;
    use crate::extractor::Extractor;
    use crate::graph::merge::{IntermediateResult, IntermediateSet};

    fn build(modules: Vec<Module>) -> BuildGraph {
        BuildGraph::new(modules).expect("valid build")
    }

    #[test]
    fn imported_type_becomes_an_edge() {
        let graph = build(vec![Module::new("core").with_source(
            "src/com/example/Panel.java",
            "package com.example;\n\
             import com.acme.Widget;\n\
             class Panel { Widget widget; }",
        )]);

        let analysis = AnalysisEngine::new().analyze(&graph);

        assert!(analysis.graph.has_edge("com.example.Panel", "com.acme.Widget"));
        assert!(analysis.graph.analyzed.contains("com.example.Panel"));
    }

    #[test]
    fn syntax_errors_become_diagnostics() {
        let graph = build(vec![
            Module::new("core")
                .with_source("src/Broken.java", "class Broken { void m( { }")
                .with_source("src/Fine.java", "class Fine { Broken b; }"),
        ]);

        let analysis = AnalysisEngine::new().analyze(&graph);
        let core = analysis.module("core").expect("module present");

        assert!(analysis.has_parse_failures());
        assert_eq!(core.diagnostics.len(), 1);
        assert_eq!(
            core.diagnostics[0].file.as_deref(),
            Some(std::path::Path::new("src/Broken.java"))
        );
        assert!(!core.declared.contains("Broken"));
        assert!(core.declared.contains("Fine"));
        assert!(analysis.graph.dependees_of("Fine").is_none());
    }

    #[test]
    fn unreadable_files_become_diagnostics() {
        let graph = build(vec![
            Module::new("core").with_file("/nonexistent/deadwood/Missing.java"),
        ]);

        let analysis = AnalysisEngine::new().analyze(&graph);

        assert!(analysis.has_parse_failures());
        assert!(analysis.graph.analyzed.is_empty());
    }

    #[test]
    fn same_package_type_resolves_within_module() {
        let graph = build(vec![
            Module::new("core")
                .with_source("src/p/A.java", "package p; class A { B b; }")
                .with_source("src/p/B.java", "package p; class B {}"),
        ]);

        let analysis = AnalysisEngine::new().without_root().analyze(&graph);

        assert!(analysis.graph.has_edge("p.A", "p.B"));
        assert_eq!(analysis.graph.edge_count(), 1);
    }

    struct ListedTypes;

    impl Extractor for ListedTypes {
        fn name(&self) -> &str {
            "listed-types"
        }

        fn on_file(&mut self, ctx: &mut ModuleContext, file: &SourceFile) {
            if file.path().extension().is_some_and(|e| e == "list") {
                if let Ok(text) = file.read() {
                    for line in text.lines() {
                        ctx.add_dependency("registry.Listing", line);
                    }
                }
            }
        }

        fn on_analysis_complete(&mut self, ctx: &mut ModuleContext) {
            let seen: IntermediateSet<String> =
                ctx.declared().iter().map(Symbol::to_string).collect();
            ctx.put_intermediate("listed", IntermediateResult::Set(seen));
        }
    }

    #[test]
    fn extractor_facts_join_the_module() {
        let mut registry = ExtractorRegistry::new();
        registry.register(|| Box::new(ListedTypes));
        let graph = build(vec![
            Module::new("core")
                .with_source("src/p/A.java", "package p; class A {}")
                .with_source("types.list", "p.A\nnot a type"),
        ]);

        let analysis = AnalysisEngine::new()
            .with_extractors(registry)
            .analyze(&graph);
        let core = analysis.module("core").expect("module present");

        assert!(analysis.graph.has_edge("registry.Listing", "p.A"));
        assert_eq!(core.diagnostics.len(), 1);
        assert_eq!(core.diagnostics[0].kind, DiagnosticKind::MalformedFact);
        assert!(core.intermediate.get("listed").is_some());
    }

    fn big_unit() -> String {
        let fields: String = (0..20_000)
            .map(|i| format!("    Fine field{i};\n"))
            .collect();
        format!("package p;\nclass Big {{\n{fields}}}\n")
    }

    #[test]
    fn timed_out_unit_does_not_stop_its_module() {
        let mut registry = ExtractorRegistry::new();
        registry.register(|| Box::new(ListedTypes));
        let graph = build(vec![
            Module::new("core")
                .with_source("src/p/Big.java", &big_unit())
                .with_source("types.list", "p.Fine"),
        ]);

        let analysis = AnalysisEngine::new()
            .with_parser(JavaParser::new().with_timeout(Duration::from_micros(1)))
            .with_extractors(registry)
            .analyze(&graph);
        let core = analysis.module("core").expect("module present");

        assert_eq!(core.diagnostics.len(), 1);
        assert_eq!(core.diagnostics[0].kind, DiagnosticKind::ParseFailure);
        assert!(core.diagnostics[0].message.contains("timed out"));
        assert_eq!(
            core.diagnostics[0].file.as_deref(),
            Some(std::path::Path::new("src/p/Big.java"))
        );
        assert!(!core.declared.contains("p.Big"));
        assert!(analysis.graph.has_edge("registry.Listing", "p.Fine"));
    }

    #[test]
    fn zero_timeout_from_config_parses_big_units() {
        let config = Config {
            analysis: AnalysisConfig {
                parse_timeout_ms: 0,
                ..AnalysisConfig::default()
            },
            ..Config::default()
        };
        let graph = build(vec![
            Module::new("core")
                .with_source("src/p/Big.java", &big_unit())
                .with_source("src/p/Fine.java", "package p; class Fine {}"),
        ]);

        let analysis = AnalysisEngine::with_config(&config).analyze(&graph);

        assert!(!analysis.has_parse_failures());
        assert!(analysis.graph.has_edge("p.Big", "p.Fine"));
    }
}
