//! JSON output formatter for the dependency graph
//!
//! Wraps the serialized global graph with run metadata, a summary and the
//! diagnostics collected while analyzing.

use deadwood_core::analysis::BuildAnalysis;
use deadwood_core::diagnostic::{Diagnostic, DiagnosticKind};
use deadwood_core::graph::GlobalDependencyGraph;
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub modules: Vec<JsonModule<'a>>,
    pub graph: &'a GlobalDependencyGraph,
    pub diagnostics: Vec<&'a Diagnostic>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub deadwood_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub modules: usize,
    pub analyzed: usize,
    pub edges: usize,
    pub parse_failures: usize,
    pub malformed_facts: usize,
}

#[derive(Serialize)]
pub struct JsonModule<'a> {
    pub name: &'a str,
    pub declared: usize,
    pub edges: usize,
    pub diagnostics: usize,
}

pub struct JsonFormatter {
    analyzed_path: String,
}

impl JsonFormatter {
    pub fn new(analyzed_path: &str) -> Self {
        Self {
            analyzed_path: analyzed_path.to_string(),
        }
    }

    pub fn format(&self, analysis: &BuildAnalysis, graph: &GlobalDependencyGraph) -> String {
        let output = self.build_output(analysis, graph);
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_output<'a>(
        &self,
        analysis: &'a BuildAnalysis,
        graph: &'a GlobalDependencyGraph,
    ) -> JsonOutput<'a> {
        let diagnostics: Vec<&Diagnostic> = analysis.diagnostics().collect();
        let count = |kind: DiagnosticKind| diagnostics.iter().filter(|d| d.kind == kind).count();

        JsonOutput {
            version: "1.0",
            metadata: self.build_metadata(),
            summary: JsonSummary {
                modules: analysis.modules.len(),
                analyzed: graph.analyzed.len(),
                edges: graph.edge_count(),
                parse_failures: count(DiagnosticKind::ParseFailure),
                malformed_facts: count(DiagnosticKind::MalformedFact),
            },
            modules: analysis
                .modules
                .iter()
                .map(|m| JsonModule {
                    name: &m.name,
                    declared: m.declared.len(),
                    edges: m.edge_count(),
                    diagnostics: m.diagnostics.len(),
                })
                .collect(),
            graph,
            diagnostics,
        }
    }

    fn build_metadata(&self) -> JsonMetadata {
        JsonMetadata {
            deadwood_version: env!("CARGO_PKG_VERSION"),
            working_directory: std::env::current_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            analyzed_path: self.analyzed_path.clone(),
        }
    }
}
