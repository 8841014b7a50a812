//! Plain text output for the dependency graph

use colored::Colorize;
use deadwood_core::analysis::BuildAnalysis;
use deadwood_core::diagnostic::Severity;
use deadwood_core::graph::GlobalDependencyGraph;
use std::fmt::Write;

#[derive(Default)]
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, analysis: &BuildAnalysis, graph: &GlobalDependencyGraph) -> String {
        let mut out = String::new();

        for (depender, dependees) in &graph.dependencies {
            let _ = writeln!(out, "{}", depender.as_str().bold());
            for dependee in dependees {
                let marker = if graph.analyzed.contains(dependee) {
                    "->".green()
                } else {
                    "->".dimmed()
                };
                let _ = writeln!(out, "  {} {}", marker, dependee);
            }
        }

        let mut errors = 0;
        let mut warnings = 0;
        for diag in analysis.diagnostics() {
            let severity = match diag.severity {
                Severity::Error => {
                    errors += 1;
                    "error".red().bold()
                }
                Severity::Warning => {
                    warnings += 1;
                    "warning".yellow().bold()
                }
            };
            let _ = writeln!(out, "{}: {}", severity, diag);
        }

        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "Analyzed {} module(s): {} type(s), {} dependency edge(s), {} error(s) and {} warning(s)",
            analysis.modules.len(),
            graph.analyzed.len(),
            graph.edge_count(),
            errors,
            warnings
        );

        out
    }
}
