//! Analyze command - discovers the type dependencies of a Java build

use crate::output::json::JsonFormatter;
use crate::output::text::TextFormatter;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use deadwood_core::analysis::AnalysisEngine;
use deadwood_core::build::{BuildGraph, Module};
use deadwood_core::config::{
    Config, ConfigResult, load_config_or_default_with_warnings, load_config_with_warnings,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["java"];

const DEFAULT_MODULE_NAME: &str = "root";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Build root, or the single source directory when no config file exists
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Config file to use instead of searching for deadwood.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format for the dependency graph
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Keep only dependencies on types declared in the build
    #[arg(long)]
    pub internal_only: bool,

    /// Exit with code 1 when any file failed to parse
    #[arg(long)]
    pub strict: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl AnalyzeArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let root = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        if !root.exists() {
            anyhow::bail!("Path does not exist: {}", root.display());
        }

        let (config_result, config_path) = self.load_config(&root)?;
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let modules = plan_modules(&root, config_path.as_deref(), &config)?;
        let build = BuildGraph::new(modules).context("Invalid module graph")?;
        info!(modules = build.len(), "build planned");

        let engine = AnalysisEngine::with_config(&config);
        let analysis = engine.analyze(&build);
        let graph = if self.internal_only {
            analysis.graph.internal_only()
        } else {
            analysis.graph.clone()
        };

        let rendered = match self.format {
            OutputFormat::Json => {
                JsonFormatter::new(&root.to_string_lossy()).format(&analysis, &graph)
            }
            OutputFormat::Text => TextFormatter::new().format(&analysis, &graph),
        };

        match &self.output {
            Some(path) => {
                fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write output to '{}'", path.display()))?;
                eprintln!(
                    "{} Wrote dependency graph to {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
            None => print!("{}", rendered),
        }

        if self.strict && analysis.has_parse_failures() {
            process::exit(1);
        }

        Ok(())
    }

    fn load_config(&self, root: &Path) -> Result<(ConfigResult, Option<PathBuf>)> {
        match &self.config {
            Some(path) => {
                let result = load_config_with_warnings(path)?;
                Ok((result, Some(path.clone())))
            }
            None => {
                let start = if root.is_file() {
                    root.parent().unwrap_or(Path::new("."))
                } else {
                    root
                };
                Ok(load_config_or_default_with_warnings(start)?)
            }
        }
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env || self.output.is_some() {
            colored::control::set_override(false);
        }
    }
}

/// Modules declared in the config, or the whole root as one module.
fn plan_modules(root: &Path, config_path: Option<&Path>, config: &Config) -> Result<Vec<Module>> {
    let excludes = build_glob_set(&config.analysis.exclude)?;

    if config.modules.is_empty() {
        let mut module = Module::new(&module_name(root));
        for file in discover_files(root, &excludes)? {
            module = module.with_file(file);
        }
        return Ok(vec![module]);
    }

    let base = config_path.and_then(Path::parent).unwrap_or(Path::new("."));

    let mut modules = Vec::with_capacity(config.modules.len());
    for declared in &config.modules {
        let mut module = Module::new(&declared.name);
        for source in &declared.sources {
            let dir = base.join(source);
            if !dir.exists() {
                debug!(module = %declared.name, dir = %dir.display(), "source directory missing");
                continue;
            }
            for file in discover_files(&dir, &excludes)? {
                module = module.with_file(file);
            }
        }
        for dependency in &declared.dependencies {
            module = module.with_dependency(dependency);
        }
        modules.push(module);
    }
    Ok(modules)
}

fn module_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
        .unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string())
}

fn discover_files(path: &Path, excludes: &GlobSet) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        if is_supported_file(path) {
            return Ok(vec![path.to_path_buf()]);
        } else {
            return Ok(vec![]);
        }
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .filter(|e| !is_excluded(path, e.path(), excludes))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    Ok(files)
}

fn is_excluded(root: &Path, path: &Path, excludes: &GlobSet) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    excludes.is_match(relative)
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("Invalid exclude pattern '{}'", pattern))?;
        builder.add(glob);
    }

    Ok(builder.build()?)
}

fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
