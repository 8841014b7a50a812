//! Configuration loading and parsing for deadwood
//!
//! Provides functionality to load and parse `deadwood.toml` configuration files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::parser::DEFAULT_MAX_DEPTH;
use crate::semantic::resolver::RootNamespace;

pub const CONFIG_FILENAME: &str = "deadwood.toml";

pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 5000;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["resolver", "analysis", "modules"];
const KNOWN_RESOLVER_KEYS: &[&str] = &["root_namespace", "platform_types"];
const KNOWN_ANALYSIS_KEYS: &[&str] = &["parse_timeout_ms", "max_depth", "exclude"];
const KNOWN_MODULE_KEYS: &[&str] = &["name", "sources", "dependencies"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub analysis: AnalysisConfig,
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub root_namespace: String,
    pub platform_types: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_namespace: "java.lang".to_string(),
            platform_types: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn root(&self) -> RootNamespace {
        let root = if self.root_namespace == "java.lang" {
            RootNamespace::java_lang()
        } else {
            RootNamespace::new(&self.root_namespace)
        };
        root.with_platform_types(self.platform_types.iter().cloned())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parse_timeout_ms: u64,
    pub max_depth: usize,
    pub exclude: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parse_timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
            max_depth: DEFAULT_MAX_DEPTH,
            exclude: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// `None` when the timeout is disabled with `0`.
    pub fn parse_timeout(&self) -> Option<Duration> {
        (self.parse_timeout_ms > 0).then(|| Duration::from_millis(self.parse_timeout_ms))
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModuleConfig {
    pub name: String,
    /// Directories relative to the config file.
    pub sources: Vec<String>,
    pub dependencies: Vec<String>,
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_warnings(path).map(|result| result.config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [
        ("resolver", KNOWN_RESOLVER_KEYS),
        ("analysis", KNOWN_ANALYSIS_KEYS),
    ] {
        if let Some(toml::Value::Table(values)) = table.get(section) {
            for key in values.keys() {
                if !known.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    if let Some(toml::Value::Array(modules)) = table.get("modules") {
        for module in modules {
            let toml::Value::Table(values) = module else {
                continue;
            };
            for key in values.keys() {
                if !KNOWN_MODULE_KEYS.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [[modules]]: '{}'", key));
                }
            }
        }
    }

    warnings
}

pub fn load_config_or_default_with_warnings(
    start_dir: &Path,
) -> Result<(ConfigResult, Option<PathBuf>), ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path).map(|result| (result, Some(path))),
        None => Ok((ConfigResult::default(), None)),
    }
}
