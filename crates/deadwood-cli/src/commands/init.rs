//! Init command - initializes deadwood configuration in a project

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use deadwood_core::config::CONFIG_FILENAME;
use std::fs;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = r#"# deadwood configuration file

[resolver]
# Package whose types are visible without an import
root_namespace = "java.lang"
# Extra platform types to resolve through the root namespace
# platform_types = ["java.lang.annotation.Retention"]

[analysis]
# Per-file parse timeout in milliseconds, 0 disables it
parse_timeout_ms = 5000
# Maximum nesting depth of a single compilation unit
max_depth = 256
# File patterns to exclude from analysis
# exclude = ["**/generated/**"]

# Modules in build order; each module sees the types of its dependencies.
# Without any module the whole directory is analyzed as one module.
#
# [[modules]]
# name = "core"
# sources = ["core/src/main/java"]
#
# [[modules]]
# name = "app"
# sources = ["app/src/main/java"]
# dependencies = ["core"]
"#;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to create the configuration in
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self) -> Result<()> {
        let config_path = self.dir.join(CONFIG_FILENAME);

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Config file '{}' already exists. Use --force to overwrite.",
                config_path.display()
            );
        }

        fs::write(&config_path, DEFAULT_CONFIG)?;
        println!(
            "{} Created {} configuration file",
            "✓".green().bold(),
            config_path.display().to_string().cyan()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadwood_core::config::{Config, load_config_with_warnings};
    use tempfile::tempdir;

    #[test]
    fn init_creates_config_file() {
        let dir = tempdir().unwrap();

        let args = InitArgs {
            dir: dir.path().to_path_buf(),
            force: false,
        };
        let result = args.run();

        assert!(result.is_ok());
        assert!(dir.path().join(CONFIG_FILENAME).exists());
    }

    #[test]
    fn init_fails_if_config_exists_without_force() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "existing").unwrap();

        let args = InitArgs {
            dir: dir.path().to_path_buf(),
            force: false,
        };
        let result = args.run();

        assert!(result.is_err());
        let content = fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(content, "existing");
    }

    #[test]
    fn init_with_force_overwrites_existing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "existing").unwrap();

        let args = InitArgs {
            dir: dir.path().to_path_buf(),
            force: true,
        };
        let result = args.run();

        assert!(result.is_ok());
        let content = fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(content.contains("[resolver]"));
    }

    #[test]
    fn default_config_is_valid_toml() {
        let config: Result<toml::Table, _> = DEFAULT_CONFIG.parse();
        assert!(config.is_ok());
    }

    #[test]
    fn default_config_loads_without_warnings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let result = load_config_with_warnings(&path).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.config, Config::default());
    }
}
