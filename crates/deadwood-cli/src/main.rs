//! Deadwood CLI - Command-line interface for the deadwood dependency analyzer
//!
//! Discovers the type dependencies of multi-module Java builds.

mod commands;
mod logging;
mod output;

use clap::{Parser, ValueEnum};
use commands::Commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "deadwood",
    author,
    version,
    about = "Type dependency discovery for multi-module Java builds",
    long_about = "Deadwood resolves every type a Java source refers to, merges the facts of\n\
                  dependent modules and writes the global dependency graph that a\n\
                  reachability sweep uses to find dead code."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, value_enum, default_value = "warn", global = true, help = "Set the log level")]
    pub log_level: LogLevel,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli);

    match cli.command {
        Commands::Analyze(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use commands::OutputFormat;

    #[test]
    fn cli_parses_analyze_command() {
        let cli = Cli::try_parse_from(["deadwood", "analyze", "./project"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.path.unwrap().to_str().unwrap(), "./project");
                assert_eq!(args.format, OutputFormat::Text);
                assert!(!args.internal_only);
                assert!(!args.strict);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn cli_parses_analyze_without_path() {
        let cli = Cli::try_parse_from(["deadwood", "analyze"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => assert!(args.path.is_none()),
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn cli_parses_analyze_options() {
        let cli = Cli::try_parse_from([
            "deadwood",
            "analyze",
            ".",
            "--config",
            "build/deadwood.toml",
            "--format",
            "json",
            "--output",
            "graph.json",
            "--internal-only",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.config.unwrap().to_str().unwrap(), "build/deadwood.toml");
                assert_eq!(args.format, OutputFormat::Json);
                assert_eq!(args.output.unwrap().to_str().unwrap(), "graph.json");
                assert!(args.internal_only);
                assert!(args.strict);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_format() {
        let result = Cli::try_parse_from(["deadwood", "analyze", "--format", "sarif"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_global_log_options() {
        let cli =
            Cli::try_parse_from(["deadwood", "analyze", "--log-level", "debug", "--log-json"])
                .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.log_json);
    }

    #[test]
    fn cli_log_level_defaults_to_warn() {
        let cli = Cli::try_parse_from(["deadwood", "init"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert!(!cli.log_json);
    }

    #[test]
    fn cli_parses_init_with_force() {
        let cli = Cli::try_parse_from(["deadwood", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Init(args) => assert!(args.force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn log_level_maps_to_tracing_levels() {
        assert_eq!(LogLevel::Trace.as_tracing_level(), tracing::Level::TRACE);
        assert_eq!(LogLevel::Debug.as_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Info.as_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Warn.as_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Error.as_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn cli_version_is_set() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some("0.1.0"));
    }

    #[test]
    fn analyze_help_shows_options() {
        let mut cmd = Cli::command();
        let analyze_cmd = cmd
            .get_subcommands_mut()
            .find(|c| c.get_name() == "analyze")
            .unwrap();
        let help = analyze_cmd.render_help().to_string();
        assert!(help.contains("PATH"));
        assert!(help.contains("--format"));
        assert!(help.contains("--internal-only"));
    }
}
