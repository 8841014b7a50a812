//! CLI command implementations

pub mod analyze;
pub mod init;

pub use analyze::{AnalyzeArgs, OutputFormat};
pub use init::InitArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a Java build and print its dependency graph
    Analyze(AnalyzeArgs),

    /// Initialize deadwood configuration in a directory
    Init(InitArgs),
}
