use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::Cli;

/// Installs the stderr subscriber. A non-empty `RUST_LOG` replaces `--log-level`.
pub fn init_logging(cli: &Cli) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(cli.log_level.as_tracing_level(), env.as_deref());
    let subscriber = tracing_subscriber::registry().with(filter);

    if cli.log_json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Directives from `env` when present and valid, `level` for every target otherwise.
pub fn build_filter(level: Level, env: Option<&str>) -> EnvFilter {
    let fallback = || EnvFilter::new(LevelFilter::from_level(level).to_string());
    match env.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
        None => fallback(),
    }
}
