pub mod catalog;
pub mod collect;
pub mod daemon;
pub mod detect;

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use hostprobe::config::{self, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Install the global subscriber on stderr. RUST_LOG wins over `level`.
pub fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().with_target(false).init();
    }
}

/// Load configuration and apply a `--log-level` override.
pub fn load_config(path: Option<&Path>, log_level: Option<String>) -> Result<Config> {
    let mut config = config::load(path)?;
    if let Some(level) = log_level {
        config.log_level = level;
    }
    Ok(config)
}
