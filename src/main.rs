mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::OutputFormat;

#[derive(Parser)]
#[command(name = "hostprobe", version, about = "Host metrics probe for containerised deployments")]
struct Cli {
    /// Path to config file (default: ~/.config/hostprobe/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection pass and print the snapshot
    Collect {
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show the detected system class, identity, hostname and data disks
    Detect {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the effective command catalog
    Catalog,

    /// Publish discovery documents, then collect and publish periodically
    Daemon {
        /// Seconds between collection passes (overrides config)
        #[arg(long)]
        interval: Option<u64>,

        /// HTTP bridge URL to publish to (overrides config)
        #[arg(long)]
        sink_url: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Collect { format } => commands::collect::run(config, cli.log_level, format),
        Commands::Detect { format } => commands::detect::run(config, cli.log_level, format),
        Commands::Catalog => commands::catalog::run(config, cli.log_level),
        Commands::Daemon { interval, sink_url } => {
            commands::daemon::run(config, interval, sink_url, cli.log_level)
        }
    }
}
