use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use hostprobe::domain::identity::HostFacts;
use hostprobe::probe::Probe;

use super::OutputFormat;

#[derive(Serialize)]
struct Detection<'a> {
    #[serde(flatten)]
    facts: &'a HostFacts,
    data_disks: Vec<String>,
}

pub fn run(config_path: Option<&Path>, log_level: Option<String>, format: OutputFormat) -> Result<()> {
    let config = super::load_config(config_path, log_level)?;
    super::init_tracing(&config.log_level, false);

    let probe = Probe::from_config(&config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let detection = Detection {
        facts: &probe.facts,
        data_disks: rt.block_on(probe.collector.data_disks()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&detection)?),
        OutputFormat::Table => {
            let unknown = || "unknown".dimmed().to_string();
            println!("{}", "hostprobe detect".bold());
            println!("  hostname: {}", detection.facts.hostname);
            println!("  class:    {}", detection.facts.class.to_string().green());
            println!(
                "  model:    {}",
                detection.facts.identity.model.clone().unwrap_or_else(unknown)
            );
            println!(
                "  serial:   {}",
                detection.facts.identity.serial.clone().unwrap_or_else(unknown)
            );
            if detection.data_disks.is_empty() {
                println!("  disks:    {}", "none".dimmed());
            } else {
                println!("  disks:    {}", detection.data_disks.join(", "));
            }
        }
    }
    Ok(())
}
