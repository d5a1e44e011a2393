//! `hostprobe collect`: run one collection pass and print the snapshot.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use hostprobe::domain::snapshot::Snapshot;
use hostprobe::probe::Probe;

use super::OutputFormat;

pub fn run(config_path: Option<&Path>, log_level: Option<String>, format: OutputFormat) -> Result<()> {
    let config = super::load_config(config_path, log_level)?;
    super::init_tracing(&config.log_level, false);

    let probe = Probe::from_config(&config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(probe.collector.collect());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Table => print_table(&probe.facts.hostname, &snapshot),
    }
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".dimmed().to_string())
}

fn fmt_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

fn print_table(hostname: &str, snapshot: &Snapshot) {
    println!("{}", "═══ Host Snapshot ═══".cyan().bold());
    println!("  Hostname:      {}", hostname.bold());
    println!("  Uptime:        {}", opt(snapshot.uptime_secs.map(fmt_uptime)));
    println!(
        "  Load:          {} {} {}",
        opt(snapshot.load1),
        opt(snapshot.load5),
        opt(snapshot.load15)
    );
    println!(
        "  Temperature:   {}",
        opt(snapshot.temperature_celsius.map(|t| format!("{:.1} °C", t)))
    );
    if let Some(battery) = snapshot.battery_percent {
        println!("  Battery:       {}%", battery);
    }

    println!();
    println!("{}", "── Memory ──".yellow());
    println!(
        "  Used:          {} / {} GB ({}%)",
        snapshot.memory.used_gb, snapshot.memory.total_gb, snapshot.memory.used_percent
    );

    println!();
    println!("{}", "── System Disk ──".yellow());
    println!(
        "  Used:          {} / {} GB ({}%)",
        snapshot.system_disk.used_gb, snapshot.system_disk.total_gb, snapshot.system_disk.use_percent
    );

    println!();
    println!("{}", "── Data Disks ──".yellow());
    if snapshot.data_disks.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for (name, disk) in &snapshot.data_disks {
        println!(
            "  {:<14} {} GB used, {}%, {} files, newest {}",
            name.bold(),
            disk.used_gb,
            opt(disk.use_percent),
            disk.file_count,
            opt(disk.newest_file_age_secs.map(|s| format!("{}s ago", s)))
        );
    }
}
