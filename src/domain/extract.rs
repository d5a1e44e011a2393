//! Runs the catalog command for one metric and parses its
//! output. Failures surface only as zero or `None` in the returned value.

use chrono::Utc;
use tracing::debug;

use super::catalog::{render, CommonCommands};
use super::parse;
use super::snapshot::{DataDiskMetric, DiskUsage, LoadAverage, MemoryUsage};
use crate::runner::CommandRunner;

pub struct Extractor<'a, R> {
    runner: &'a R,
    commands: &'a CommonCommands,
}

impl<'a, R: CommandRunner> Extractor<'a, R> {
    pub fn new(runner: &'a R, commands: &'a CommonCommands) -> Self {
        Self { runner, commands }
    }

    async fn run(&self, metric: &str, command: &str) -> String {
        let output = self.runner.run(command).await;
        debug!(metric, command, output = %output.trim_end(), "command output");
        output
    }

    /// Run an optional per-disk template. `None` when the catalog has no
    /// command for this metric.
    async fn run_for_disk(
        &self,
        metric: &str,
        template: Option<&str>,
        disk_path: &str,
    ) -> Option<String> {
        match template {
            Some(template) => Some(self.run(metric, &render(template, disk_path)).await),
            None => {
                debug!(metric, "no command configured");
                None
            }
        }
    }

    pub async fn system_disk(&self) -> DiskUsage {
        let usage = parse::parse_df(&self.run("systemDisk", &self.commands.system_disk).await);
        debug!(?usage, "system disk");
        usage
    }

    /// All per-disk metrics for the volume mounted at `disk_path`. Each one is
    /// extracted independently.
    pub async fn data_disk(&self, disk_path: &str) -> DataDiskMetric {
        let commands = self.commands;
        let (used, percent, files, newest) = tokio::join!(
            self.run_for_disk("dataDisk", commands.data_disk.as_deref(), disk_path),
            self.run_for_disk("dataDiskDf", commands.data_disk_df.as_deref(), disk_path),
            self.run_for_disk("files", commands.files.as_deref(), disk_path),
            self.run_for_disk("newestFile", commands.newest_file.as_deref(), disk_path),
        );

        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        let metric = DataDiskMetric {
            used_gb: used.as_deref().map(parse::parse_du).unwrap_or(0),
            use_percent: percent.as_deref().and_then(parse::parse_df_percent),
            file_count: files.as_deref().map(parse::parse_file_count).unwrap_or(0),
            newest_file_age_secs: newest
                .as_deref()
                .and_then(|out| parse::parse_newest_age(out, now)),
        };
        debug!(disk = disk_path, ?metric, "data disk");
        metric
    }

    pub async fn uptime(&self) -> Option<u64> {
        parse::parse_uptime(&self.run("uptime", &self.commands.uptime).await)
    }

    pub async fn load(&self) -> LoadAverage {
        parse::parse_load(&self.run("load", &self.commands.load).await)
    }

    pub async fn temperature(&self) -> Option<f64> {
        let celsius =
            parse::parse_temperature(&self.run("temperature", &self.commands.temperature).await);
        if celsius.is_none() {
            debug!("no usable temperature reading");
        }
        celsius
    }

    pub async fn memory(&self) -> MemoryUsage {
        let memory = parse::parse_memory(&self.run("memory", &self.commands.memory).await);
        debug!(?memory, "memory");
        memory
    }

    pub async fn battery(&self, command: &str) -> Option<u8> {
        let level = parse::parse_battery(&self.run("battery", command).await);
        debug!(?level, "battery level");
        level
    }
}
