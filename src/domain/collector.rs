//! Assembles one [`Snapshot`] per call.
//!
//! The system class is fixed when the collector is built; every call to
//! [`Collector::collect`] re-enumerates data disks and re-runs every command.
//! Independent metrics are extracted concurrently, bounded by the number of
//! metrics and disks in the pass.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use super::catalog::CommandCatalog;
use super::disks;
use super::extract::Extractor;
use super::snapshot::{DataDiskMetric, Snapshot};
use crate::platform::SystemClass;
use crate::runner::CommandRunner;

pub struct Collector<R> {
    runner: R,
    catalog: Arc<CommandCatalog>,
    class: SystemClass,
    host_root: PathBuf,
}

impl<R: CommandRunner> Collector<R> {
    pub fn new(
        runner: R,
        catalog: Arc<CommandCatalog>,
        class: SystemClass,
        host_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            catalog,
            class,
            host_root: host_root.into(),
        }
    }

    pub fn class(&self) -> SystemClass {
        self.class
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Run one complete collection pass.
    pub async fn collect(&self) -> Snapshot {
        let extractor = Extractor::new(&self.runner, &self.catalog.common);

        let battery_command = self
            .catalog
            .class(self.class)
            .and_then(|entry| entry.battery.as_deref());
        let battery = async {
            match battery_command {
                Some(command) => extractor.battery(command).await,
                None => None,
            }
        };

        let (
            battery_percent,
            system_disk,
            data_disks,
            uptime_secs,
            load,
            temperature_celsius,
            memory,
        ) = tokio::join!(
            battery,
            extractor.system_disk(),
            self.collect_data_disks(&extractor),
            extractor.uptime(),
            extractor.load(),
            extractor.temperature(),
            extractor.memory(),
        );

        debug!(
            class = %self.class,
            data_disks = data_disks.len(),
            "collection pass complete"
        );

        Snapshot {
            data_disks,
            uptime_secs,
            load1: load.one,
            load5: load.five,
            load15: load.fifteen,
            temperature_celsius,
            system_disk,
            memory,
            battery_percent,
        }
    }

    /// The data disks currently mounted under the host root.
    pub async fn data_disks(&self) -> Vec<String> {
        disks::enumerate(&self.host_root).await
    }

    async fn collect_data_disks(
        &self,
        extractor: &Extractor<'_, R>,
    ) -> BTreeMap<String, DataDiskMetric> {
        let names = self.data_disks().await;
        debug!(disks = ?names, "detected data disks");

        let metrics = join_all(names.iter().map(|name| {
            let path = self.host_root.join(name).display().to_string();
            async move { extractor.data_disk(&path).await }
        }))
        .await;

        names.into_iter().zip(metrics).collect()
    }
}
