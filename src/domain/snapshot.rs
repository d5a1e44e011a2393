//! One complete set of metrics from a single collection pass.
//!
//! Field names on the wire are camelCase with unit suffixes (`totalGB`,
//! `uptimeSeconds`). Discovery value templates index into this shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Usage of a filesystem as reported by `df`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    #[serde(rename = "totalGB")]
    pub total_gb: u64,
    #[serde(rename = "usedGB")]
    pub used_gb: u64,
    /// As reported by the tool, not recomputed from the GB values.
    #[serde(rename = "usePercent")]
    pub use_percent: u8,
}

/// Metrics for one data volume mounted under the host root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDiskMetric {
    #[serde(rename = "usedGB")]
    pub used_gb: u64,
    #[serde(rename = "usePercent")]
    pub use_percent: Option<u8>,
    #[serde(rename = "fileCount")]
    pub file_count: u64,
    #[serde(rename = "newestFileAgeSeconds")]
    pub newest_file_age_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    #[serde(rename = "totalGB")]
    pub total_gb: u64,
    #[serde(rename = "usedGB")]
    pub used_gb: u64,
    #[serde(rename = "usedPercent")]
    pub used_percent: u8,
}

/// 1-, 5- and 15-minute load averages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverage {
    pub one: Option<f64>,
    pub five: Option<f64>,
    pub fifteen: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Keyed by directory name under the host root.
    #[serde(rename = "dataDisks")]
    pub data_disks: BTreeMap<String, DataDiskMetric>,
    #[serde(rename = "uptimeSeconds")]
    pub uptime_secs: Option<u64>,
    pub load1: Option<f64>,
    pub load5: Option<f64>,
    pub load15: Option<f64>,
    #[serde(rename = "temperatureCelsius")]
    pub temperature_celsius: Option<f64>,
    #[serde(rename = "systemDisk")]
    pub system_disk: DiskUsage,
    pub memory: MemoryUsage,
    /// Omitted from the serialized form entirely when absent.
    #[serde(
        rename = "batteryPercent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub battery_percent: Option<u8>,
}

impl Snapshot {
    pub fn load(&self) -> LoadAverage {
        LoadAverage {
            one: self.load1,
            five: self.load5,
            fifteen: self.load15,
        }
    }
}
