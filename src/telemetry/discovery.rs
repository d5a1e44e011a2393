//! Discovery documents: one retained sensor config per published metric, so
//! consumers can register the host's sensors without prior configuration.

use anyhow::{Context, Result};
use serde::Serialize;

use super::{Message, Topics};
use crate::config::DeviceConfig;
use crate::domain::identity::HostFacts;
use crate::domain::snapshot::Snapshot;

#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub identifiers: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub sw_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_area: Option<String>,
}

impl Device {
    pub fn new(facts: &HostFacts, config: &DeviceConfig) -> Self {
        Self {
            identifiers: facts.hostname.clone(),
            name: facts.hostname.clone(),
            manufacturer: non_empty(config.manufacturer.as_deref()),
            model: non_empty(facts.identity.model.as_deref()),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
            hw_version: non_empty(config.hw_version.as_deref()),
            serial_number: non_empty(facts.identity.serial.as_deref()),
            suggested_area: non_empty(config.suggested_area.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// What decides which discovery documents a snapshot needs: its data disks
/// and whether it reports a battery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSet {
    disks: Vec<String>,
    battery: bool,
}

impl SensorSet {
    pub fn of(snapshot: &Snapshot) -> Self {
        Self {
            disks: snapshot.data_disks.keys().cloned().collect(),
            battery: snapshot.battery_percent.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorConfig {
    pub device: Device,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    pub state_class: &'static str,
    pub name: String,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'static str>,
    pub unique_id: String,
    pub value_template: String,
    pub platform: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_display_precision: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<u64>,
}

struct Sensor {
    key: String,
    name: String,
    unit: Option<&'static str>,
    field: String,
    device_class: Option<&'static str>,
    icon: &'static str,
    precision: Option<u8>,
    expire_after: Option<u64>,
}

impl Sensor {
    fn new(key: impl Into<String>, name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            unit: None,
            field: field.into(),
            device_class: None,
            icon: "mdi:gauge",
            precision: None,
            expire_after: None,
        }
    }

    fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    fn class(mut self, device_class: &'static str) -> Self {
        self.device_class = Some(device_class);
        self
    }

    fn icon(mut self, icon: &'static str) -> Self {
        self.icon = icon;
        self
    }

    fn whole(mut self) -> Self {
        self.precision = Some(0);
        self
    }
}

fn disk_sensors(disk: &str) -> Vec<Sensor> {
    let prefix = format!("datadisk_{}", disk);
    let field = |name: &str| format!("dataDisks['{}'].{}", disk, name);
    vec![
        Sensor::new(format!("{}_used", prefix), format!("Disk {} Used", disk), field("usedGB"))
            .unit("GB")
            .class("data_size")
            .icon("mdi:harddisk")
            .whole(),
        Sensor::new(
            format!("{}_usePercent", prefix),
            format!("Disk {} Use %", disk),
            field("usePercent"),
        )
        .unit("%")
        .icon("mdi:harddisk")
        .whole(),
        Sensor::new(
            format!("{}_files", prefix),
            format!("Disk {} Files", disk),
            field("fileCount"),
        )
        .unit("#")
        .icon("mdi:file-multiple")
        .whole(),
        Sensor::new(
            format!("{}_newestFileAge", prefix),
            format!("Disk {} Newest File Age", disk),
            field("newestFileAgeSeconds"),
        )
        .unit("s")
        .class("duration")
        .icon("mdi:file-clock")
        .whole(),
    ]
}

fn host_sensors(snapshot: &Snapshot) -> Vec<Sensor> {
    let mut sensors = vec![
        Sensor {
            expire_after: Some(3600),
            ..Sensor::new("uptime", "Uptime", "uptimeSeconds")
                .unit("s")
                .class("duration")
                .icon("mdi:timer")
                .whole()
        },
        Sensor::new("load1", "Load 1m", "load1"),
        Sensor::new("load5", "Load 5m", "load5"),
        Sensor::new("load15", "Load 15m", "load15"),
        Sensor::new("temperature", "Temperature", "temperatureCelsius")
            .unit("°C")
            .class("temperature")
            .icon("mdi:thermometer"),
        Sensor::new("systemdisk_total", "System Disk Total", "systemDisk.totalGB")
            .unit("GB")
            .class("data_size")
            .icon("mdi:harddisk")
            .whole(),
        Sensor::new("systemdisk_used", "System Disk Used", "systemDisk.usedGB")
            .unit("GB")
            .class("data_size")
            .icon("mdi:harddisk")
            .whole(),
        Sensor::new("systemdisk_usePercent", "System Disk Use %", "systemDisk.usePercent")
            .unit("%")
            .icon("mdi:harddisk")
            .whole(),
        Sensor::new("memory_total", "Memory Total", "memory.totalGB")
            .unit("GB")
            .class("data_size")
            .icon("mdi:memory")
            .whole(),
        Sensor::new("memory_used", "Memory Used", "memory.usedGB")
            .unit("GB")
            .class("data_size")
            .icon("mdi:memory")
            .whole(),
        Sensor::new("memory_usedPercent", "Memory Used %", "memory.usedPercent")
            .unit("%")
            .icon("mdi:memory")
            .whole(),
    ];

    if snapshot.battery_percent.is_some() {
        sensors.push(
            Sensor::new("battery", "Battery Level", "batteryPercent")
                .unit("%")
                .class("battery")
                .icon("mdi:battery")
                .whole(),
        );
    }
    sensors
}

/// Discovery messages for every metric present in `snapshot`: four per data
/// disk, the host metrics, and battery only when the host reports one.
pub fn messages(topics: &Topics, device: &Device, snapshot: &Snapshot) -> Result<Vec<Message>> {
    let sensors = snapshot
        .data_disks
        .keys()
        .flat_map(|disk| disk_sensors(disk))
        .chain(host_sensors(snapshot));

    sensors
        .map(|sensor| -> Result<Message> {
            let config = SensorConfig {
                device: device.clone(),
                device_class: sensor.device_class,
                state_class: "measurement",
                name: format!("{} {}", topics.hostname(), sensor.name),
                state_topic: topics.state(),
                unit_of_measurement: sensor.unit,
                unique_id: format!("{}_{}", topics.hostname(), sensor.key),
                value_template: format!("{{{{ value_json.{} }}}}", sensor.field),
                platform: "mqtt",
                icon: sensor.icon,
                suggested_display_precision: sensor.precision,
                expire_after: sensor.expire_after,
            };
            let payload = serde_json::to_value(&config)
                .with_context(|| format!("serializing discovery config for {}", sensor.key))?;
            Ok(Message {
                topic: topics.config(&sensor.key),
                retain: true,
                payload,
            })
        })
        .collect()
}
