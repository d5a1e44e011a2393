use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::platform::SystemClass;

/// Environment variables understood for compatibility with existing
/// deployments, mapped onto config keys by [`legacy_env_key`].
const LEGACY_ENV: &[&str] = &[
    "SYSTEM_TYPE",
    "MODEL",
    "SERIAL",
    "MANUFACTURER",
    "HW_VERSION",
    "SUGGESTED_AREA",
    "pollFrequency",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the host's filesystems are mounted inside the container.
    pub host_root: PathBuf,
    /// Command catalog file; the builtin catalog is used when unset.
    pub catalog: Option<PathBuf>,
    pub hostname: Option<String>,
    pub system_type: Option<SystemClass>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub poll_interval_secs: u64,
    pub command_timeout_secs: u64,
    pub collect_timeout_secs: u64,
    pub log_level: String,
    pub topic_prefix: String,
    pub sink: SinkConfig,
    pub device: DeviceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_root: PathBuf::from("/host"),
            catalog: None,
            hostname: None,
            system_type: None,
            model: None,
            serial: None,
            poll_interval_secs: 60,
            command_timeout_secs: 30,
            collect_timeout_secs: 120,
            log_level: "info".to_string(),
            topic_prefix: "homeassistant".to_string(),
            sink: SinkConfig::default(),
            device: DeviceConfig::default(),
        }
    }
}

/// Where published messages go. Without a URL they are written to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
        }
    }
}

/// Static device metadata advertised in discovery documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub manufacturer: Option<String>,
    pub hw_version: Option<String>,
    pub suggested_area: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("hostprobe").join("config.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs < 1 {
            bail!("poll_interval_secs must be >= 1");
        }
        if self.command_timeout_secs < 1 {
            bail!("command_timeout_secs must be >= 1");
        }
        if self.collect_timeout_secs < 1 {
            bail!("collect_timeout_secs must be >= 1");
        }
        if self.sink.timeout_secs < 1 {
            bail!("sink.timeout_secs must be >= 1");
        }
        if self.topic_prefix.trim().is_empty() {
            bail!("topic_prefix must not be empty");
        }
        if let Some(url) = &self.sink.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("sink.url must be an http:// or https:// URL, got '{}'", url);
            }
        }
        Ok(())
    }
}

fn legacy_env_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "manufacturer" => "device.manufacturer".to_string(),
        "hw_version" => "device.hw_version".to_string(),
        "suggested_area" => "device.suggested_area".to_string(),
        "pollfrequency" => "poll_interval_secs".to_string(),
        other => other.to_string(),
    }
}

/// Defaults, then the YAML file, then legacy environment names, then
/// `HOSTPROBE_*` variables (`__` separates nested keys).
pub fn figment(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Yaml::file(path))
        .merge(
            Env::raw()
                .only(LEGACY_ENV)
                .map(|key| legacy_env_key(key.as_str()).into()),
        )
        .merge(Env::prefixed("HOSTPROBE_").split("__"))
}

/// Load the configuration from `path`, or from the default location when no
/// path is given. A missing default file is not an error.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => Config::path()?,
    };

    let config: Config = figment(&path)
        .extract()
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn extract(jail: &Jail) -> figment::Result<Config> {
        figment(&jail.directory().join("config.yaml")).extract()
    }

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let config = extract(jail)?;
            assert_eq!(config.host_root, PathBuf::from("/host"));
            assert_eq!(config.poll_interval_secs, 60);
            assert!(config.system_type.is_none());
            assert!(config.sink.url.is_none());
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn yaml_then_prefixed_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "poll_interval_secs: 30\nsystem_type: raspberrypi\nsink:\n  url: http://bridge.local:8080/publish\n",
            )?;
            jail.set_env("HOSTPROBE_POLL_INTERVAL_SECS", "15");
            jail.set_env("HOSTPROBE_DEVICE__SUGGESTED_AREA", "Garage");

            let config = extract(jail)?;
            assert_eq!(config.poll_interval_secs, 15);
            assert_eq!(config.system_type, Some(SystemClass::RaspberryPi));
            assert_eq!(
                config.sink.url.as_deref(),
                Some("http://bridge.local:8080/publish")
            );
            assert_eq!(config.device.suggested_area.as_deref(), Some("Garage"));
            Ok(())
        });
    }

    #[test]
    fn legacy_env_names_are_honoured() {
        Jail::expect_with(|jail| {
            jail.set_env("SYSTEM_TYPE", "x86");
            jail.set_env("pollFrequency", "120");
            jail.set_env("MANUFACTURER", "Acme");
            jail.set_env("SERIAL", "SN-42");

            let config = extract(jail)?;
            assert_eq!(config.system_type, Some(SystemClass::X86));
            assert_eq!(config.poll_interval_secs, 120);
            assert_eq!(config.device.manufacturer.as_deref(), Some("Acme"));
            assert_eq!(config.serial.as_deref(), Some("SN-42"));
            Ok(())
        });
    }

    #[test]
    fn unknown_system_type_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "system_type: mainframe\n")?;
            assert!(extract(jail).is_err());
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_bad_values() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sink.url = Some("mqtt://broker:1883".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.yaml"))).is_err());
    }
}
