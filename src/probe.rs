//! Startup wiring: configuration in, a ready collector and host facts out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::domain::catalog::CommandCatalog;
use crate::domain::collector::Collector;
use crate::domain::identity::{self, HostFacts};
use crate::platform;
use crate::runner::ShellRunner;

pub struct Probe {
    pub facts: HostFacts,
    pub collector: Collector<ShellRunner>,
}

impl Probe {
    /// Load the catalog, classify the host and resolve its identity. A
    /// catalog that cannot be loaded is fatal; everything else degrades.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = CommandCatalog::load_or_builtin(config.catalog.as_deref())
            .context("loading command catalog")?;

        let class = platform::resolve(config.system_type, Path::new(&catalog.common.cpuinfo));
        let identity = identity::resolve(&catalog, class)
            .with_overrides(config.model.clone(), config.serial.clone());
        let hostname = config
            .hostname
            .clone()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| identity::hostname(&catalog));

        info!(
            hostname = %hostname,
            class = %class,
            model = identity.model.as_deref().unwrap_or("-"),
            "host resolved"
        );

        let runner = ShellRunner::new(Duration::from_secs(config.command_timeout_secs));
        let collector = Collector::new(runner, Arc::new(catalog), class, &config.host_root);

        Ok(Self {
            facts: HostFacts {
                hostname,
                class,
                identity,
            },
            collector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SystemClass;

    #[test]
    fn overrides_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            host_root: dir.path().to_path_buf(),
            hostname: Some("override-host".into()),
            system_type: Some(SystemClass::Virtual),
            model: Some("Test VM".into()),
            serial: Some("SN-1".into()),
            ..Config::default()
        };

        let probe = Probe::from_config(&config).unwrap();
        assert_eq!(probe.facts.hostname, "override-host");
        assert_eq!(probe.facts.class, SystemClass::Virtual);
        assert_eq!(probe.facts.identity.model.as_deref(), Some("Test VM"));
        assert_eq!(probe.facts.identity.serial.as_deref(), Some("SN-1"));
    }

    #[test]
    fn bad_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = Config {
            catalog: Some(path),
            ..Config::default()
        };
        assert!(Probe::from_config(&config).is_err());
    }
}
