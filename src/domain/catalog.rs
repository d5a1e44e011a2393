//! Command catalog: which external command measures which metric on which
//! class of machine.
//!
//! The catalog ships embedded (`catalog/system_commands.json`) and can be
//! replaced by a JSON or YAML file at startup. It is loaded once and shared
//! read-only (`Arc<CommandCatalog>`) for the lifetime of the process.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::SystemClass;

/// The only placeholder a command template understands.
pub const DISK_PLACEHOLDER: &str = "{disk}";

const BUILTIN_CATALOG: &str = include_str!("../../catalog/system_commands.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read command catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse command catalog {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("invalid command catalog {origin}: {message}")]
    Validation { origin: String, message: String },
}

/// Commands and paths used regardless of system class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonCommands {
    /// Path of the CPU description used for classification.
    #[serde(default = "default_cpuinfo")]
    pub cpuinfo: String,
    /// Path of the host's hostname file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub system_disk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_disk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_disk_df: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_file: Option<String>,
    pub uptime: String,
    pub load: String,
    pub memory: String,
    #[serde(default = "default_temperature")]
    pub temperature: String,
}

fn default_cpuinfo() -> String {
    "/proc/cpuinfo".to_string()
}

fn default_temperature() -> String {
    "sensors -j".to_string()
}

/// Identity file paths and commands specific to one system class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCommands {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandCatalog {
    pub common: CommonCommands,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raspberrypi: Option<ClassCommands>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x86: Option<ClassCommands>,
    #[serde(default, rename = "virtual", skip_serializing_if = "Option::is_none")]
    pub virtual_machine: Option<ClassCommands>,
}

impl CommandCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG, "<builtin>")
    }

    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let catalog: CommandCatalog =
            serde_json::from_str(text).map_err(|e| CatalogError::Parse {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
        catalog.validate(origin)?;
        Ok(catalog)
    }

    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let catalog: CommandCatalog =
            serde_yaml::from_str(text).map_err(|e| CatalogError::Parse {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
        catalog.validate(origin)?;
        Ok(catalog)
    }

    /// Load a catalog file. `.yaml`/`.yml` files are parsed as YAML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: origin.clone(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text, &origin),
            _ => Self::from_json_str(&text, &origin),
        }
    }

    /// Load `path` when given, otherwise fall back to the builtin catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    /// The class-specific entry, if the catalog defines one. `Unknown` never
    /// has an entry.
    pub fn class(&self, class: SystemClass) -> Option<&ClassCommands> {
        match class {
            SystemClass::RaspberryPi => self.raspberrypi.as_ref(),
            SystemClass::X86 => self.x86.as_ref(),
            SystemClass::Virtual => self.virtual_machine.as_ref(),
            SystemClass::Unknown => None,
        }
    }

    fn validate(&self, origin: &str) -> Result<(), CatalogError> {
        let required = [
            ("common.cpuinfo", &self.common.cpuinfo),
            ("common.systemDisk", &self.common.system_disk),
            ("common.uptime", &self.common.uptime),
            ("common.load", &self.common.load),
            ("common.memory", &self.common.memory),
            ("common.temperature", &self.common.temperature),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::Validation {
                    origin: origin.to_string(),
                    message: format!("{} must not be empty", key),
                });
            }
        }
        Ok(())
    }
}

/// Substitute the `{disk}` placeholder in `template` with `disk_path`,
/// single-quoted so the path reaches `sh -c` as one literal word.
pub fn render(template: &str, disk_path: &str) -> String {
    template.replace(DISK_PLACEHOLDER, &shell_quote(disk_path))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
