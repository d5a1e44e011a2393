//! Host identity: model, serial and hostname, read from the files the
//! catalog names for the resolved system class.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::CommandCatalog;
use crate::platform::SystemClass;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub model: Option<String>,
    pub serial: Option<String>,
}

impl Identity {
    /// Replace detected fields with configured ones where given.
    pub fn with_overrides(self, model: Option<String>, serial: Option<String>) -> Self {
        Self {
            model: model.or(self.model),
            serial: serial.or(self.serial),
        }
    }
}

/// Everything known about the host before the first collection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostFacts {
    pub hostname: String,
    pub class: SystemClass,
    pub identity: Identity,
}

/// Read model and serial for `class`. Missing entries or unreadable files
/// leave the field empty.
pub fn resolve(catalog: &CommandCatalog, class: SystemClass) -> Identity {
    let Some(entry) = catalog.class(class) else {
        debug!(class = %class, "no catalog entry, identity unavailable");
        return Identity::default();
    };

    Identity {
        model: entry
            .device_model
            .as_deref()
            .and_then(|path| read_trimmed(path, "model")),
        serial: entry
            .device_serial
            .as_deref()
            .and_then(|path| read_trimmed(path, "serial")),
    }
}

/// Hostname from the catalog's hostname file, falling back to the kernel's.
pub fn hostname(catalog: &CommandCatalog) -> String {
    catalog
        .common
        .hostname
        .as_deref()
        .and_then(|path| read_trimmed(path, "hostname"))
        .unwrap_or_else(|| {
            hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".into())
        })
}

// Device-tree files end in a NUL byte rather than a newline.
fn read_trimmed(path: &str, field: &str) -> Option<String> {
    match std::fs::read(path) {
        Ok(raw) => {
            let text = String::from_utf8_lossy(&raw);
            let value = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
            if value.is_empty() {
                debug!(path, field, "identity file is empty");
                None
            } else {
                debug!(path, field, value, "read identity field");
                Some(value.to_string())
            }
        }
        Err(e) => {
            debug!(path, field, error = %e, "could not read identity field");
            None
        }
    }
}
