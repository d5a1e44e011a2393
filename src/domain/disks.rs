//! Data-disk discovery under the host-root mount point.

use std::path::Path;

use tracing::debug;

/// Host `/etc`, mounted for the hostname file.
pub const RESERVED_CONFIG_DIR: &str = "etc";
/// Host system metadata mount.
pub const RESERVED_METADATA_DIR: &str = "sysfolder";

/// Names of the directories directly under `host_root`, excluding the two
/// reserved system mounts. Sorted; empty when `host_root` does not exist.
pub async fn enumerate(host_root: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(host_root).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(host_root = %host_root.display(), error = %e, "host root not readable, no data disks");
            return Vec::new();
        }
    };

    let mut disks = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!(host_root = %host_root.display(), error = %e, "stopped reading host root");
                break;
            }
        };

        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            debug!(entry = ?entry.file_name(), "skipping non UTF-8 entry");
            continue;
        };

        if is_dir && name != RESERVED_CONFIG_DIR && name != RESERVED_METADATA_DIR {
            disks.push(name.to_string());
        } else {
            debug!(entry = name, is_dir, "skipping host root entry");
        }
    }
    disks.sort();
    disks
}
