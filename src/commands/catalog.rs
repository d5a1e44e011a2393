use std::path::Path;

use anyhow::{Context, Result};

use hostprobe::domain::catalog::CommandCatalog;

/// Print the catalog the probe would run with, after loading and validation.
pub fn run(config_path: Option<&Path>, log_level: Option<String>) -> Result<()> {
    let config = super::load_config(config_path, log_level)?;
    super::init_tracing(&config.log_level, false);

    let catalog = CommandCatalog::load_or_builtin(config.catalog.as_deref())
        .context("loading command catalog")?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}
