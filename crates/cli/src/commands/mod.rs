pub mod deploy;
pub mod serve;

use anyhow::{Context, Result};
use sitedrop_core::RelayConfig;
use std::path::Path;

/// Load the config file (explicit or default) and apply environment overrides
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let config = match path {
        Some(path) => sitedrop_core::load_config(Some(path))
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => sitedrop_core::load_config(None).context("Failed to load sitedrop.toml")?,
    };

    config
        .with_env(|key| std::env::var(key).ok())
        .context("Invalid environment configuration")
}
