//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod preprocess;
pub mod process;
pub mod serve;
pub mod text;

use std::path::{Path, PathBuf};

use tracing::debug;

use invox_core::models::config::InvoxConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invox")
        .join("config.json")
}

/// The config file a command should read and write.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration: an explicit path must exist, the default one may not.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvoxConfig> {
    let config = match config_path {
        Some(path) => InvoxConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                InvoxConfig::from_file(&path)?
            } else {
                InvoxConfig::default()
            }
        }
    };

    Ok(config.with_env_overrides())
}
