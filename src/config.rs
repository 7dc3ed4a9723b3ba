//! Host configuration, loaded from a TOML file.
//!
//! ```toml
//! [mqtt]
//! broker_address = "homeassistant.local"
//! broker_port = 1883
//!
//! [host]
//! offline_on_exit = false
//! ```
//!
//! A missing file is not an error: the announcer then targets
//! `localhost:1883`, the same way a fresh installation would.

use crate::mqtt::config::MqttConfig;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_ENV: &str = "BOOKITNOW_CONFIG";
const CONFIG_DIR: &str = "bookitnow";
const CONFIG_FILE: &str = "announcer.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    pub host: HostConfig,
}

/// Behaviour of the host binary around the announcer.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    /// Publish a retained `OFFLINE` before disconnecting on exit
    pub offline_on_exit: bool,
}

impl AppConfig {
    /// Command line argument, then `$BOOKITNOW_CONFIG`, then the user config dir.
    pub fn resolve_path(cli_arg: Option<PathBuf>) -> PathBuf {
        cli_arg
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(default_config_path)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}
