//! Client configuration.
//!
//! Holds the backend base address, the login entry point the UI navigates
//! to when a session dies, and the location of the durable session file.
//!
//! Configuration is stored at `~/.config/joblane/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "joblane";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Durable session record file name
const SESSION_FILE: &str = "session.json";

/// Production backend, used when no override is configured
const DEFAULT_API_URL: &str = "https://joblane-backend-0eqs.onrender.com/api";

/// Login entry point for unrecoverable auth failures
const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub login_path: String,
    /// Override for the durable session file; defaults to the config dir.
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            session_file: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Build a config from the environment, falling back to defaults.
    /// `JOBLANE_API_URL` overrides the backend address.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("JOBLANE_API_URL") {
            config.api_base_url = url;
        }
        config
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Path of the durable session record.
    pub fn session_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.session_file {
            return Ok(path.clone());
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(SESSION_FILE))
    }
}
