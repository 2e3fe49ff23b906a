use std::path::{Path, PathBuf};

use toolchat_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::model::AppConfig;

const CONFIG_DIR: &str = ".toolchat";
const CONFIG_FILE: &str = "config.yml";

/// Loads [`AppConfig`] from YAML, falling back to defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    /// `~/.toolchat/config.yml`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path` when given, otherwise from the default location if it
    /// exists, otherwise defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(default) => Self::from_file(&default)?,
                None => {
                    debug!("no config file found, using defaults");
                    AppConfig::default()
                }
            },
        };
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<AppConfig> {
        if contents.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(contents).map_err(|e| Error::Config(format!("invalid YAML: {e}")))
    }

    /// Apply `TOOLCHAT_HOST` / `TOOLCHAT_PORT` using the given variable lookup.
    pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TOOLCHAT_HOST").filter(|h| !h.trim().is_empty()) {
            config.gateway.host = host.trim().to_string();
        }
        if let Some(port) = lookup("TOOLCHAT_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.gateway.port = port,
                Err(_) => warn!("ignoring invalid TOOLCHAT_PORT value '{}'", port),
            }
        }
    }
}
