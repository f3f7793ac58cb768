use crate::errors::{CortexError, CortexResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub sender: String,
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://rtgcortex-ai.onrender.com".to_string(),
            sender: "User".to_string(),
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

pub fn initialize_config() -> CortexResult<()> {
    let config_path = get_config_path()?;

    let mut config = if config_path.exists() {
        let config_str = fs::read_to_string(&config_path)
            .map_err(|e| CortexError::config_error(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&config_str)
            .map_err(|e| CortexError::config_error(format!("Failed to parse config: {}", e)))?
    } else {
        let config = Config::default();

        fs::create_dir_all(config_path.parent().unwrap()).map_err(|e| {
            CortexError::config_error(format!("Failed to create config directory: {}", e))
        })?;

        let config_str = serde_json::to_string_pretty(&config)
            .map_err(|e| CortexError::config_error(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, config_str)
            .map_err(|e| CortexError::config_error(format!("Failed to write config file: {}", e)))?;

        config
    };

    // Env var wins over the file for the endpoint.
    if let Ok(url) = env::var("CORTEX_BASE_URL") {
        config.base_url = url;
    }

    validate_config(&config)?;

    *CONFIG.write().unwrap() = config;

    Ok(())
}

fn get_config_path() -> CortexResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| CortexError::config_error("Could not determine home directory"))?;

    Ok(home_dir.join(".config").join("cortex").join("config.json"))
}

fn validate_config(config: &Config) -> CortexResult<()> {
    if config.base_url.is_empty() {
        return Err(CortexError::config_error("base_url is required"));
    }

    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(CortexError::config_error(
            "base_url must start with http:// or https://",
        ));
    }

    if config.sender.is_empty() {
        return Err(CortexError::config_error("sender name is required"));
    }

    Ok(())
}

pub fn get_config() -> Config {
    CONFIG.read().unwrap().clone()
}

/// Directory for the session store and log files. Falls back to the
/// platform data dir, then to the current directory.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = get_config().data_dir {
        return dir;
    }

    dirs::data_dir()
        .map(|d| d.join("cortex"))
        .unwrap_or_else(|| PathBuf::from(".cortex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_config_empty_base_url() {
        let mut config = Config::default();
        config.base_url = "".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_rejects_bare_host() {
        let mut config = Config::default();
        config.base_url = "rtgcortex-ai.onrender.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_empty_sender() {
        let mut config = Config::default();
        config.sender = "".to_string();
        assert!(validate_config(&config).is_err());
    }
}
