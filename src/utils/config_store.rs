//! ConfigStore - Local Configuration Storage

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::CONFIG_FILE_NAME;
use crate::domain::config::AppConfig;
use crate::error::Result;
use crate::helpers::get_or_create_config_dir;

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_or_create_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the config file, falling back to defaults when it does not exist
///
/// The result is not validated; apply overrides first, then call
/// [`AppConfig::validate`].
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save the config file as pretty TOML
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
