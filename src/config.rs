use anyhow::{Context, Result};
use directories::ProjectDirs;
use fitrs_vision::Tuning;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(path) = option_env!("FITRS_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "fitrs")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("fitrs.toml"))
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog file; the built-in catalog is used when unset.
    pub catalog: Option<PathBuf>,
    /// Directory holding the product sprite PNGs.
    pub sprite_dir: PathBuf,
    pub tuning: Tuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            sprite_dir: PathBuf::from("accessories"),
            tuning: Tuning::default(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(CONFIG_PATH.as_path());
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(CONFIG_PATH.as_path());
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
