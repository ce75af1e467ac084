// User configuration
// Display and runtime preferences persisted as TOML in the per-user config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const APP_NAME: &str = "mswpr";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// User preferences. Board size and mine count are fixed and not part of it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub language: String,      // "en" or "zh"
    pub unicode_icons: bool,   // ☼/⚑ instead of M/F
    pub tick_ms: u64,          // Frame interval in milliseconds
    pub show_debug: bool,      // Start with the TPS/FPS overlay visible
    pub log_level: String,     // off, error, warn, info, debug, trace
}

impl Default for Config {
    fn default() -> Self {
        // Auto-detect system language on first run
        let system_lang = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
        let lang = if system_lang.to_lowercase().starts_with("zh") {
            "zh".to_string()
        } else {
            "en".to_string()
        };

        Config {
            language: lang,
            unicode_icons: false,
            tick_ms: 16,
            show_debug: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Frame interval, kept within a sane range
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(5, 200))
    }
}

/// Config file path, e.g. ~/.config/mswpr/mswpr.toml on Linux
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let proj = ProjectDirs::from("com", "mswpr", APP_NAME).ok_or(ConfigError::NoConfigDir)?;
    let mut path = proj.config_dir().to_path_buf();
    path.push(format!("{}.toml", APP_NAME));
    Ok(path)
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    Ok(toml::from_str::<Config>(&s)?)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let s = toml::to_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)?;
    Ok(())
}

/// Configuration in effect, plus a warning to log once the logger is up
pub struct LoadedConfig {
    pub config: Config,
    pub warning: Option<String>,
}

/// Load configuration from disk, writing defaults on first run.
/// Any failure falls back to defaults and is reported in `warning`.
pub fn load_or_create_config() -> LoadedConfig {
    match config_path() {
        Ok(path) => load_or_create_at(&path),
        Err(e) => LoadedConfig {
            config: Config::default(),
            warning: Some(format!("{}, using defaults", e)),
        },
    }
}

pub fn load_or_create_at(path: &Path) -> LoadedConfig {
    if path.exists() {
        return match load_config(path) {
            Ok(config) => LoadedConfig { config, warning: None },
            Err(e) => LoadedConfig {
                config: Config::default(),
                warning: Some(format!("Ignoring config at {}: {}", path.display(), e)),
            },
        };
    }
    let config = Config::default();
    let warning = save_config(path, &config)
        .err()
        .map(|e| format!("Cannot write default config to {}: {}", path.display(), e));
    LoadedConfig { config, warning }
}
