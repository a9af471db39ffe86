//! Daemon configuration
//!
//! JSON file under the platform config dir. Missing fields fall back to defaults,
//! out-of-range values are clamped with a warning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{self, validation::*};
use crate::types::Dimensions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory whose immediate subfolders become zones
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Layout file override (defaults to `<root_dir>/.layout.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_file: Option<PathBuf>,

    /// Available screen width used for default zone placement
    #[serde(default = "default_screen_width")]
    pub screen_width: i32,

    /// Available screen height used for default zone placement
    #[serde(default = "default_screen_height")]
    pub screen_height: i32,

    /// Window for coalescing filesystem events into one reconciliation pass
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub zone: ZoneSettings,
}

/// Grid and size settings for zone windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSettings {
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,
    #[serde(default = "default_zone_width")]
    pub width: i32,
    #[serde(default = "default_zone_height")]
    pub height: i32,
    #[serde(default = "default_margin")]
    pub margin: i32,
    #[serde(default = "default_min_width")]
    pub min_width: i32,
    #[serde(default = "default_min_height")]
    pub min_height: i32,
}

fn default_root_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(constants::config::ROOT_DIR_NAME);
    path
}

fn default_screen_width() -> i32 {
    constants::screen::DEFAULT_WIDTH
}

fn default_screen_height() -> i32 {
    constants::screen::DEFAULT_HEIGHT
}

fn default_debounce_ms() -> u64 {
    constants::timing::DEFAULT_DEBOUNCE_MS
}

fn default_grid_size() -> i32 {
    constants::zone::GRID_SIZE
}

fn default_zone_width() -> i32 {
    constants::zone::DEFAULT_WIDTH
}

fn default_zone_height() -> i32 {
    constants::zone::DEFAULT_HEIGHT
}

fn default_margin() -> i32 {
    constants::zone::MARGIN
}

fn default_min_width() -> i32 {
    constants::zone::MIN_WIDTH
}

fn default_min_height() -> i32 {
    constants::zone::MIN_HEIGHT
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            width: default_zone_width(),
            height: default_zone_height(),
            margin: default_margin(),
            min_width: default_min_width(),
            min_height: default_min_height(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            layout_file: None,
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            debounce_ms: default_debounce_ms(),
            zone: ZoneSettings::default(),
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(constants::config::APP_DIR);
        path.push(constants::config::FILENAME);
        path
    }

    /// Load configuration from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(path = %config_path.display(), "Config file not found, creating default config");
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;

        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", config_path))?;
        config.validate_and_clamp();

        info!(path = %config_path.display(), root = %config.root_dir.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(config_path, json)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        info!(path = %config_path.display(), "Saved config");
        Ok(())
    }

    /// Layout file location, inside the root unless overridden
    pub fn layout_path(&self) -> PathBuf {
        self.layout_file
            .clone()
            .unwrap_or_else(|| self.root_dir.join(constants::config::LAYOUT_FILENAME))
    }

    pub fn screen(&self) -> Dimensions {
        Dimensions::new(self.screen_width, self.screen_height)
    }

    /// Make root and layout paths absolute so they can serve as stable layout keys
    pub fn resolve_paths(&mut self) -> Result<()> {
        self.root_dir = std::path::absolute(&self.root_dir)
            .with_context(|| format!("Failed to resolve root directory {:?}", self.root_dir))?;
        if let Some(layout) = self.layout_file.take() {
            self.layout_file = Some(
                std::path::absolute(&layout)
                    .with_context(|| format!("Failed to resolve layout file {:?}", layout))?,
            );
        }
        Ok(())
    }

    /// Clamp values to sane ranges, logging every correction
    pub fn validate_and_clamp(&mut self) {
        let zone = &mut self.zone;

        if zone.grid_size < MIN_GRID_SIZE {
            warn!(grid_size = zone.grid_size, using = default_grid_size(), "grid_size below minimum, using default");
            zone.grid_size = default_grid_size();
        } else if zone.grid_size > MAX_GRID_SIZE {
            warn!(grid_size = zone.grid_size, max = MAX_GRID_SIZE, "grid_size exceeds maximum, clamping");
            zone.grid_size = MAX_GRID_SIZE;
        }

        clamp_dimension("zone.min_width", &mut zone.min_width, default_min_width());
        clamp_dimension("zone.min_height", &mut zone.min_height, default_min_height());
        clamp_dimension("zone.width", &mut zone.width, default_zone_width());
        clamp_dimension("zone.height", &mut zone.height, default_zone_height());

        if zone.width < zone.min_width {
            warn!(width = zone.width, min_width = zone.min_width, "zone width below min_width, raising");
            zone.width = zone.min_width;
        }
        if zone.height < zone.min_height {
            warn!(height = zone.height, min_height = zone.min_height, "zone height below min_height, raising");
            zone.height = zone.min_height;
        }

        if zone.margin < 0 || zone.margin > MAX_MARGIN {
            warn!(margin = zone.margin, using = default_margin(), "margin out of range, using default");
            zone.margin = default_margin();
        }

        clamp_dimension("screen_width", &mut self.screen_width, default_screen_width());
        clamp_dimension("screen_height", &mut self.screen_height, default_screen_height());

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            warn!(debounce_ms = self.debounce_ms, max = MAX_DEBOUNCE_MS, "debounce_ms exceeds maximum, clamping");
            self.debounce_ms = MAX_DEBOUNCE_MS;
        }
    }
}

fn clamp_dimension(field: &str, value: &mut i32, fallback: i32) {
    if *value < MIN_DIMENSION {
        warn!(field, value = *value, using = fallback, "value below minimum, using default");
        *value = fallback;
    } else if *value > MAX_DIMENSION {
        warn!(field, value = *value, max = MAX_DIMENSION, "value exceeds maximum, clamping");
        *value = MAX_DIMENSION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{ "root_dir": "/tmp/boox" }"#).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/tmp/boox"));
        assert_eq!(config.zone, ZoneSettings::default());
        assert_eq!(config.screen_width, 1920);
        assert_eq!(config.debounce_ms, 200);
    }

    #[test]
    fn test_layout_path_defaults_inside_root() {
        let config = Config {
            root_dir: PathBuf::from("/data/boox"),
            ..Config::default()
        };
        assert_eq!(config.layout_path(), PathBuf::from("/data/boox/.layout.json"));

        let overridden = Config {
            layout_file: Some(PathBuf::from("/elsewhere/layout.json")),
            ..config
        };
        assert_eq!(overridden.layout_path(), PathBuf::from("/elsewhere/layout.json"));
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut config = Config::default();
        config.zone.grid_size = 0;
        config.zone.width = 10;
        config.zone.min_height = 400;
        config.zone.margin = -5;
        config.screen_height = 100_000;
        config.debounce_ms = 60_000;

        config.validate_and_clamp();

        assert_eq!(config.zone.grid_size, 50);
        assert_eq!(config.zone.width, 200);
        // height raised to the configured minimum
        assert_eq!(config.zone.height, 400);
        assert_eq!(config.zone.margin, 50);
        assert_eq!(config.screen_height, MAX_DIMENSION);
        assert_eq!(config.debounce_ms, MAX_DEBOUNCE_MS);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
