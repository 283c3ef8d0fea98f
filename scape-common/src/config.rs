//! Bootstrap configuration loading and config file resolution
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`<config_dir>/scape/config.toml`)
//! 4. Built-in defaults (fallback)
//!
//! A config file named explicitly on the command line must load; a file that
//! was only discovered (environment or config directory) degrades to the
//! built-in defaults with a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SCAPE_CONFIG";

/// Default interval between simulated fixes when timestamps are absent
pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 1.0;

/// Distance a fix must move away from the significant-change origin before it is reported
pub const DEFAULT_SIGNIFICANT_CHANGE_DISTANCE_M: f64 = 40.0;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Directory holding recorded and imported GPX files
    pub gpx_directory: Option<PathBuf>,

    /// GPX simulator settings
    pub simulator: SimulatorConfig,

    /// Audio asset and gain settings
    pub audio: AudioConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// GPX simulator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seconds between fixes when timestamps are missing or closer than this
    pub tick_interval_secs: f64,

    /// Derive missing course values from the bearing between points
    pub synthesize_course: bool,

    /// Derive missing speed values from the distance between points
    pub synthesize_speed: bool,

    /// Minimum movement (meters) reported while monitoring significant changes
    pub significant_change_distance_m: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            synthesize_course: true,
            synthesize_speed: true,
            significant_change_distance_m: DEFAULT_SIGNIFICANT_CHANGE_DISTANCE_M,
        }
    }
}

/// Audio asset and gain settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory of named audio assets (optional)
    pub asset_directory: Option<PathBuf>,

    /// File extension of audio assets
    pub asset_extension: String,

    /// Global EQ gain (dB) for earcons and generic sounds
    pub afx_gain: f32,

    /// Global EQ gain (dB) for beacons
    pub beacon_gain: f32,

    /// Global EQ gain (dB) for speech
    pub tts_gain: f32,

    /// Preferred speech voice identifier
    pub voice_id: Option<String>,

    /// JSON file with per-voice EQ filters (optional)
    pub voice_filters: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            asset_directory: None,
            asset_extension: "wav".to_string(),
            afx_gain: 0.0,
            beacon_gain: 0.0,
            tts_gain: 0.0,
            voice_id: None,
            voice_filters: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration following the priority order
    ///
    /// Only an explicitly named file propagates load errors.
    pub fn load_or_default(cli_arg: Option<&Path>, env_var_name: &str) -> Result<Self> {
        if let Some(path) = cli_arg {
            info!("Loading config from {}", path.display());
            return Self::load(path);
        }

        let Some(path) = resolve_config_path(None, env_var_name) else {
            info!("No config file found, using built-in defaults");
            return Ok(Self::default());
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// GPX directory from config or the OS-dependent default
    pub fn gpx_directory(&self) -> PathBuf {
        self.gpx_directory
            .clone()
            .unwrap_or_else(default_gpx_directory)
    }

    fn validate(&self) -> Result<()> {
        let tick = self.simulator.tick_interval_secs;
        if !tick.is_finite() || tick <= 0.0 {
            return Err(Error::Config(format!(
                "simulator.tick_interval_secs must be positive, got {}",
                tick
            )));
        }

        let distance = self.simulator.significant_change_distance_m;
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::Config(format!(
                "simulator.significant_change_distance_m must be non-negative, got {}",
                distance
            )));
        }

        Ok(())
    }
}

/// Find the config file path without loading it
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    let user_config = dirs::config_dir().map(|d| d.join("scape").join("config.toml"))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Get OS-dependent default GPX directory
pub fn default_gpx_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scape").join("gpx"))
        .unwrap_or_else(|| PathBuf::from("./scape_data/gpx"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.simulator.tick_interval_secs, 1.0);
        assert!(config.simulator.synthesize_course);
        assert!(config.simulator.synthesize_speed);
        assert_eq!(config.simulator.significant_change_distance_m, 40.0);
        assert_eq!(config.audio.asset_extension, "wav");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [simulator]
            tick_interval_secs = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.simulator.tick_interval_secs, 0.5);
        assert!(config.simulator.synthesize_speed);
        assert!(config.gpx_directory.is_none());
    }

    #[test]
    fn test_rejects_non_positive_tick() {
        let result = TomlConfig::from_toml_str(
            r#"
            [simulator]
            tick_interval_secs = 0.0
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = TomlConfig::from_toml_str("[simulator\ntick = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_path_wins() {
        let path = PathBuf::from("/tmp/scape-cli.toml");
        assert_eq!(resolve_config_path(Some(&path), "SCAPE_UNUSED_VAR"), Some(path));
    }
}
