//! Configuration management for macrorec.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hotkey::Hotkeys;
use crate::keysym::KeySym;
use crate::playback::LoopCount;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the platform config and data dirs.
const APP_DIR_NAME: &str = "macrorec";

/// Subdirectory of the data dir holding saved macros.
const MACROS_DIR_NAME: &str = "macros";

/// Prefix for environment overrides, e.g. `MACROREC_HOTKEYS__ABORT_PLAYBACK`.
const ENV_PREFIX: &str = "MACROREC_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MACROREC_`, sections separated
///    by `__`)
/// 2. TOML config file at `~/.config/macrorec/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control key configuration.
    pub hotkeys: HotkeyConfig,
    /// Where macros are kept.
    pub storage: StorageConfig,
    /// Playback defaults.
    pub playback: PlaybackConfig,
}

/// Control keys, as key-symbol names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Key that ends a recording.
    pub stop_recording: String,
    /// Key that aborts a playback.
    pub abort_playback: String,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for saved macros.
    /// Defaults to `~/.local/share/macrorec/macros`
    pub macros_dir: Option<PathBuf>,
}

/// Playback-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Loop count used when none is given. `0` repeats until aborted.
    pub default_loops: u32,
    /// How often the front-end checks whether playback has finished.
    pub poll_interval_ms: u64,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        let keys = Hotkeys::default();
        Self {
            stop_recording: keys.stop_recording.encode(),
            abort_playback: keys.abort_playback.encode(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_loops: 1,
            poll_interval_ms: 100,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and the environment apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let hotkeys = self.hotkeys()?;
        if hotkeys.stop_recording == hotkeys.abort_playback {
            return Err(Error::config_validation(format!(
                "stop_recording and abort_playback must differ (both are '{}')",
                hotkeys.stop_recording
            )));
        }

        if self.playback.poll_interval_ms == 0 {
            return Err(Error::config_validation(
                "poll_interval_ms must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Decode the configured hotkeys.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a hotkey is not a known key name or a
    /// single character.
    pub fn hotkeys(&self) -> Result<Hotkeys> {
        Ok(Hotkeys {
            stop_recording: decode_hotkey("stop_recording", &self.hotkeys.stop_recording)?,
            abort_playback: decode_hotkey("abort_playback", &self.hotkeys.abort_playback)?,
        })
    }

    /// Get the macros directory, resolving defaults if not set.
    #[must_use]
    pub fn macros_dir(&self) -> PathBuf {
        self.storage
            .macros_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(MACROS_DIR_NAME))
    }

    /// The loop count used when the caller gives none.
    #[must_use]
    pub fn default_loops(&self) -> LoopCount {
        LoopCount::new(self.playback.default_loops)
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.playback.poll_interval_ms)
    }
}

fn decode_hotkey(field: &str, name: &str) -> Result<KeySym> {
    let key = KeySym::decode(name);
    if key.is_literal() {
        return Err(Error::config_validation(format!(
            "hotkeys.{field}: '{name}' is not a key name or a single character"
        )));
    }
    Ok(key)
}
