//! Runtime configuration.

use crate::error::{Error, Result};
use crate::keycode::{VK_ESCAPE, VK_F11, VK_F12};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up by [`Config::load_default`].
pub const DEFAULT_CONFIG_FILE: &str = "inputloop.toml";

/// Size of the replay engine's injection batch.
pub const BATCH_CAPACITY: usize = 16;

/// Most entries a single mouse report can add to a batch
/// (move, three buttons, wheel).
pub const MAX_ENTRIES_PER_REPORT: usize = 5;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control key bindings.
    pub controls: ControlKeys,
    /// Replay engine tuning.
    pub replay: ReplayConfig,
    /// Initial toggle states.
    pub startup: StartupConfig,
}

/// Virtual key codes intercepted as program controls.
///
/// Control keys are swallowed on key-down and never replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlKeys {
    /// Toggles the block-all-input master switch.
    pub toggle_block: u32,
    /// Toggles throughput reporting.
    pub toggle_profiling: u32,
    /// Requests shutdown.
    pub shutdown: u32,
}

/// Replay engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Batch length at which the engine submits to the injection facility.
    pub flush_threshold: usize,
    /// Sleep after an iteration that drained nothing (ms).
    pub poll_interval_ms: u64,
    /// Throughput reporting window (ms).
    pub profile_interval_ms: u64,
}

/// Initial values of the runtime toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Start with capture blocked.
    pub blocked: bool,
    /// Start with throughput reporting enabled.
    pub profiling: bool,
}

impl Default for ControlKeys {
    fn default() -> Self {
        Self {
            toggle_block: VK_F12,
            toggle_profiling: VK_F11,
            shutdown: VK_ESCAPE,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 10,
            poll_interval_ms: 1,
            profile_interval_ms: 1000,
        }
    }
}

impl ReplayConfig {
    /// Idle sleep as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Throughput window as a [`Duration`].
    pub fn profile_interval(&self) -> Duration {
        Duration::from_millis(self.profile_interval_ms)
    }
}

impl Config {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        let keys = [
            ("toggle_block", self.controls.toggle_block),
            ("toggle_profiling", self.controls.toggle_profiling),
            ("shutdown", self.controls.shutdown),
        ];
        for (name, code) in keys {
            if code == 0 || code > 0xFE {
                return Err(Error::Config(format!(
                    "controls.{name} must be a virtual key code in 1..=254, got {code}"
                )));
            }
        }
        if keys[0].1 == keys[1].1 || keys[0].1 == keys[2].1 || keys[1].1 == keys[2].1 {
            return Err(Error::Config("control keys must be distinct".to_string()));
        }

        let max_threshold = BATCH_CAPACITY - MAX_ENTRIES_PER_REPORT + 1;
        if !(1..=max_threshold).contains(&self.replay.flush_threshold) {
            return Err(Error::Config(format!(
                "replay.flush_threshold must be in 1..={max_threshold}, got {}",
                self.replay.flush_threshold
            )));
        }
        if self.replay.profile_interval_ms == 0 {
            return Err(Error::Config(
                "replay.profile_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load [`DEFAULT_CONFIG_FILE`] if present, otherwise the defaults.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Location consulted by [`Config::load_default`].
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// TOML representation.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
