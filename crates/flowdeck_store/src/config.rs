// SPDX-License-Identifier: MIT OR Apache-2.0
//! Store configuration.
//!
//! Stored as RON. Every field is optional in the file and falls back to
//! its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the number of simulation events kept in the log
pub const MAX_EVENT_LOG_CAPACITY: usize = 100;

/// Default number of simulation events kept in the log
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = MAX_EVENT_LOG_CAPACITY;

/// Default time a node stays highlighted after a simulation event
pub const DEFAULT_ACTIVATION_WINDOW_MS: u64 = 1500;

/// Default offset applied to pasted nodes
pub const DEFAULT_PASTE_OFFSET: [f64; 2] = [50.0, 50.0];

/// Errors loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for this schema
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Config could not be serialized
    #[error("Config serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Event log capacity outside `1..=MAX_EVENT_LOG_CAPACITY`
    #[error("event_log_capacity must be between 1 and {max}, got {value}")]
    EventLogCapacity {
        /// Configured value
        value: usize,
        /// Largest accepted value
        max: usize,
    },
}

/// Tunables for [`crate::FlowStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of simulation events kept, newest first
    pub event_log_capacity: usize,
    /// How long a node stays active after its latest event, in milliseconds
    pub activation_window_ms: u64,
    /// Offset added to the clipboard position on paste
    pub paste_offset: [f64; 2],
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            activation_window_ms: DEFAULT_ACTIVATION_WINDOW_MS,
            paste_offset: DEFAULT_PASTE_OFFSET,
        }
    }
}

impl StoreConfig {
    /// Activation window as a duration
    pub fn activation_window(&self) -> Duration {
        Duration::from_millis(self.activation_window_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_EVENT_LOG_CAPACITY).contains(&self.event_log_capacity) {
            return Err(ConfigError::EventLogCapacity {
                value: self.event_log_capacity,
                max: MAX_EVENT_LOG_CAPACITY,
            });
        }
        Ok(())
    }

    /// Parse and validate a RON string
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty RON string
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded store config from {:?}", path);
        Ok(config)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved store config to {:?}", path);
        Ok(())
    }
}
