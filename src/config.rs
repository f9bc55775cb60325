//! Configuration management for meters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{MeterError, Result};
use crate::meter::{DecayKind, RateMeter};

/// Configuration for a single meter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Decay window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Decay shape
    #[serde(default)]
    pub decay: DecayKind,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            decay: DecayKind::default(),
        }
    }
}

fn default_window_ms() -> u64 {
    1000
}

impl MeterConfig {
    /// The configured window as a duration.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Build a meter from this configuration.
    pub fn build(&self) -> Result<RateMeter> {
        RateMeter::try_new(self.window(), self.decay)
    }
}

/// Configuration for a set of named meters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Map of meter name to meter configuration
    #[serde(default)]
    pub meters: HashMap<String, MeterConfig>,
}

impl RegistryConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading meter configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| MeterError::Config(format!("Failed to parse meter config: {}", e)))
    }
}
