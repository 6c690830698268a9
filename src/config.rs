//! Configuration loader and validator
//!
//! Loads driver configuration from TOML files in the configs/ directory.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::wiimote::types::ReportMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Driver settings
    #[serde(default)]
    pub driver: DriverSettings,
}

/// Driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSettings {
    /// Report mode requested during bring-up
    #[serde(default = "default_report_mode")]
    pub report_mode: ReportMode,

    /// Ask the controller for continuous reports instead of on-change only
    #[serde(default)]
    pub continuous: bool,

    /// Player LED mask set during bring-up (low nibble)
    #[serde(default = "default_led_mask")]
    pub led_mask: u8,

    /// Capacity of the bounded event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            report_mode: default_report_mode(),
            continuous: false,
            led_mask: default_led_mask(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_report_mode() -> ReportMode {
    ReportMode::ButtonsAccelIr
}

fn default_led_mask() -> u8 {
    0x01
}

fn default_event_capacity() -> usize {
    100
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!("Loading configuration from: {}", path_ref.display());

        let content = std::fs::read_to_string(path_ref)?;
        let config: Config = toml::from_str(&content)?;

        debug!("  - Report mode: {:?}", config.driver.report_mode);
        debug!("  - Continuous: {}", config.driver.continuous);
        debug!("  - LED mask: 0b{:04b}", config.driver.led_mask);

        config.validate()?;
        info!("✓ Config validation passed");

        Ok(config)
    }

    /// Load default configuration from configs/default.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("configs/default.toml")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.led_mask > 0x0f {
            return Err(ConfigError::Invalid(format!(
                "led_mask 0b{:b} does not fit the 4-bit LED bank",
                self.driver.led_mask
            )));
        }

        if self.driver.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
