//! Session tuning
//!
//! Durations are kept in milliseconds so a config file stays plain numbers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{protocol::ObdProtocol, Error, Result};

/// Timing and calibration for one adapter session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long to wait for the `>` prompt after a request
    pub frame_timeout_ms: u64,
    /// Sleep between checks when the adapter has nothing to read
    pub poll_interval_ms: u64,
    /// Fixed wait before reading a handshake reply
    pub simple_settle_ms: u64,
    /// Protocol forced during the handshake
    pub protocol: ObdProtocol,
    /// Wait after selecting the protocol, before the `0100` probe
    pub handshake_settle_ms: u64,
    /// Wait after clearing codes, before reading them back
    pub clear_settle_ms: u64,
    pub idle_delay_ms: u64,
    pub dashboard_delay_ms: u64,
    pub fuel_delay_ms: u64,
    pub custom_scan_delay_ms: u64,
    /// Consecutive frame timeouts after which the connection counts as lost; 0 disables
    pub timeout_limit: u32,
    pub fuel: FuelConfig,
}

/// Calibration of the fuel economy estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    /// Fuel density in grams per litre
    pub fuel_density_g_per_l: f64,
    /// Air to fuel mass ratio
    pub air_fuel_ratio: f64,
    /// Number of instantaneous samples averaged into the smoothed consumption
    pub window_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frame_timeout_ms: 5000,
            poll_interval_ms: 20,
            simple_settle_ms: 300,
            protocol: ObdProtocol::Iso15765_4Can11bit500,
            handshake_settle_ms: 500,
            clear_settle_ms: 1000,
            idle_delay_ms: 1000,
            dashboard_delay_ms: 500,
            fuel_delay_ms: 1000,
            custom_scan_delay_ms: 1000,
            timeout_limit: 3,
            fuel: FuelConfig::default(),
        }
    }
}

impl Default for FuelConfig {
    fn default() -> Self {
        FuelConfig {
            fuel_density_g_per_l: 745.0,
            air_fuel_ratio: 14.7,
            window_size: 12,
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_timeout_ms == 0 {
            return Err(Error::Config("frame_timeout_ms must be positive".to_owned()));
        }
        self.fuel.validate()
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn simple_settle(&self) -> Duration {
        Duration::from_millis(self.simple_settle_ms)
    }

    pub fn handshake_settle(&self) -> Duration {
        Duration::from_millis(self.handshake_settle_ms)
    }

    pub fn clear_settle(&self) -> Duration {
        Duration::from_millis(self.clear_settle_ms)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn dashboard_delay(&self) -> Duration {
        Duration::from_millis(self.dashboard_delay_ms)
    }

    pub fn fuel_delay(&self) -> Duration {
        Duration::from_millis(self.fuel_delay_ms)
    }

    pub fn custom_scan_delay(&self) -> Duration {
        Duration::from_millis(self.custom_scan_delay_ms)
    }

    /// Short timings so tests do not sit in delays
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            frame_timeout_ms: 200,
            poll_interval_ms: 1,
            simple_settle_ms: 0,
            handshake_settle_ms: 0,
            clear_settle_ms: 0,
            idle_delay_ms: 1,
            dashboard_delay_ms: 0,
            fuel_delay_ms: 0,
            custom_scan_delay_ms: 0,
            ..Config::default()
        }
    }
}

impl FuelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fuel_density_g_per_l.is_nan() || self.fuel_density_g_per_l <= 0.0 {
            return Err(Error::Config(
                "fuel_density_g_per_l must be positive".to_owned(),
            ));
        }
        if self.air_fuel_ratio.is_nan() || self.air_fuel_ratio <= 0.0 {
            return Err(Error::Config("air_fuel_ratio must be positive".to_owned()));
        }
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be at least 1".to_owned()));
        }
        Ok(())
    }
}
