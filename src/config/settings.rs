//! Application settings and link wiring

use crate::core::capture::EdgeCapture;
use crate::core::protocol::CARRIER_HZ;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Wiring and timing for one protocol link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Transmit pin (BCM numbering).
    pub tx_pin: u8,
    /// Receive pin (BCM numbering).
    pub rx_pin: u8,
    /// Carrier frequency in hertz.
    pub carrier_hz: u32,
    /// Fixed transmit/observation wait in milliseconds. Must exceed the
    /// worst-case waveform duration; the driver extends it if not.
    pub tx_wait_ms: u64,
    /// Edge capture bound for one receive window.
    pub capture_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            tx_pin: 4,
            rx_pin: 12,
            carrier_hz: CARRIER_HZ,
            tx_wait_ms: 1000,
            capture_capacity: EdgeCapture::DEFAULT_CAPACITY,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Link wiring and timing.
    pub link: LinkConfig,
}

impl AppConfig {
    /// Load config from the default config file.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = super::config_dir()
            .ok_or("Could not determine config directory")?
            .join("config.toml");

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        if config.link.carrier_hz == 0 {
            return Err("carrier_hz must be non-zero".into());
        }
        Ok(config)
    }

    /// Save config to the default config file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = super::config_dir()
            .ok_or("Could not determine config directory")?
            .join("config.toml");
        self.save_to(&config_path)
    }

    /// Save config to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = LinkConfig::default();
        assert_eq!(config.carrier_hz, 2500);
        assert_eq!(config.tx_pin, 4);
        assert_eq!(config.rx_pin, 12);
        assert_eq!(config.tx_wait_ms, 1000);
    }

    #[test]
    fn test_zero_carrier_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.link.carrier_hz = 0;
        config.save_to(&path).unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.link.carrier_hz = 1250;
        config.link.tx_wait_ms = 250;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.link.carrier_hz, 1250);
        assert_eq!(loaded.link.tx_wait_ms, 250);
        assert_eq!(loaded.link.tx_pin, 4);
    }
}
