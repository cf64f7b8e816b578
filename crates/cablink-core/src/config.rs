//! Configuration loading and typed config structures for cablink.
//!
//! The configuration lives in `cablink.yaml` next to the engine binary.
//! Every section and field has a default, so a missing key (or a missing
//! file, at the caller's discretion) still yields a working setup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::directory::ControlStyle;

/// Environment variable that overrides [`ChannelConfig::url`].
pub const URL_ENV_VAR: &str = "CABLINK_URL";

/// Why a bridge layout could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The layout file exists but could not be read, or is missing when
    /// the caller asked for it explicitly.
    #[error("cannot read bridge layout {}: {source}", path.display())]
    Unreadable {
        /// File that was opened.
        path: PathBuf,
        /// What the filesystem reported.
        source: std::io::Error,
    },

    /// The document does not describe a [`BridgeConfig`]: broken YAML, a
    /// wrong field type, or an unknown control style.
    #[error("invalid bridge layout: {source}")]
    Invalid {
        /// Where deserialization stopped.
        #[from]
        source: serde_yml::Error,
    },
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BridgeConfig {
    /// Message channel settings.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Tick loop settings.
    #[serde(default)]
    pub tick: TickConfig,

    /// Virtual cab layout.
    #[serde(default)]
    pub cab: CabConfig,
}

impl BridgeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `CABLINK_URL` overrides `channel.url` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] if the file cannot be read, or
    /// [`ConfigError::Invalid`] if it does not describe a layout.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the string does not describe a
    /// layout.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.channel.apply_env_overrides();
        Ok(config)
    }
}

/// Message channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    /// WebSocket URL of the controller.
    #[serde(default = "default_url")]
    pub url: String,

    /// Delay before retrying a failed connection attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Capacity of the outgoing message queue.
    #[serde(default = "default_outgoing_capacity")]
    pub outgoing_capacity: usize,
}

impl ChannelConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            self.url = url;
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            outgoing_capacity: default_outgoing_capacity(),
        }
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TickConfig {
    /// Real-time milliseconds between simulation ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub interval_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Layout of the virtual cab.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CabConfig {
    /// Raw side flag of the occupied seat; absent means no seat attached.
    #[serde(default = "default_seat_side")]
    pub seat_side: Option<u8>,

    /// Actuators installed in the cab.
    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

/// One virtual actuator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActuatorConfig {
    /// Concrete actuator name, as resolved from a control identifier.
    pub name: String,

    /// Input identifier reported in value-change events. Empty means none.
    #[serde(default)]
    pub input_identifier: String,

    /// How the actuator accepts input.
    #[serde(default = "default_style")]
    pub style: ControlStyle,

    /// Value at startup.
    #[serde(default)]
    pub initial: f32,

    /// Lowest reachable value.
    #[serde(default)]
    pub min: f32,

    /// Highest reachable value.
    #[serde(default = "default_max")]
    pub max: f32,

    /// Detent positions a continuous value snaps to; empty for none.
    #[serde(default)]
    pub notches: Vec<f32>,
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_url() -> String {
    "ws://127.0.0.1:63241".to_owned()
}

const fn default_reconnect_delay_ms() -> u64 {
    5000
}

const fn default_outgoing_capacity() -> usize {
    50
}

const fn default_tick_interval_ms() -> u64 {
    16
}

#[allow(clippy::unnecessary_wraps)]
const fn default_seat_side() -> Option<u8> {
    Some(0)
}

const fn default_style() -> ControlStyle {
    ControlStyle::Continuous
}

const fn default_max() -> f32 {
    1.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = BridgeConfig::parse("{}").unwrap();
        assert_eq!(config.tick.interval_ms, 16);
        assert_eq!(config.channel.reconnect_delay_ms, 5000);
        assert_eq!(config.channel.outgoing_capacity, 50);
        assert!(config.cab.actuators.is_empty());
    }

    #[test]
    fn parses_cab_layout() {
        let yaml = r"
tick:
  interval_ms: 33
cab:
  seat_side: 1
  actuators:
    - name: Throttle_B
      input_identifier: Throttle
      initial: 0.25
      notches: [0.0, 0.5, 1.0]
    - name: Horn
      input_identifier: Horn
      style: discrete
    - name: Dial
      style: unsupported
      min: -1.0
      max: 2.0
";
        let config = BridgeConfig::parse(yaml).unwrap();
        assert_eq!(config.tick.interval_ms, 33);
        assert_eq!(config.cab.seat_side, Some(1));
        assert_eq!(config.cab.actuators.len(), 3);

        let throttle = config.cab.actuators.first().unwrap();
        assert_eq!(throttle.style, ControlStyle::Continuous);
        assert_eq!(throttle.initial, 0.25);
        assert_eq!(throttle.max, 1.0);
        assert_eq!(throttle.notches, vec![0.0, 0.5, 1.0]);

        let horn = config.cab.actuators.get(1).unwrap();
        assert_eq!(horn.style, ControlStyle::Discrete);

        let dial = config.cab.actuators.get(2).unwrap();
        assert_eq!(dial.style, ControlStyle::Unsupported);
        assert_eq!(dial.input_identifier, "");
        assert_eq!(dial.min, -1.0);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = BridgeConfig::parse("tick: [unclosed");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_style_is_an_invalid_layout() {
        let yaml = "cab:\n  actuators:\n    - name: horn\n      style: lever\n";
        let err = BridgeConfig::parse(yaml).unwrap_err();
        assert!(err.to_string().starts_with("invalid bridge layout: "));
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("does/not/exist/cablink.yaml");
        let err = BridgeConfig::from_file(path).unwrap_err();
        let ConfigError::Unreadable { path: reported, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(reported, path);
        assert!(err.to_string().contains("does/not/exist/cablink.yaml"));
    }
}
