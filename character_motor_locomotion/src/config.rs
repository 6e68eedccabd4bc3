use std::fmt;
use std::fs;
use std::path::Path;

use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

/// Per-character tuning. Constant for the lifetime of a controller instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Planar speed ceiling in units/sec.
    pub top_speed: Real,
    /// Speed gained per second while moving below `top_speed`.
    pub acceleration_rate: Real,
    /// Speed lost per second while coasting.
    pub deceleration_rate: Real,
    /// Blend rate for velocity re-alignment and facing rotation.
    pub turn_speed: Real,
    /// Blend rate for the movement heading while at speed.
    pub steering_speed: Real,
    pub gravity: Real,
    /// Vertical velocity held while standing; must be <= 0.
    pub grounded_gravity: Real,
    pub jump_force: Real,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            top_speed: 40.0,
            acceleration_rate: 10.0,
            deceleration_rate: 15.0,
            turn_speed: 8.0,
            steering_speed: 2.0,
            gravity: 50.0,
            grounded_gravity: -10.0,
            jump_force: 10.0,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "locomotion config io error: {}", err),
            ConfigError::Parse(err) => write!(f, "locomotion config parse error: {}", err),
            ConfigError::Invalid { field, reason } => {
                write!(f, "locomotion config field `{}` {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl LocomotionConfig {
    pub fn parse_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::parse_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("top_speed", self.top_speed),
            ("acceleration_rate", self.acceleration_rate),
            ("deceleration_rate", self.deceleration_rate),
            ("turn_speed", self.turn_speed),
            ("steering_speed", self.steering_speed),
            ("gravity", self.gravity),
            ("jump_force", self.jump_force),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be finite",
                });
            }
            if value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be >= 0",
                });
            }
        }
        if !self.grounded_gravity.is_finite() {
            return Err(ConfigError::Invalid {
                field: "grounded_gravity",
                reason: "must be finite",
            });
        }
        if self.grounded_gravity > 0.0 {
            return Err(ConfigError::Invalid {
                field: "grounded_gravity",
                reason: "must be <= 0",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_tuning_matches_defaults() {
        let text = include_str!("../../tools/configs/locomotion.toml");
        let config = LocomotionConfig::parse_toml(text).expect("parse");
        assert_eq!(config, LocomotionConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = LocomotionConfig::parse_toml("top_speed = 12.5\njump_force = 6.0\n")
            .expect("parse");
        assert_eq!(config.top_speed, 12.5);
        assert_eq!(config.jump_force, 6.0);
        assert_eq!(config.gravity, LocomotionConfig::default().gravity);
    }

    #[test]
    fn toml_roundtrip_preserves_tuning() {
        let config = LocomotionConfig {
            steering_speed: 3.25,
            ..Default::default()
        };
        let text = config.to_toml().expect("serialize");
        assert_eq!(LocomotionConfig::parse_toml(&text).expect("parse"), config);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = LocomotionConfig::parse_toml("top_speed = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_flags_bad_fields() {
        assert!(LocomotionConfig::default().validate().is_ok());

        let negative = LocomotionConfig {
            deceleration_rate: -1.0,
            ..Default::default()
        };
        match negative.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "deceleration_rate"),
            other => panic!("unexpected {:?}", other),
        }

        let floating = LocomotionConfig {
            grounded_gravity: 2.0,
            ..Default::default()
        };
        assert!(floating.validate().is_err());

        let nan = LocomotionConfig {
            top_speed: Real::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }
}
