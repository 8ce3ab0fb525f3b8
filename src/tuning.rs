//! Data-driven game balance
//!
//! Physics and timing knobs, loaded as part of [`crate::Settings`]. Defaults
//! come from [`crate::consts`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::SettingsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Height of the visible play field (pixels)
    pub play_field_height: f32,
    /// Blocks below `play_field_height - floor_margin` have landed
    pub floor_margin: f32,
    /// Vertical position of freshly spawned blocks
    pub spawn_y: f32,
    /// Pixels per tick at difficulty 1.0
    pub base_gravity: f32,
    /// Gravity tick period in milliseconds
    pub tick_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            play_field_height: PLAY_FIELD_HEIGHT,
            floor_margin: FLOOR_MARGIN,
            spawn_y: SPAWN_Y,
            base_gravity: BASE_GRAVITY,
            tick_ms: TICK_MS,
        }
    }
}

impl Tuning {
    /// Vertical position past which a block has landed
    pub fn floor_y(&self) -> f32 {
        self.play_field_height - self.floor_margin
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.play_field_height > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "play_field_height must be positive, got {}",
                self.play_field_height
            )));
        }
        if !(self.floor_margin >= 0.0 && self.floor_margin < self.play_field_height) {
            return Err(SettingsError::Invalid(format!(
                "floor_margin must be in [0, {}), got {}",
                self.play_field_height, self.floor_margin
            )));
        }
        if !(self.spawn_y < self.floor_y()) {
            return Err(SettingsError::Invalid(format!(
                "spawn_y {} is already past the floor",
                self.spawn_y
            )));
        }
        if !(self.base_gravity > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "base_gravity must be positive, got {}",
                self.base_gravity
            )));
        }
        if self.tick_ms == 0 {
            return Err(SettingsError::Invalid("tick_ms must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.floor_y(), PLAY_FIELD_HEIGHT - FLOOR_MARGIN);
        assert_eq!(tuning.tick_period(), Duration::from_millis(16));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            Tuning {
                base_gravity: 0.0,
                ..Tuning::default()
            },
            Tuning {
                tick_ms: 0,
                ..Tuning::default()
            },
            Tuning {
                floor_margin: 700.0,
                ..Tuning::default()
            },
            Tuning {
                play_field_height: f32::NAN,
                ..Tuning::default()
            },
            Tuning {
                spawn_y: 560.0,
                ..Tuning::default()
            },
        ];
        for tuning in bad {
            assert!(
                matches!(tuning.validate(), Err(SettingsError::Invalid(_))),
                "{tuning:?}"
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"base_gravity": 1.5}"#).unwrap();
        assert_eq!(tuning.base_gravity, 1.5);
        assert_eq!(tuning.tick_ms, TICK_MS);
    }
}
