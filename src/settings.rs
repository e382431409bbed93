//! Simulation settings
//!
//! Every section is `#[serde(default)]` so a partial JSON file only needs to
//! name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Friction, restitution and cue parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Gravitational acceleration (m/s²)
    pub gravity: f32,
    /// Rolling friction coefficient
    pub mu_roll: f32,
    /// Sliding friction coefficient
    pub mu_slide: f32,
    /// Contact-point speed below which a grounded ball counts as rolling
    pub rolling_threshold: f32,
    /// Linear and angular speed below which a ball is put to sleep
    pub sleep_threshold: f32,
    /// Side-spin removed per tick while rolling (rad/s)
    pub side_spin_bleed: f32,
    /// Downward speed needed to bounce off the felt
    pub bounce_threshold: f32,
    /// Fraction of vertical speed kept after a felt bounce
    pub bounce_damping: f32,
    /// Vertical speed below which an airborne ball settles on the felt
    pub settle_threshold: f32,

    // === Cushions ===
    /// Velocity kept after a cushion reflection
    pub cushion_restitution: f32,
    /// Angular velocity kept after a cushion hit
    pub cushion_spin_damping: f32,

    // === Ball-ball contact ===
    /// Restitution at zero relative speed
    pub restitution_min: f32,
    /// Restitution at or above `restitution_speed`
    pub restitution_max: f32,
    /// Relative speed where restitution reaches its maximum (m/s)
    pub restitution_speed: f32,
    /// Normal speeds below this are ignored to avoid jitter
    pub micro_contact: f32,
    /// Tangential impulse as a fraction of the normal impulse
    pub ball_friction: f32,

    // === Cue ===
    /// Shot speed cap (m/s)
    pub max_shot_speed: f32,
    /// Effective mass of the cue (kg)
    pub cue_mass: f32,
    /// Fraction of vertical speed kept when a downward strike hops the ball
    pub jump_damping: f32,
    /// Largest tip offset from the ball centre, as a fraction of the radius
    pub max_tip_offset: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            mu_roll: 0.01,
            mu_slide: 0.2,
            rolling_threshold: 0.1,
            sleep_threshold: 0.003,
            side_spin_bleed: 0.3,
            bounce_threshold: 0.3,
            bounce_damping: 0.2,
            settle_threshold: 0.01,

            cushion_restitution: 0.9,
            cushion_spin_damping: 0.95,

            restitution_min: 0.85,
            restitution_max: 0.98,
            restitution_speed: 2.5,
            micro_contact: 0.02,
            ball_friction: 0.02,

            max_shot_speed: 10.0,
            cue_mass: 0.5,
            jump_damping: 0.35,
            max_tip_offset: 1.0,
        }
    }
}

/// Table and ball dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Cushion-to-cushion length including rails (m)
    pub length: f32,
    /// Cushion-to-cushion width including rails (m)
    pub width: f32,
    /// Rail thickness inside `length`/`width` (m)
    pub cushion_offset: f32,
    pub corner_pocket_radius: f32,
    pub side_pocket_radius: f32,
    /// Gap between neighbouring balls in the rack (m)
    pub rack_gap: f32,
    pub ball_radius: f32,
    pub ball_mass: f32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            length: 2.24,
            width: 1.12,
            cushion_offset: 0.03,
            corner_pocket_radius: 0.06,
            side_pocket_radius: 0.055,
            rack_gap: 0.003,
            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
        }
    }
}

/// Game rule switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Any ball may be repositioned between shots
    pub training_mode: bool,
    /// Ball-in-hand placement is restricted to the kitchen
    pub kitchen_rule: bool,
    /// Grant ball-in-hand to the incoming player after a foul
    pub ball_in_hand_on_foul: bool,
    /// Lock-out after an undo/redo before another is accepted (seconds)
    pub undo_cooldown_secs: f32,
    /// Seed for hit-sound clip selection
    pub sound_seed: u64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            training_mode: false,
            kitchen_rule: false,
            ball_in_hand_on_foul: true,
            undo_cooldown_secs: 0.2,
            sound_seed: 0x8b411,
        }
    }
}

/// All simulation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub table: TableSettings,
    pub rules: RuleSettings,
}

impl Settings {
    /// Parse settings from a JSON string (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "physics": { "mu_slide": 0.25 } }"#).unwrap();
        assert_eq!(settings.physics.mu_slide, 0.25);
        assert_eq!(settings.physics.mu_roll, 0.01);
        assert_eq!(settings.table, TableSettings::default());
        assert!(!settings.rules.training_mode);
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::default();
        settings.rules.kitchen_rule = true;
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(Settings::from_json("{ physics: ").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
