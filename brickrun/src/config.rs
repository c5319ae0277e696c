//! Immutable simulation configuration.
//!
//! Every tunable that the simulation reads lives here and is handed to the
//! [`Session`](crate::session::Session) at construction time. Nothing in the
//! core mutates it afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Vec2;

/// Errors raised while loading or validating a [`SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// What happens to the player's lives when a flag sends them to the next level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelTransitionPolicy {
    /// Lives and the invincibility countdown carry over to the next level.
    #[default]
    PreserveLives,
    /// The next level starts with the configured starting lives and no invincibility.
    ResetLives,
}

/// World extents and the player's spawn point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Top-left corner of the player box on level load and after a fall.
    pub spawn_point: Vec2,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            spawn_point: Vec2::new(50.0, 450.0),
        }
    }
}

/// Per-frame physics constants, expressed for the reference 60 Hz tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub player_speed: f32,
    /// Vertical velocity set on jump. Negative is up.
    pub jump_impulse: f32,
    pub enemy_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            terminal_velocity: 15.0,
            player_speed: 5.0,
            jump_impulse: -15.0,
            enemy_speed: 2.0,
        }
    }
}

/// Game-rule constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub starting_lives: i32,
    pub coin_value: u32,
    /// Band above the enemy's top edge that still counts as landing on it.
    pub stomp_tolerance: f32,
    pub stomp_bounce: f32,
    pub knockback: f32,
    pub damage_invincibility_frames: u32,
    pub star_invincibility_frames: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            coin_value: 10,
            stomp_tolerance: 10.0,
            stomp_bounce: -8.0,
            knockback: 50.0,
            damage_invincibility_frames: 60,
            star_invincibility_frames: 300,
        }
    }
}

/// Box sizes for every entity variant whose size is not given by level data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    pub player: Vec2,
    pub goomba: Vec2,
    pub koopa: Vec2,
    pub coin: Vec2,
    pub power_up: Vec2,
    pub flag: Vec2,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            player: Vec2::new(40.0, 50.0),
            goomba: Vec2::new(35.0, 35.0),
            koopa: Vec2::new(40.0, 40.0),
            coin: Vec2::new(20.0, 25.0),
            power_up: Vec2::new(30.0, 30.0),
            flag: Vec2::new(50.0, 200.0),
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    pub rules: RulesConfig,
    pub sizes: SizeConfig,
    pub level_transition: LevelTransitionPolicy,
    /// Seed for cosmetic randomness picked at level load.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            physics: PhysicsConfig::default(),
            rules: RulesConfig::default(),
            sizes: SizeConfig::default(),
            level_transition: LevelTransitionPolicy::default(),
            seed: 0x5EED,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize this configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
            ConfigError::Invalid { field, reason }
        }

        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            return Err(invalid("world", "width and height must be positive"));
        }
        if !self.world.spawn_point.is_finite() {
            return Err(invalid("world.spawn_point", "must be finite"));
        }

        let p = &self.physics;
        if !(p.gravity.is_finite() && p.gravity >= 0.0) {
            return Err(invalid("physics.gravity", "must be finite and non-negative"));
        }
        if !(p.terminal_velocity.is_finite() && p.terminal_velocity > 0.0) {
            return Err(invalid("physics.terminal_velocity", "must be positive"));
        }
        if !(p.player_speed.is_finite() && p.player_speed >= 0.0) {
            return Err(invalid("physics.player_speed", "must be non-negative"));
        }
        if !(p.enemy_speed.is_finite() && p.enemy_speed >= 0.0) {
            return Err(invalid("physics.enemy_speed", "must be non-negative"));
        }
        if !p.jump_impulse.is_finite() {
            return Err(invalid("physics.jump_impulse", "must be finite"));
        }

        if self.rules.starting_lives <= 0 {
            return Err(invalid("rules.starting_lives", "must be at least 1"));
        }

        let s = &self.sizes;
        for (field, size) in [
            ("sizes.player", s.player),
            ("sizes.goomba", s.goomba),
            ("sizes.koopa", s.koopa),
            ("sizes.coin", s.coin),
            ("sizes.power_up", s.power_up),
            ("sizes.flag", s.flag),
        ] {
            if !(size.x > 0.0 && size.y > 0.0) {
                return Err(invalid(field, "width and height must be positive"));
            }
        }

        Ok(())
    }
}
