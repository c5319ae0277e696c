//! Level content: serializable layouts and the ordered set they come in.
//!
//! Layouts are pure data. [`World::build`](crate::world::World::build) turns
//! one into live entities. Faults in the data are reported when the set is
//! loaded, never while the simulation runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SimConfig;
use crate::entities::{EnemyKind, PowerUpKind};
use crate::math::Vec2;

const CLASSIC_LEVELS: &str = include_str!("../levels/classic.json");

/// Configuration faults in level content.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level set contains no levels")]
    Empty,
    #[error("level {index} does not exist (levels are numbered 1..={count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("level {level}: {entity} has invalid size {width}x{height}")]
    InvalidSize {
        level: usize,
        entity: &'static str,
        width: f32,
        height: f32,
    },
    #[error("level {level}: {entity} has a non-finite position")]
    NonFinitePosition { level: usize, entity: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformTag {
    Ground,
    Brick,
    Mystery,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: PlatformTag,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    pub x: f32,
    pub y: f32,
    pub kind: EnemyKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpPlacement {
    pub x: f32,
    pub y: f32,
    pub kind: PowerUpKind,
}

/// Top-left corner of an entity whose size comes from [`SimConfig::sizes`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
}

/// Ordered placement lists for one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    #[serde(default)]
    pub name: String,
    pub platforms: Vec<PlatformPlacement>,
    #[serde(default)]
    pub enemies: Vec<EnemyPlacement>,
    #[serde(default)]
    pub coins: Vec<Placement>,
    #[serde(default)]
    pub power_ups: Vec<PowerUpPlacement>,
    pub flag: Placement,
}

impl LevelLayout {
    fn validate(&self, level: usize) -> Result<(), LevelError> {
        for p in &self.platforms {
            if !(Vec2::new(p.x, p.y).is_finite()) {
                return Err(LevelError::NonFinitePosition {
                    level,
                    entity: "platform",
                });
            }
            if !(p.width > 0.0 && p.height > 0.0) {
                return Err(LevelError::InvalidSize {
                    level,
                    entity: "platform",
                    width: p.width,
                    height: p.height,
                });
            }
        }

        let positions = self
            .enemies
            .iter()
            .map(|e| ("enemy", Vec2::new(e.x, e.y)))
            .chain(self.coins.iter().map(|c| ("coin", Vec2::new(c.x, c.y))))
            .chain(
                self.power_ups
                    .iter()
                    .map(|p| ("power-up", Vec2::new(p.x, p.y))),
            )
            .chain(std::iter::once((
                "flag",
                Vec2::new(self.flag.x, self.flag.y),
            )));
        for (entity, position) in positions {
            if !position.is_finite() {
                return Err(LevelError::NonFinitePosition { level, entity });
            }
        }

        Ok(())
    }
}

/// Levels in play order. Indices are 1-based.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    levels: Vec<LevelLayout>,
}

impl LevelSet {
    /// Build a set from layouts, validating each one.
    pub fn new(levels: Vec<LevelLayout>) -> Result<Self, LevelError> {
        let set = Self { levels };
        set.validate()?;
        Ok(set)
    }

    /// The four levels the game ships with.
    pub fn classic() -> Result<Self, LevelError> {
        Self::from_json(CLASSIC_LEVELS)
    }

    /// Parse a level set from JSON of the form `{ "levels": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a level set from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize this set to pretty JSON.
    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Layout for a 1-based level index.
    pub fn layout(&self, index: usize) -> Result<&LevelLayout, LevelError> {
        index
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .ok_or(LevelError::IndexOutOfRange {
                index,
                count: self.levels.len(),
            })
    }

    /// The level that follows `index`, wrapping from the last back to 1.
    pub fn next_index(&self, index: usize) -> usize {
        if index >= self.levels.len() {
            1
        } else {
            index + 1
        }
    }

    /// Check that every placement can be turned into a live entity.
    ///
    /// Entity sizes that come from configuration are checked by
    /// [`SimConfig::validate`]; this only covers what the level data owns.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for (i, layout) in self.levels.iter().enumerate() {
            layout.validate(i + 1)?;
        }
        Ok(())
    }

    /// Check that the player box at the spawn of `config` lies inside the
    /// world on both axes.
    pub fn fits(&self, config: &SimConfig) -> bool {
        let spawn = config.world.spawn_point;
        let size = config.sizes.player;
        spawn.x >= 0.0
            && spawn.y >= 0.0
            && spawn.x + size.x <= config.world.width
            && spawn.y + size.y <= config.world.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_set_has_four_levels() {
        let set = LevelSet::classic().unwrap();
        assert_eq!(set.len(), 4);

        let first = set.layout(1).unwrap();
        assert_eq!(first.platforms[0].kind, PlatformTag::Ground);
        assert_eq!(first.coins.len(), 9);
        assert_eq!(first.enemies.len(), 3);
        assert_eq!(first.flag, Placement { x: 720.0, y: 350.0 });

        let third = set.layout(3).unwrap();
        assert_eq!(
            third
                .platforms
                .iter()
                .filter(|p| p.kind == PlatformTag::Ground)
                .count(),
            2
        );
    }

    #[test]
    fn index_wraps_after_last_level() {
        let set = LevelSet::classic().unwrap();
        assert_eq!(set.next_index(1), 2);
        assert_eq!(set.next_index(3), 4);
        assert_eq!(set.next_index(4), 1);
    }

    #[test]
    fn out_of_range_index_is_a_fault() {
        let set = LevelSet::classic().unwrap();
        assert!(matches!(
            set.layout(0),
            Err(LevelError::IndexOutOfRange { index: 0, count: 4 })
        ));
        assert!(matches!(
            set.layout(5),
            Err(LevelError::IndexOutOfRange { index: 5, count: 4 })
        ));
    }

    #[test]
    fn rejects_negative_platform_size() {
        let json = r#"{ "levels": [ {
            "platforms": [ { "x": 0, "y": 550, "width": -10, "height": 50, "kind": "ground" } ],
            "flag": { "x": 720, "y": 350 }
        } ] }"#;
        assert!(matches!(
            LevelSet::from_json(json),
            Err(LevelError::InvalidSize {
                level: 1,
                entity: "platform",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_set_and_unknown_tags() {
        assert!(matches!(
            LevelSet::from_json(r#"{ "levels": [] }"#),
            Err(LevelError::Empty)
        ));

        let json = r#"{ "levels": [ {
            "platforms": [ { "x": 0, "y": 550, "width": 10, "height": 50, "kind": "lava" } ],
            "flag": { "x": 720, "y": 350 }
        } ] }"#;
        assert!(matches!(LevelSet::from_json(json), Err(LevelError::Parse(_))));
    }

    #[test]
    fn optional_groups_default_to_empty() {
        let json = r#"{ "levels": [ {
            "platforms": [ { "x": 0, "y": 550, "width": 800, "height": 50, "kind": "ground" } ],
            "flag": { "x": 720, "y": 350 }
        } ] }"#;
        let set = LevelSet::from_json(json).unwrap();
        let layout = set.layout(1).unwrap();
        assert!(layout.enemies.is_empty());
        assert!(layout.coins.is_empty());
        assert!(set.fits(&SimConfig::default()));
    }

    #[test]
    fn spawn_below_the_world_does_not_fit() {
        let set = LevelSet::classic().unwrap();
        let mut config = SimConfig::default();
        config.world.spawn_point.y = 580.0;
        assert!(!set.fits(&config));

        config.world.spawn_point.y = 550.0;
        assert!(set.fits(&config));

        config.world.spawn_point.x = 780.0;
        assert!(!set.fits(&config));
    }

    #[test]
    fn json_output_reloads_to_the_same_set() {
        let set = LevelSet::classic().unwrap();
        let json = set.to_json().unwrap();
        assert!(json.contains("\"mystery\""));
        assert_eq!(LevelSet::from_json(&json).unwrap(), set);
    }

    #[test]
    fn new_validates_layouts() {
        assert!(matches!(LevelSet::new(Vec::new()), Err(LevelError::Empty)));

        let classic = LevelSet::classic().unwrap();
        let first = classic.layout(1).unwrap().clone();
        let set = LevelSet::new(vec![first.clone()]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.layout(1).unwrap(), &first);

        let mut broken = first;
        broken.platforms[0].width = 0.0;
        assert!(matches!(
            LevelSet::new(vec![broken]),
            Err(LevelError::InvalidSize { level: 1, .. })
        ));
    }
}
