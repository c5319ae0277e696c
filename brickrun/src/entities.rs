//! Entity variants that make up a level.
//!
//! Entities are plain data. Movement lives in [`kinematics`](crate::kinematics),
//! collision in [`collision`](crate::collision) and game rules in
//! [`interaction`](crate::interaction).

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vec2};
use crate::world::EntityId;

/// A moving axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub bounds: Rect,
    pub velocity: Vec2,
    /// Set by a downward collision against a platform this frame.
    pub on_ground: bool,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            bounds: Rect::from_position(position, size),
            velocity: Vec2::ZERO,
            on_ground: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Unit sign along the x axis.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// The player-controlled character.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: Body,
    pub facing: Facing,
    /// May dip below zero for the rest of a frame; the session clamps it on game over.
    pub lives: i32,
    /// Remaining invincibility frames. Zero means vulnerable.
    pub invincible_frames: u32,
}

impl Player {
    pub fn new(position: Vec2, size: Vec2, lives: i32) -> Self {
        Self {
            body: Body::new(position, size),
            facing: Facing::Right,
            lives,
            invincible_frames: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.body.bounds
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_frames > 0
    }

    /// Count the invincibility window down by one frame.
    pub fn tick_invincibility(&mut self) {
        self.invincible_frames = self.invincible_frames.saturating_sub(1);
    }

    /// Start (or restart) an invincibility window. Windows never stack.
    pub fn grant_invincibility(&mut self, frames: u32) {
        self.invincible_frames = frames;
    }

    /// Put the player back at `spawn` with no vertical speed.
    pub fn respawn(&mut self, spawn: Vec2) {
        self.body.bounds.x = spawn.x;
        self.body.bounds.y = spawn.y;
        self.body.velocity.y = 0.0;
    }
}

/// One-shot item container carried by mystery platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MysteryBlock {
    has_item: bool,
}

impl MysteryBlock {
    pub fn new() -> Self {
        Self { has_item: true }
    }

    pub fn has_item(&self) -> bool {
        self.has_item
    }

    /// Release the item if it is still there. Returns whether this call released it.
    pub(crate) fn take_item(&mut self) -> bool {
        std::mem::replace(&mut self.has_item, false)
    }
}

impl Default for MysteryBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformKind {
    Ground,
    Brick,
    Mystery(MysteryBlock),
}

/// Static level geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    pub id: EntityId,
    pub bounds: Rect,
    pub kind: PlatformKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Goomba,
    Koopa,
}

/// Cosmetic koopa shell colour, fixed at level load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShellColor {
    Green,
    Red,
}

/// A patrolling enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub body: Body,
    pub kind: EnemyKind,
    /// `Some` for koopas only.
    pub shell: Option<ShellColor>,
}

impl Enemy {
    pub fn bounds(&self) -> Rect {
        self.body.bounds
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Coin {
    pub id: EntityId,
    pub bounds: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// One extra life.
    Life,
    /// A long invincibility window.
    Star,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerUp {
    pub id: EntityId,
    pub bounds: Rect,
    pub kind: PowerUpKind,
}

/// Goal marker. Touching it completes the level.
#[derive(Clone, Debug, PartialEq)]
pub struct Flag {
    pub id: EntityId,
    pub bounds: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invincibility_counts_down_and_clears_at_zero() {
        let mut player = Player::new(Vec2::new(50.0, 450.0), Vec2::new(40.0, 50.0), 3);
        player.grant_invincibility(3);

        let mut seen = Vec::new();
        for _ in 0..5 {
            player.tick_invincibility();
            seen.push(player.invincible_frames);
        }
        assert_eq!(seen, vec![2, 1, 0, 0, 0]);
        assert!(!player.is_invincible());
    }

    #[test]
    fn star_resets_rather_than_stacks() {
        let mut player = Player::new(Vec2::ZERO, Vec2::new(40.0, 50.0), 3);
        player.grant_invincibility(10);
        player.grant_invincibility(300);
        assert_eq!(player.invincible_frames, 300);
    }

    #[test]
    fn mystery_block_releases_once() {
        let mut block = MysteryBlock::new();
        assert!(block.take_item());
        assert!(!block.take_item());
        assert!(!block.has_item());
    }

    #[test]
    fn respawn_keeps_horizontal_speed() {
        let mut player = Player::new(Vec2::new(300.0, 620.0), Vec2::new(40.0, 50.0), 2);
        player.body.velocity = Vec2::new(5.0, 15.0);
        player.respawn(Vec2::new(50.0, 450.0));
        assert_eq!(player.bounds().position(), Vec2::new(50.0, 450.0));
        assert_eq!(player.body.velocity, Vec2::new(5.0, 0.0));
    }
}
