//! Per-frame velocity integration for the player and enemies.

use crate::collision::{resolve_landing, Solid};
use crate::config::{PhysicsConfig, WorldConfig};
use crate::entities::{Enemy, Facing, Player};
use crate::input::{InputState, Key};
use crate::math::Vec2;

/// Movement intent read from held keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl Controls {
    pub fn from_input(input: &InputState) -> Self {
        Self {
            left: input.is_key_down(Key::Left),
            right: input.is_key_down(Key::Right),
            jump: input.is_key_down(Key::Jump),
        }
    }
}

/// Accumulate one frame of gravity, capped at terminal velocity.
pub fn apply_gravity(velocity: &mut Vec2, physics: &PhysicsConfig) {
    velocity.y = (velocity.y + physics.gravity).min(physics.terminal_velocity);
}

/// Turn held input into the player's velocity for this frame.
///
/// Horizontal speed is instantaneous: `-speed`, `+speed` or zero. Right wins
/// when both directions are held. A jump only starts from the ground.
pub fn steer_player(player: &mut Player, controls: Controls, physics: &PhysicsConfig) {
    let body = &mut player.body;

    body.velocity.x = 0.0;
    if controls.left {
        body.velocity.x = -physics.player_speed;
        player.facing = Facing::Left;
    }
    if controls.right {
        body.velocity.x = physics.player_speed;
        player.facing = Facing::Right;
    }
    if controls.jump && body.on_ground {
        body.velocity.y = physics.jump_impulse;
        body.on_ground = false;
    }

    apply_gravity(&mut body.velocity, physics);
}

/// Outcome of advancing an enemy by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyFate {
    Alive,
    /// The enemy's top edge passed the bottom of the world.
    FellOut,
}

/// Advance an enemy: gravity, both axes of motion, landing, then a turn
/// around at the world's side edges.
///
/// Speed magnitude never changes; only its sign flips, and only at the edges.
pub fn advance_enemy<S: Solid>(
    enemy: &mut Enemy,
    solids: &[S],
    physics: &PhysicsConfig,
    world: &WorldConfig,
) -> EnemyFate {
    let body = &mut enemy.body;
    apply_gravity(&mut body.velocity, physics);

    body.bounds.x += body.velocity.x;
    body.bounds.y += body.velocity.y;
    body.on_ground = false;
    resolve_landing(body, solids);

    if body.bounds.right() > world.width || body.bounds.left() < 0.0 {
        body.velocity.x = -body.velocity.x;
    }

    if body.bounds.top() > world.height {
        EnemyFate::FellOut
    } else {
        EnemyFate::Alive
    }
}
