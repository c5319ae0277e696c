//! Read-only frame snapshots and the renderer seam.
//!
//! The simulation never draws. Each frame it hands a [`FrameSnapshot`] to
//! whatever [`Renderer`] the front end supplies.

use anyhow::Result;

use crate::entities::{EnemyKind, Facing, PowerUpKind, ShellColor};
use crate::math::Rect;
use crate::session::Phase;
use crate::world::EntityId;

/// What a sprite is, plus the few flags a renderer needs to pick its look.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpriteKind {
    Ground,
    Brick,
    Mystery {
        has_item: bool,
    },
    Flag,
    Coin {
        /// Alternates every 10 frames to give coins a spin.
        edge_on: bool,
    },
    PowerUp(PowerUpKind),
    Enemy {
        kind: EnemyKind,
        shell: Option<ShellColor>,
    },
    Player {
        facing: Facing,
        invincible: bool,
        /// Remaining invincibility frames, for blinking.
        invincible_frames: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteView {
    pub id: EntityId,
    pub bounds: Rect,
    pub kind: SpriteKind,
}

/// Everything visible in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub phase: Phase,
    pub level: usize,
    pub score: u32,
    pub lives: i32,
    pub frame: u64,
    /// World width and height in world units.
    pub world_size: (f32, f32),
    /// Draw order: platforms, flag, coins, power-ups, enemies, player.
    pub sprites: Vec<SpriteView>,
}

impl FrameSnapshot {
    /// The player sprite, always drawn last.
    pub fn player(&self) -> Option<&SpriteView> {
        self.sprites
            .iter()
            .rev()
            .find(|s| matches!(s.kind, SpriteKind::Player { .. }))
    }
}

/// Draws snapshots. Called once per frame, after the update.
pub trait Renderer {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<()>;
}

/// Renderer that draws nothing and keeps the latest snapshot.
///
/// Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames_drawn: u64,
    last: Option<FrameSnapshot>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.last.as_ref()
    }
}

impl Renderer for HeadlessRenderer {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<()> {
        self.frames_drawn += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}
