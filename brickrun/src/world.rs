use std::collections::HashSet;

use crate::config::SimConfig;
use crate::entities::{
    Body, Coin, Enemy, EnemyKind, Flag, MysteryBlock, Platform, PlatformKind, Player, PowerUp,
    ShellColor,
};
use crate::level::{LevelLayout, PlatformTag};
use crate::math::{Rect, Vec2};

/// Unique identifier for an entity in a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Get the underlying integer ID (useful for debugging or renderer caches).
    pub fn to_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// Hands out ids in spawn order, starting at 1.
struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn next(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Every entity of one loaded level.
///
/// A world is built in one go from a [`LevelLayout`] and thrown away on the
/// next load; ids are never reused within it. Collections keep their layout
/// order, which is also the collision and draw order.
#[derive(Clone, Debug)]
pub struct World {
    pub player_id: EntityId,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub enemies: Vec<Enemy>,
    pub coins: Vec<Coin>,
    pub power_ups: Vec<PowerUp>,
    pub flag: Flag,
    frames: u64,
}

impl World {
    /// Build a fresh world from a validated layout.
    pub fn build(layout: &LevelLayout, config: &SimConfig, rng: &mut fastrand::Rng) -> Self {
        let mut ids = IdAllocator::new();
        let sizes = &config.sizes;

        let player_id = ids.next();
        let player = Player::new(
            config.world.spawn_point,
            sizes.player,
            config.rules.starting_lives,
        );

        let platforms = layout
            .platforms
            .iter()
            .map(|p| Platform {
                id: ids.next(),
                bounds: Rect::new(p.x, p.y, p.width, p.height),
                kind: match p.kind {
                    PlatformTag::Ground => PlatformKind::Ground,
                    PlatformTag::Brick => PlatformKind::Brick,
                    PlatformTag::Mystery => PlatformKind::Mystery(MysteryBlock::new()),
                },
            })
            .collect();

        let enemies = layout
            .enemies
            .iter()
            .map(|e| {
                let (size, shell) = match e.kind {
                    EnemyKind::Goomba => (sizes.goomba, None),
                    EnemyKind::Koopa => {
                        let shell = if rng.bool() {
                            ShellColor::Green
                        } else {
                            ShellColor::Red
                        };
                        (sizes.koopa, Some(shell))
                    }
                };
                let mut body = Body::new(Vec2::new(e.x, e.y), size);
                body.velocity.x = -config.physics.enemy_speed;
                Enemy {
                    id: ids.next(),
                    body,
                    kind: e.kind,
                    shell,
                }
            })
            .collect();

        let coins = layout
            .coins
            .iter()
            .map(|c| Coin {
                id: ids.next(),
                bounds: Rect::from_position(Vec2::new(c.x, c.y), sizes.coin),
            })
            .collect();

        let power_ups = layout
            .power_ups
            .iter()
            .map(|p| PowerUp {
                id: ids.next(),
                bounds: Rect::from_position(Vec2::new(p.x, p.y), sizes.power_up),
                kind: p.kind,
            })
            .collect();

        let flag = Flag {
            id: ids.next(),
            bounds: Rect::from_position(Vec2::new(layout.flag.x, layout.flag.y), sizes.flag),
        };

        Self {
            player_id,
            player,
            platforms,
            enemies,
            coins,
            power_ups,
            flag,
            frames: 0,
        }
    }

    /// Frames simulated since this world was built.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub(crate) fn advance_frame(&mut self) {
        self.frames += 1;
    }

    /// Check if an entity is still part of this world.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        entity == self.player_id
            || entity == self.flag.id
            || self.platforms.iter().any(|p| p.id == entity)
            || self.enemies.iter().any(|e| e.id == entity)
            || self.coins.iter().any(|c| c.id == entity)
            || self.power_ups.iter().any(|p| p.id == entity)
    }

    /// Remove every listed coin, enemy and power-up in one pass.
    ///
    /// The player, the flag and platforms are permanent for the lifetime of
    /// the world; ids naming them are ignored. Returns how many entities
    /// were removed.
    pub fn despawn_all(&mut self, entities: &[EntityId]) -> usize {
        if entities.is_empty() {
            return 0;
        }
        let doomed: HashSet<EntityId> = entities.iter().copied().collect();
        let before = self.dynamic_len();

        self.coins.retain(|c| !doomed.contains(&c.id));
        self.enemies.retain(|e| !doomed.contains(&e.id));
        self.power_ups.retain(|p| !doomed.contains(&p.id));

        before - self.dynamic_len()
    }

    /// Number of live entities, player and flag included.
    pub fn len(&self) -> usize {
        2 + self.platforms.len() + self.dynamic_len()
    }

    /// Always false: a world holds at least the player and the flag.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn dynamic_len(&self) -> usize {
        self.coins.len() + self.enemies.len() + self.power_ups.len()
    }
}
