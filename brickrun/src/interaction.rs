//! Game rules between the player and the rest of a level.
//!
//! Every pass gathers the entities it touches first and applies the
//! consequences after iteration, so an entity destroyed in a pass is gone
//! before any later check in the same frame can see it.

use crate::config::{RulesConfig, SimConfig, WorldConfig};
use crate::entities::{EnemyKind, Player, PowerUpKind};
use crate::world::{EntityId, World};

/// Something that happened during a frame, reported to the session's caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    GameStarted,
    LevelLoaded { level: usize },
    CoinCollected { coin: EntityId },
    EnemyStomped { enemy: EntityId, kind: EnemyKind },
    PlayerDamaged { enemy: EntityId, lives: i32 },
    PowerUpCollected { power_up: EntityId, kind: PowerUpKind },
    BlockBumped { platform: EntityId, released: bool },
    PlayerFell { lives: i32 },
    EnemyFellOut { enemy: EntityId },
    FlagReached { level: usize },
    GameOver { score: u32 },
}

/// Respawn the player if it dropped below the world. Costs one life.
pub fn handle_fall(player: &mut Player, world: &WorldConfig, events: &mut Vec<GameEvent>) -> bool {
    if player.bounds().bottom() <= world.height {
        return false;
    }
    player.lives -= 1;
    player.respawn(world.spawn_point);
    events.push(GameEvent::PlayerFell {
        lives: player.lives,
    });
    true
}

/// Keep the player box inside the world horizontally.
pub fn clamp_to_world(player: &mut Player, world: &WorldConfig) {
    player.body.bounds.clamp_x(0.0, world.width);
}

/// Destroy every coin the player overlaps. Returns how many were taken.
pub fn collect_coins(world: &mut World, events: &mut Vec<GameEvent>) -> u32 {
    let player = world.player.bounds();
    let taken: Vec<EntityId> = world
        .coins
        .iter()
        .filter(|c| c.bounds.intersects(&player))
        .map(|c| c.id)
        .collect();

    events.extend(taken.iter().map(|&coin| GameEvent::CoinCollected { coin }));
    world.despawn_all(&taken) as u32
}

/// Stomp or take damage from every enemy the player overlaps.
///
/// Skipped entirely while the player is invincible. Overlaps and the
/// stomp height test use the player box as it was when the pass began, so
/// knockback never changes which enemies are touched. The falling test reads
/// the live vertical speed: after one stomp bounces the player upward, any
/// further enemy in the same frame deals damage.
pub fn resolve_enemy_contacts(
    world: &mut World,
    rules: &RulesConfig,
    bounds: &WorldConfig,
    events: &mut Vec<GameEvent>,
) {
    if world.player.is_invincible() {
        return;
    }

    let start = world.player.bounds();
    let contacts: Vec<_> = world
        .enemies
        .iter()
        .filter(|e| e.bounds().intersects(&start))
        .map(|e| (e.id, e.kind, e.bounds()))
        .collect();

    let player = &mut world.player;
    let mut stomped = Vec::new();
    for (enemy, kind, enemy_bounds) in contacts {
        let falling = player.body.velocity.y > 0.0;
        if falling && start.bottom() - rules.stomp_tolerance < enemy_bounds.top() {
            player.body.velocity.y = rules.stomp_bounce;
            stomped.push(enemy);
            events.push(GameEvent::EnemyStomped { enemy, kind });
        } else {
            player.lives -= 1;
            player.grant_invincibility(rules.damage_invincibility_frames);
            player.body.bounds.x -= player.facing.sign() * rules.knockback;
            clamp_to_world(player, bounds);
            events.push(GameEvent::PlayerDamaged {
                enemy,
                lives: player.lives,
            });
        }
    }

    world.despawn_all(&stomped);
}

/// Consume every power-up the player overlaps and apply its effect once.
pub fn collect_power_ups(world: &mut World, rules: &RulesConfig, events: &mut Vec<GameEvent>) {
    let player_bounds = world.player.bounds();
    let taken: Vec<(EntityId, PowerUpKind)> = world
        .power_ups
        .iter()
        .filter(|p| p.bounds.intersects(&player_bounds))
        .map(|p| (p.id, p.kind))
        .collect();

    let player = &mut world.player;
    for &(power_up, kind) in &taken {
        match kind {
            PowerUpKind::Life => player.lives += 1,
            PowerUpKind::Star => player.grant_invincibility(rules.star_invincibility_frames),
        }
        events.push(GameEvent::PowerUpCollected { power_up, kind });
    }

    let ids: Vec<EntityId> = taken.into_iter().map(|(id, _)| id).collect();
    world.despawn_all(&ids);
}

/// Run the pickup and combat passes in their fixed order: coins, enemies,
/// power-ups. Returns the number of coins collected.
pub fn run_player_interactions(
    world: &mut World,
    config: &SimConfig,
    events: &mut Vec<GameEvent>,
) -> u32 {
    let coins = collect_coins(world, events);
    resolve_enemy_contacts(world, &config.rules, &config.world, events);
    collect_power_ups(world, &config.rules, events);
    coins
}

/// Whether the player touches the goal flag. Invincibility does not matter.
pub fn reached_flag(world: &World) -> bool {
    world.player.bounds().intersects(&world.flag.bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Body, Coin, Enemy, Facing, PowerUp};
    use crate::level::LevelSet;
    use crate::math::{Rect, Vec2};

    fn empty_world() -> World {
        let levels = LevelSet::from_json(
            r#"{ "levels": [ {
                "platforms": [ { "x": 0, "y": 550, "width": 800, "height": 50, "kind": "ground" } ],
                "flag": { "x": 720, "y": 350 }
            } ] }"#,
        )
        .unwrap();
        let layout = levels.layout(1).unwrap();
        World::build(layout, &SimConfig::default(), &mut fastrand::Rng::with_seed(3))
    }

    fn place_player(world: &mut World, x: f32, y: f32, vel_y: f32) {
        world.player.body.bounds.x = x;
        world.player.body.bounds.y = y;
        world.player.body.velocity.y = vel_y;
    }

    fn add_goomba(world: &mut World, raw: u32, x: f32, y: f32) -> EntityId {
        let id = EntityId::from_raw(raw);
        let mut body = Body::new(Vec2::new(x, y), Vec2::new(35.0, 35.0));
        body.velocity.x = -2.0;
        world.enemies.push(Enemy {
            id,
            body,
            kind: EnemyKind::Goomba,
            shell: None,
        });
        id
    }

    fn add_coin(world: &mut World, raw: u32, x: f32, y: f32) -> EntityId {
        let id = EntityId::from_raw(raw);
        world.coins.push(Coin {
            id,
            bounds: Rect::new(x, y, 20.0, 25.0),
        });
        id
    }

    fn add_power_up(world: &mut World, raw: u32, x: f32, y: f32, kind: PowerUpKind) -> EntityId {
        let id = EntityId::from_raw(raw);
        world.power_ups.push(PowerUp {
            id,
            bounds: Rect::new(x, y, 30.0, 30.0),
            kind,
        });
        id
    }

    #[test]
    fn coins_are_collected_once() {
        let mut world = empty_world();
        place_player(&mut world, 100.0, 400.0, 0.0);
        let a = add_coin(&mut world, 100, 105.0, 410.0);
        let b = add_coin(&mut world, 101, 120.0, 420.0);
        add_coin(&mut world, 102, 400.0, 420.0);

        let mut events = Vec::new();
        assert_eq!(collect_coins(&mut world, &mut events), 2);
        assert_eq!(
            events,
            vec![
                GameEvent::CoinCollected { coin: a },
                GameEvent::CoinCollected { coin: b }
            ]
        );
        assert_eq!(collect_coins(&mut world, &mut events), 0);
        assert_eq!(world.coins.len(), 1);
    }

    #[test]
    fn falling_onto_enemy_stomps_it() {
        let config = SimConfig::default();
        let mut world = empty_world();
        let goomba = add_goomba(&mut world, 100, 300.0, 515.0);
        // player bottom at 520, goomba top at 515: 520 - 10 < 515
        place_player(&mut world, 290.0, 470.0, 6.0);

        let mut events = Vec::new();
        resolve_enemy_contacts(&mut world, &config.rules, &config.world, &mut events);

        assert_eq!(world.player.body.velocity.y, -8.0);
        assert_eq!(world.player.lives, 3);
        assert!(world.enemies.is_empty());
        assert_eq!(
            events,
            vec![GameEvent::EnemyStomped {
                enemy: goomba,
                kind: EnemyKind::Goomba
            }]
        );
    }

    #[test]
    fn side_contact_damages_and_knocks_back() {
        let config = SimConfig::default();
        let mut world = empty_world();
        let goomba = add_goomba(&mut world, 100, 300.0, 515.0);
        place_player(&mut world, 270.0, 500.0, 0.0);
        world.player.facing = Facing::Right;

        let mut events = Vec::new();
        resolve_enemy_contacts(&mut world, &config.rules, &config.world, &mut events);

        assert_eq!(world.player.lives, 2);
        assert_eq!(world.player.invincible_frames, 60);
        assert_eq!(world.player.bounds().left(), 220.0);
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(
            events,
            vec![GameEvent::PlayerDamaged {
                enemy: goomba,
                lives: 2
            }]
        );
    }

    #[test]
    fn knockback_stays_inside_the_world() {
        let config = SimConfig::default();
        let mut world = empty_world();
        add_goomba(&mut world, 100, 30.0, 515.0);
        place_player(&mut world, 10.0, 500.0, 0.0);
        world.player.facing = Facing::Right;

        let mut events = Vec::new();
        resolve_enemy_contacts(&mut world, &config.rules, &config.world, &mut events);
        assert_eq!(world.player.bounds().left(), 0.0);
    }

    #[test]
    fn invincible_player_ignores_enemies() {
        let config = SimConfig::default();
        let mut world = empty_world();
        add_goomba(&mut world, 100, 300.0, 515.0);
        place_player(&mut world, 270.0, 500.0, 0.0);
        world.player.grant_invincibility(5);

        let mut events = Vec::new();
        resolve_enemy_contacts(&mut world, &config.rules, &config.world, &mut events);
        assert_eq!(world.player.lives, 3);
        assert!(events.is_empty());
        assert_eq!(world.enemies.len(), 1);
    }

    #[test]
    fn second_enemy_after_a_stomp_deals_damage() {
        let config = SimConfig::default();
        let mut world = empty_world();
        let first = add_goomba(&mut world, 100, 280.0, 515.0);
        let second = add_goomba(&mut world, 101, 305.0, 515.0);
        place_player(&mut world, 290.0, 470.0, 6.0);
        world.player.facing = Facing::Right;

        let mut events = Vec::new();
        resolve_enemy_contacts(&mut world, &config.rules, &config.world, &mut events);

        assert_eq!(world.enemies.len(), 1);
        assert_eq!(world.enemies[0].id, second);
        assert_eq!(world.player.lives, 2);
        assert_eq!(world.player.invincible_frames, 60);
        assert_eq!(world.player.body.velocity.y, -8.0);
        assert_eq!(world.player.bounds().left(), 240.0);
        assert_eq!(
            events,
            vec![
                GameEvent::EnemyStomped {
                    enemy: first,
                    kind: EnemyKind::Goomba
                },
                GameEvent::PlayerDamaged {
                    enemy: second,
                    lives: 2
                },
            ]
        );
    }

    #[test]
    fn star_resets_invincibility_to_full_window() {
        let config = SimConfig::default();
        let mut world = empty_world();
        place_player(&mut world, 100.0, 400.0, 0.0);
        world.player.grant_invincibility(10);
        add_power_up(&mut world, 100, 110.0, 410.0, PowerUpKind::Star);

        let mut events = Vec::new();
        collect_power_ups(&mut world, &config.rules, &mut events);
        assert_eq!(world.player.invincible_frames, 300);
        assert!(world.power_ups.is_empty());
    }

    #[test]
    fn life_power_up_applies_once() {
        let config = SimConfig::default();
        let mut world = empty_world();
        place_player(&mut world, 100.0, 400.0, 0.0);
        add_power_up(&mut world, 100, 110.0, 410.0, PowerUpKind::Life);

        let mut events = Vec::new();
        collect_power_ups(&mut world, &config.rules, &mut events);
        collect_power_ups(&mut world, &config.rules, &mut events);
        assert_eq!(world.player.lives, 4);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn falling_out_costs_a_life_and_respawns() {
        let config = SimConfig::default();
        let mut world = empty_world();
        place_player(&mut world, 300.0, 560.0, 12.0);

        let mut events = Vec::new();
        assert!(handle_fall(&mut world.player, &config.world, &mut events));
        assert_eq!(world.player.lives, 2);
        assert_eq!(world.player.bounds().position(), Vec2::new(50.0, 450.0));
        assert_eq!(world.player.body.velocity.y, 0.0);
        assert_eq!(events, vec![GameEvent::PlayerFell { lives: 2 }]);
    }

    #[test]
    fn flag_overlap_is_detected() {
        let mut world = empty_world();
        place_player(&mut world, 700.0, 500.0, 0.0);
        assert!(reached_flag(&world));
        place_player(&mut world, 600.0, 500.0, 0.0);
        assert!(!reached_flag(&world));
    }
}
