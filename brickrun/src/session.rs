use anyhow::Result;
use thiserror::Error;

use crate::collision::move_and_collide;
use crate::config::{ConfigError, LevelTransitionPolicy, SimConfig};
use crate::engine::{EngineContext, Game};
use crate::entities::{PlatformKind, Player};
use crate::input::{InputState, Key};
use crate::interaction::{self, GameEvent};
use crate::kinematics::{advance_enemy, steer_player, Controls, EnemyFate};
use crate::level::{LevelError, LevelSet};
use crate::render::{FrameSnapshot, Renderer, SpriteKind, SpriteView};
use crate::world::World;

/// Faults that keep a session from being created.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Top-level phase of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Title screen. Level 1 is loaded for display but does not simulate.
    #[default]
    Start,
    Playing,
    GameOver,
}

/// One game from the title screen onwards: phase, level index, score and
/// the live world.
///
/// The session is the only place where interaction outcomes turn into
/// score, lives, despawns and level changes. Callers feed it one
/// [`InputState`] per frame through [`Session::tick`] and read back a
/// [`FrameSnapshot`] and the queued [`GameEvent`]s.
pub struct Session {
    config: SimConfig,
    levels: LevelSet,
    rng: fastrand::Rng,
    phase: Phase,
    level: usize,
    score: u32,
    frame: u64,
    world: World,
    events: Vec<GameEvent>,
}

impl Session {
    /// Create a session on the title screen with level 1 loaded.
    pub fn new(config: SimConfig, levels: LevelSet) -> Result<Self, SetupError> {
        config.validate()?;
        levels.validate()?;
        if !levels.fits(&config) {
            log::warn!(
                "spawn point {:?} puts the player outside a {}x{} world",
                config.world.spawn_point,
                config.world.width,
                config.world.height
            );
        }

        let mut rng = fastrand::Rng::with_seed(config.seed);
        let world = World::build(levels.layout(1)?, &config, &mut rng);

        Ok(Self {
            config,
            levels,
            rng,
            phase: Phase::Start,
            level: 1,
            score: 0,
            frame: 0,
            world,
            events: Vec::new(),
        })
    }

    /// A session over the built-in levels with default tuning.
    pub fn classic() -> Result<Self, SetupError> {
        Self::new(SimConfig::default(), LevelSet::classic()?)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current 1-based level index.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.world.player.lives
    }

    /// Frames ticked since the session was created, in every phase.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for scripted setups.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> &Player {
        &self.world.player
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the session by one frame of input.
    pub fn tick(&mut self, input: &InputState) -> Result<(), LevelError> {
        self.frame += 1;
        match self.phase {
            Phase::Start => {
                if input.is_key_pressed(Key::Start) {
                    self.begin();
                }
            }
            Phase::GameOver => {
                if input.is_key_pressed(Key::Restart) {
                    self.restart()?;
                }
            }
            Phase::Playing => {
                if self.world.player.lives <= 0 {
                    self.end_game();
                } else {
                    self.step(Controls::from_input(input))?;
                }
            }
        }
        Ok(())
    }

    /// Leave the title screen. Does nothing outside [`Phase::Start`].
    pub fn begin(&mut self) -> bool {
        if self.phase != Phase::Start {
            return false;
        }
        self.set_phase(Phase::Playing);
        self.push_event(GameEvent::GameStarted);
        true
    }

    /// Start over from level 1 with zero score and fresh lives.
    pub fn restart(&mut self) -> Result<(), LevelError> {
        self.load_level(1)?;
        self.score = 0;
        self.set_phase(Phase::Playing);
        self.push_event(GameEvent::GameStarted);
        Ok(())
    }

    /// Discard the current world and build level `index` from its layout.
    ///
    /// The player starts with the configured lives; use
    /// [`Session::advance_level`] to honour the level transition policy.
    pub fn load_level(&mut self, index: usize) -> Result<(), LevelError> {
        let layout = self.levels.layout(index)?;
        self.world = World::build(layout, &self.config, &mut self.rng);
        self.level = index;
        log::info!(
            "loaded level {index} '{}' ({} entities)",
            layout.name,
            self.world.len()
        );
        self.push_event(GameEvent::LevelLoaded { level: index });
        Ok(())
    }

    /// Move on to the level after the current one, wrapping to level 1.
    pub fn advance_level(&mut self) -> Result<(), LevelError> {
        let carried = (
            self.world.player.lives,
            self.world.player.invincible_frames,
        );
        self.load_level(self.levels.next_index(self.level))?;

        match self.config.level_transition {
            LevelTransitionPolicy::PreserveLives => {
                let (lives, invincible_frames) = carried;
                self.world.player.lives = lives;
                self.world.player.invincible_frames = invincible_frames;
            }
            LevelTransitionPolicy::ResetLives => {}
        }
        Ok(())
    }

    /// Simulate one frame of play with the given controls.
    ///
    /// Runs regardless of phase, so tests can drive the rules directly.
    pub fn step(&mut self, controls: Controls) -> Result<(), LevelError> {
        let first_event = self.events.len();
        let config = &self.config;
        let world = &mut self.world;
        let events = &mut self.events;

        world.advance_frame();
        world.player.tick_invincibility();
        steer_player(&mut world.player, controls, &config.physics);

        for bump in move_and_collide(&mut world.player.body, &mut world.platforms) {
            if let Some(platform) = world.platforms.get(bump.index) {
                events.push(GameEvent::BlockBumped {
                    platform: platform.id,
                    released: bump.released,
                });
            }
        }

        interaction::handle_fall(&mut world.player, &config.world, events);
        interaction::clamp_to_world(&mut world.player, &config.world);

        let coins = interaction::run_player_interactions(world, config, events);
        self.score = self
            .score
            .saturating_add(coins.saturating_mul(config.rules.coin_value));

        let mut fell_out = Vec::new();
        for enemy in &mut world.enemies {
            if advance_enemy(enemy, &world.platforms, &config.physics, &config.world)
                == EnemyFate::FellOut
            {
                fell_out.push(enemy.id);
            }
        }
        events.extend(
            fell_out
                .iter()
                .map(|&enemy| GameEvent::EnemyFellOut { enemy }),
        );
        world.despawn_all(&fell_out);

        let flag_reached = interaction::reached_flag(world);
        for event in &self.events[first_event..] {
            log::debug!("frame {}: {event:?}", self.frame);
        }

        if flag_reached {
            self.push_event(GameEvent::FlagReached { level: self.level });
            self.advance_level()?;
        }
        Ok(())
    }

    /// Read-only view of everything a renderer needs for this frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        let world = &self.world;
        let edge_on = world.frames() % 20 >= 10;

        let mut sprites = Vec::with_capacity(world.len());
        sprites.extend(world.platforms.iter().map(|p| SpriteView {
            id: p.id,
            bounds: p.bounds,
            kind: match p.kind {
                PlatformKind::Ground => SpriteKind::Ground,
                PlatformKind::Brick => SpriteKind::Brick,
                PlatformKind::Mystery(block) => SpriteKind::Mystery {
                    has_item: block.has_item(),
                },
            },
        }));
        sprites.push(SpriteView {
            id: world.flag.id,
            bounds: world.flag.bounds,
            kind: SpriteKind::Flag,
        });
        sprites.extend(world.coins.iter().map(|c| SpriteView {
            id: c.id,
            bounds: c.bounds,
            kind: SpriteKind::Coin { edge_on },
        }));
        sprites.extend(world.power_ups.iter().map(|p| SpriteView {
            id: p.id,
            bounds: p.bounds,
            kind: SpriteKind::PowerUp(p.kind),
        }));
        sprites.extend(world.enemies.iter().map(|e| SpriteView {
            id: e.id,
            bounds: e.bounds(),
            kind: SpriteKind::Enemy {
                kind: e.kind,
                shell: e.shell,
            },
        }));

        let player = &world.player;
        sprites.push(SpriteView {
            id: world.player_id,
            bounds: player.bounds(),
            kind: SpriteKind::Player {
                facing: player.facing,
                invincible: player.is_invincible(),
                invincible_frames: player.invincible_frames,
            },
        });

        FrameSnapshot {
            phase: self.phase,
            level: self.level,
            score: self.score,
            lives: player.lives,
            frame: self.frame,
            world_size: (self.config.world.width, self.config.world.height),
            sprites,
        }
    }

    fn end_game(&mut self) {
        self.world.player.lives = 0;
        self.set_phase(Phase::GameOver);
        self.push_event(GameEvent::GameOver { score: self.score });
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            log::info!("phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    fn push_event(&mut self, event: GameEvent) {
        log::debug!("frame {}: {event:?}", self.frame);
        self.events.push(event);
    }
}

impl Game for Session {
    fn update(&mut self, ctx: &mut EngineContext) -> Result<()> {
        self.tick(ctx.input())?;
        Ok(())
    }

    fn draw(&mut self, _ctx: &mut EngineContext, renderer: &mut dyn Renderer) -> Result<()> {
        renderer.draw(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;

    fn press(key: Key) -> InputState {
        let mut input = InputState::new();
        input.handle_key(key, KeyState::Pressed);
        input
    }

    #[test]
    fn starts_on_title_screen_with_level_one() {
        let session = Session::classic().unwrap();
        assert_eq!(session.phase(), Phase::Start);
        assert_eq!(session.level(), 1);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), 3);
    }

    #[test]
    fn keeps_the_configuration_and_levels_it_was_given() {
        let mut config = SimConfig::default();
        config.rules.starting_lives = 5;
        let levels = LevelSet::classic().unwrap();
        let first = levels.layout(1).unwrap().clone();
        let session = Session::new(config, LevelSet::new(vec![first]).unwrap()).unwrap();

        assert_eq!(session.config().rules.starting_lives, 5);
        assert_eq!(session.lives(), 5);
        assert_eq!(session.levels().len(), 1);
        assert_eq!(session.levels().next_index(1), 1);
    }

    #[test]
    fn title_screen_does_not_simulate() {
        let mut session = Session::classic().unwrap();
        let before = session.player().bounds();
        for _ in 0..30 {
            session.tick(&InputState::new()).unwrap();
        }
        assert_eq!(session.player().bounds(), before);
        assert_eq!(session.world().frames(), 0);
        assert_eq!(session.frame(), 30);
    }

    #[test]
    fn start_key_only_acts_on_title_screen() {
        let mut session = Session::classic().unwrap();
        session.tick(&press(Key::Restart)).unwrap();
        assert_eq!(session.phase(), Phase::Start);

        session.tick(&press(Key::Start)).unwrap();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.drain_events(), vec![GameEvent::GameStarted]);

        assert!(!session.begin());
    }

    #[test]
    fn game_over_is_detected_on_next_update() {
        let mut session = Session::classic().unwrap();
        session.begin();
        session.world_mut().player.lives = -1;

        session.tick(&InputState::new()).unwrap();
        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(session.lives(), 0);

        // Start does nothing here; only Restart does.
        session.tick(&press(Key::Start)).unwrap();
        assert_eq!(session.phase(), Phase::GameOver);

        session.tick(&press(Key::Restart)).unwrap();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn restart_clears_score() {
        let mut session = Session::classic().unwrap();
        session.begin();
        session.load_level(3).unwrap();
        session.score = 120;
        session.world_mut().player.lives = 0;
        session.tick(&InputState::new()).unwrap();
        session.restart().unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn load_level_rejects_out_of_range() {
        let mut session = Session::classic().unwrap();
        assert!(matches!(
            session.load_level(5),
            Err(LevelError::IndexOutOfRange { index: 5, count: 4 })
        ));
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn snapshot_lists_sprites_in_draw_order() {
        let session = Session::classic().unwrap();
        let snapshot = session.snapshot();
        let world = session.world();

        assert_eq!(snapshot.sprites.len(), world.len());
        assert!(matches!(snapshot.sprites[0].kind, SpriteKind::Ground));
        assert!(matches!(
            snapshot.sprites.last().map(|s| s.kind),
            Some(SpriteKind::Player { .. })
        ));
        assert_eq!(snapshot.sprites[world.platforms.len()].kind, SpriteKind::Flag);
        assert_eq!(snapshot.phase, Phase::Start);
        assert_eq!(snapshot.world_size, (800.0, 600.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SimConfig::default();
        config.world.width = 0.0;
        let result = Session::new(config, LevelSet::classic().unwrap());
        assert!(matches!(result, Err(SetupError::Config(_))));
    }
}
