use std::time::{Duration, Instant};

use anyhow::{ensure, Result};

use crate::input::{InputState, Key};
use crate::render::Renderer;

/// Configuration values for the frame loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Stop after this many frames. `None` runs until quit.
    pub max_frames: Option<u64>,
    /// Sleep between frames to hold the tick rate. Headless runs turn this off.
    pub paced: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "brickrun".into(),
            tick_rate: 60,
            max_frames: None,
            paced: true,
        }
    }
}

/// Supplies input once per frame, before the update.
pub trait InputSource {
    /// Record this frame's key transitions (and quit requests) into `input`.
    fn poll(&mut self, input: &mut InputState) -> Result<()>;
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    Escape,
    Quit,
    FrameLimit,
    Requested,
}

/// Main entrypoint for running a game on a fixed timestep.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine instance with default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Override the title used in log output and by front ends.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Override the number of simulation ticks per second.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.config.tick_rate = tick_rate;
        self
    }

    /// Stop after `frames` frames.
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.config.max_frames = Some(frames);
        self
    }

    /// Enable or disable sleeping between frames.
    #[must_use]
    pub fn with_pacing(mut self, paced: bool) -> Self {
        self.config.paced = paced;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `game` until Escape, a quit request, the frame limit or
    /// [`EngineContext::request_exit`].
    ///
    /// Each frame polls `input`, updates the game once, then draws it once.
    pub fn run<G, I, R>(&self, game: &mut G, input: &mut I, renderer: &mut R) -> Result<ExitReason>
    where
        G: Game,
        I: InputSource,
        R: Renderer,
    {
        let config = &self.config;
        ensure!(config.tick_rate > 0, "tick rate must be positive");

        let mut ctx = EngineContext::new(config);
        game.init(&mut ctx)?;
        log::info!("{}: running at {} Hz", config.title, config.tick_rate);

        let mut last_frame = Instant::now();
        let mut next_frame = last_frame;
        let reason = loop {
            if config.max_frames.is_some_and(|limit| ctx.frame >= limit) {
                break ExitReason::FrameLimit;
            }

            ctx.begin_frame();
            input.poll(&mut ctx.input)?;
            if ctx.input.quit_requested() {
                break ExitReason::Quit;
            }
            if ctx.input.is_key_pressed(Key::Escape) {
                break ExitReason::Escape;
            }

            let now = Instant::now();
            ctx.update_time(now - last_frame);
            last_frame = now;

            game.update(&mut ctx)?;
            game.draw(&mut ctx, renderer)?;
            ctx.frame += 1;

            if ctx.exit_requested {
                break ExitReason::Requested;
            }

            if config.paced {
                next_frame += ctx.fixed_delta_time;
                let now = Instant::now();
                match next_frame.checked_duration_since(now) {
                    Some(wait) => std::thread::sleep(wait),
                    None => {
                        let behind = now - next_frame;
                        if behind > ctx.fixed_delta_time {
                            log::warn!(
                                "frame {} overran its budget by {:.1} ms",
                                ctx.frame,
                                behind.as_secs_f64() * 1000.0
                            );
                            next_frame = now;
                        }
                    }
                }
            }
        };

        log::info!("{}: stopped after {} frames ({reason:?})", config.title, ctx.frame);
        Ok(reason)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared context provided to game code each frame.
pub struct EngineContext {
    delta_time: Duration,
    elapsed_time: Duration,
    fixed_delta_time: Duration,
    frame: u64,
    exit_requested: bool,
    input: InputState,
}

impl EngineContext {
    fn new(config: &EngineConfig) -> Self {
        Self {
            delta_time: Duration::ZERO,
            elapsed_time: Duration::ZERO,
            fixed_delta_time: Duration::from_nanos(1_000_000_000 / u64::from(config.tick_rate)),
            frame: 0,
            exit_requested: false,
            input: InputState::new(),
        }
    }

    fn begin_frame(&mut self) {
        self.input.begin_frame();
    }

    fn update_time(&mut self, delta: Duration) {
        self.delta_time = delta;
        self.elapsed_time += delta;
    }

    /// Wall-clock time between the current and previous frames.
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// Total time elapsed since the engine started running.
    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }

    /// Fixed timestep duration (1/60 second at the default tick rate).
    pub fn fixed_delta_time(&self) -> Duration {
        self.fixed_delta_time
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Access the current input state.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Request that the engine exit after the current frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }
}

/// Trait implemented by game code to hook into the engine lifecycle.
pub trait Game {
    /// Called once before the first frame.
    fn init(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// Advance game state by one fixed tick.
    fn update(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// Hand the current frame to the renderer. Called once after each update.
    fn draw(&mut self, ctx: &mut EngineContext, renderer: &mut dyn Renderer) -> Result<()>;
}
