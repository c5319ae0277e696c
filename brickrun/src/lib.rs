//! brickrun - the simulation core of a small 2D platformer.
//!
//! A [`Session`] owns one level's [`World`] and advances it one fixed tick at
//! a time: player steering, axis-separated collision against platforms, then
//! coins, enemies, power-ups and the goal flag. Drawing and input are left
//! to the front end through the [`Renderer`] and [`InputSource`] traits, and
//! [`Engine`] ties the three together in a paced loop.

pub mod collision;
pub mod config;
pub mod engine;
pub mod entities;
pub mod input;
pub mod interaction;
pub mod kinematics;
pub mod level;
pub mod math;
pub mod render;
pub mod session;
pub mod world;

pub use crate::config::{ConfigError, LevelTransitionPolicy, SimConfig};
pub use crate::engine::{Engine, EngineConfig, EngineContext, ExitReason, Game, InputSource};
pub use crate::input::{InputFrame, InputState, Key, KeyState, ScriptedInput};
pub use crate::interaction::GameEvent;
pub use crate::kinematics::Controls;
pub use crate::level::{LevelError, LevelSet};
pub use crate::math::{Rect, Vec2};
pub use crate::render::{FrameSnapshot, HeadlessRenderer, Renderer, SpriteKind, SpriteView};
pub use crate::session::{Phase, Session, SetupError};
pub use crate::world::{EntityId, World};
