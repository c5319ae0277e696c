use std::collections::{HashSet, VecDeque};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::InputSource;

/// Logical keys the simulation understands.
///
/// Front ends map their physical keys onto these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Left,
    Right,
    Jump,
    Start,
    Restart,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Pressed,
    Released,
}

/// Tracks held keys and per-frame key transitions.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    keys_released: HashSet<Key>,
    quit_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame pressed/released flags.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Record a key transition reported by the input source.
    pub fn handle_key(&mut self, key: Key, state: KeyState) {
        match state {
            KeyState::Pressed => {
                if !self.keys_down.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_down.insert(key);
            }
            KeyState::Released => {
                if self.keys_down.remove(&key) {
                    self.keys_released.insert(key);
                }
            }
        }
    }

    /// Release every held key, e.g. when the front end loses focus.
    pub fn release_all(&mut self) {
        let held: Vec<Key> = self.keys_down.iter().copied().collect();
        for key in held {
            self.handle_key(key, KeyState::Released);
        }
    }

    /// Window closed or terminal interrupted.
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Returns true if the key is currently held down.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key went down this frame.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn is_key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }
}

/// One frame of recorded input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    #[serde(default)]
    pub events: Vec<(Key, KeyState)>,
    #[serde(default)]
    pub quit: bool,
}

/// Input source that replays a fixed list of frames, then reports quit.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Parse a JSON array of [`InputFrame`]s.
    pub fn from_json(json: &str) -> Result<Self> {
        let frames: Vec<InputFrame> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, input: &mut InputState) -> Result<()> {
        match self.frames.pop_front() {
            Some(frame) => {
                for (key, state) in frame.events {
                    input.handle_key(key, state);
                }
                if frame.quit {
                    input.request_quit();
                }
            }
            None => input.request_quit(),
        }
        Ok(())
    }
}
