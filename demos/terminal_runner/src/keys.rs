//! Terminal key events to logical game keys.

use std::collections::HashMap;

use anyhow::Result;
use brickrun::{InputSource, InputState, Key, KeyState};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Frames a key stays held after its last press or repeat when the terminal
/// never reports releases. About 130 ms at 60 Hz, which OS key repeat
/// refreshes before it runs out.
const HOLD_WINDOW: u64 = 8;

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::Right),
        KeyCode::Up | KeyCode::Char(' ') | KeyCode::Char('w') | KeyCode::Char('W') => {
            Some(Key::Jump)
        }
        KeyCode::Enter => Some(Key::Start),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Key::Restart),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

fn is_quit(event: &KeyEvent) -> bool {
    match event.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') => event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Input source fed by a terminal reader thread.
pub struct TerminalInput {
    events: Receiver<Event>,
    /// Whether the terminal reports key releases.
    releases_reported: bool,
    /// Frame each held key was last seen on.
    last_seen: HashMap<Key, u64>,
    frame: u64,
}

impl TerminalInput {
    pub fn new(events: Receiver<Event>, releases_reported: bool) -> Self {
        Self {
            events,
            releases_reported,
            last_seen: HashMap::new(),
            frame: 0,
        }
    }

    fn handle_event(&mut self, event: KeyEvent, input: &mut InputState) {
        if event.kind == KeyEventKind::Press && is_quit(&event) {
            input.request_quit();
            return;
        }
        let Some(key) = map_key(event.code) else {
            return;
        };

        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.last_seen.insert(key, self.frame);
                input.handle_key(key, KeyState::Pressed);
            }
            KeyEventKind::Release => {
                self.last_seen.remove(&key);
                input.handle_key(key, KeyState::Released);
            }
        }
    }

    fn expire_stale_keys(&mut self, input: &mut InputState) {
        let frame = self.frame;
        let stale: Vec<Key> = self
            .last_seen
            .iter()
            .filter(|(_, &seen)| frame.saturating_sub(seen) > HOLD_WINDOW)
            .map(|(&key, _)| key)
            .collect();
        for key in stale {
            self.last_seen.remove(&key);
            input.handle_key(key, KeyState::Released);
        }
    }
}

impl InputSource for TerminalInput {
    fn poll(&mut self, input: &mut InputState) -> Result<()> {
        self.frame += 1;
        loop {
            match self.events.try_recv() {
                Ok(Event::Key(event)) => self.handle_event(event, input),
                Ok(Event::FocusLost) => {
                    self.last_seen.clear();
                    input.release_all();
                }
                Ok(_) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("terminal reader stopped");
                    input.request_quit();
                    break;
                }
            }
        }

        if !self.releases_reported {
            self.expire_stale_keys(input);
        }
        Ok(())
    }
}
