mod display;
mod keys;

use std::io::{stdout, BufWriter, Write};
use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use brickrun::{Engine, LevelSet, Session, SimConfig};
use crossterm::{
    cursor,
    event::{
        self, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};

use crate::display::TerminalRenderer;
use crate::keys::TerminalInput;

const CONFIG_FILE: &str = "brickrun.json";
const LEVELS_FILE: &str = "levels.json";

/// Raw mode and the alternate screen for as long as it lives.
struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    fn enter<W: Write>(out: &mut W) -> Result<Self> {
        terminal::enable_raw_mode()?;
        out.execute(terminal::EnterAlternateScreen)?;
        out.execute(cursor::Hide)?;

        // Terminals that speak the kitty protocol report key releases.
        let keyboard_enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true))
            && out
                .execute(PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
                ))
                .is_ok();
        Ok(Self { keyboard_enhanced })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = stdout();
        if self.keyboard_enhanced {
            let _ = out.execute(PopKeyboardEnhancementFlags);
        }
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn load_config() -> Result<SimConfig> {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Ok(SimConfig::default());
    }
    let config = SimConfig::load_from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    log::info!("using configuration from {}", path.display());
    Ok(config)
}

fn load_levels() -> Result<LevelSet> {
    let path = Path::new(LEVELS_FILE);
    if !path.exists() {
        return Ok(LevelSet::classic()?);
    }
    let levels = LevelSet::load_from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    log::info!("loaded {} levels from {}", levels.len(), path.display());
    Ok(levels)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = load_config()?;
    let mut session = Session::new(config, load_levels()?)?;

    let mut out = BufWriter::new(stdout());
    let guard = TerminalGuard::enter(&mut out)?;

    // Blocking reads live on their own thread so the frame loop never waits on I/O.
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        while let Ok(event) = event::read() {
            if tx.send(event).is_err() {
                break;
            }
        }
    });

    let mut input = TerminalInput::new(rx, guard.keyboard_enhanced);
    let mut renderer = TerminalRenderer::new(out);
    let reason = Engine::new()
        .with_title("brickrun")
        .run(&mut session, &mut input, &mut renderer)?;

    drop(guard);
    println!(
        "{reason:?}: level {}, score {}",
        session.level(),
        session.score()
    );
    Ok(())
}
