//! Character-cell renderer. Translates frame snapshots into terminal
//! commands; no game logic lives here.

use std::io::Write;

use anyhow::Result;
use brickrun::entities::{EnemyKind, PowerUpKind, ShellColor};
use brickrun::{FrameSnapshot, Phase, Renderer, SpriteKind, SpriteView};
use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};

const MAX_COLUMNS: u16 = 100;
const MAX_ROWS: u16 = 30;

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Color,
}

const EMPTY: Cell = Cell {
    glyph: ' ',
    color: Color::Reset,
};

fn cell_for(kind: SpriteKind) -> Option<Cell> {
    let (glyph, color) = match kind {
        SpriteKind::Ground => ('#', Color::DarkYellow),
        SpriteKind::Brick => ('=', Color::Red),
        SpriteKind::Mystery { has_item: true } => ('?', Color::Yellow),
        SpriteKind::Mystery { has_item: false } => ('o', Color::DarkGrey),
        SpriteKind::Flag => ('|', Color::Green),
        SpriteKind::Coin { edge_on } => (if edge_on { '|' } else { 'o' }, Color::Yellow),
        SpriteKind::PowerUp(PowerUpKind::Life) => ('+', Color::Magenta),
        SpriteKind::PowerUp(PowerUpKind::Star) => ('*', Color::Yellow),
        SpriteKind::Enemy {
            kind: EnemyKind::Goomba,
            ..
        } => ('g', Color::DarkRed),
        SpriteKind::Enemy {
            kind: EnemyKind::Koopa,
            shell,
        } => (
            'k',
            match shell {
                Some(ShellColor::Red) => Color::Red,
                _ => Color::Green,
            },
        ),
        SpriteKind::Player {
            invincible,
            invincible_frames,
            ..
        } => {
            // Blink while invincible.
            if invincible && (invincible_frames / 4) % 2 == 1 {
                return None;
            }
            ('@', Color::Cyan)
        }
    };
    Some(Cell { glyph, color })
}

/// Grid of cells covering the whole world.
struct Canvas {
    columns: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Canvas {
    fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns,
            rows,
            cells: vec![EMPTY; usize::from(columns) * usize::from(rows)],
        }
    }

    fn paint(&mut self, sprite: &SpriteView, world_size: (f32, f32), cell: Cell) {
        let (world_w, world_h) = world_size;
        let sx = f32::from(self.columns) / world_w;
        let sy = f32::from(self.rows) / world_h;

        let columns = f32::from(self.columns);
        let rows = f32::from(self.rows);
        let b = sprite.bounds;
        let left = (b.left() * sx).floor().clamp(0.0, columns);
        let top = (b.top() * sy).floor().clamp(0.0, rows);
        let right = (b.right() * sx).ceil().max(left + 1.0).min(columns) as u16;
        let bottom = (b.bottom() * sy).ceil().max(top + 1.0).min(rows) as u16;
        let (left, top) = (left as u16, top as u16);

        for row in top..bottom {
            for column in left..right {
                let index = usize::from(row) * usize::from(self.columns) + usize::from(column);
                self.cells[index] = cell;
            }
        }
    }
}

/// Draws snapshots into a terminal.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn canvas_size() -> Result<(u16, u16)> {
        let (width, height) = terminal::size()?;
        // Two rows for the HUD and the hint line.
        Ok((
            width.clamp(1, MAX_COLUMNS),
            height.saturating_sub(2).clamp(1, MAX_ROWS),
        ))
    }

    fn draw_canvas(&mut self, canvas: &Canvas) -> Result<()> {
        for row in 0..canvas.rows {
            self.out.queue(cursor::MoveTo(0, row + 1))?;
            let start = usize::from(row) * usize::from(canvas.columns);
            let mut color = None;
            for cell in &canvas.cells[start..start + usize::from(canvas.columns)] {
                if color != Some(cell.color) {
                    self.out.queue(style::SetForegroundColor(cell.color))?;
                    color = Some(cell.color);
                }
                self.out.queue(Print(cell.glyph))?;
            }
        }
        Ok(())
    }

    fn draw_banner(&mut self, canvas: &Canvas, text: &str, color: Color) -> Result<()> {
        let column = (canvas.columns / 2).saturating_sub(text.chars().count() as u16 / 2);
        self.out.queue(cursor::MoveTo(column, canvas.rows / 2 + 1))?;
        self.out.queue(style::SetForegroundColor(color))?;
        self.out.queue(Print(text))?;
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<()> {
        let (columns, rows) = Self::canvas_size()?;
        let mut canvas = Canvas::new(columns, rows);
        for sprite in &frame.sprites {
            if let Some(cell) = cell_for(sprite.kind) {
                canvas.paint(sprite, frame.world_size, cell);
            }
        }

        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        self.out.queue(cursor::MoveTo(0, 0))?;
        self.out.queue(style::SetForegroundColor(Color::White))?;
        self.out.queue(Print(format!(
            "Level {}   Score {}   Lives {}",
            frame.level, frame.score, frame.lives
        )))?;

        self.draw_canvas(&canvas)?;

        match frame.phase {
            Phase::Start => self.draw_banner(
                &canvas,
                " BRICKRUN - press Enter to start ",
                Color::Cyan,
            )?,
            Phase::GameOver => self.draw_banner(
                &canvas,
                &format!(" GAME OVER - score {} - press R to restart ", frame.score),
                Color::Red,
            )?,
            Phase::Playing => {}
        }

        self.out.queue(cursor::MoveTo(0, canvas.rows + 1))?;
        self.out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        self.out
            .queue(Print("<- -> / A D : move   Space / Up : jump   Esc / Q : quit"))?;
        self.out.queue(style::ResetColor)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickrun::{Rect, Session};

    #[test]
    fn sprites_scale_to_the_canvas() {
        let session = Session::classic().unwrap();
        let snapshot = session.snapshot();
        let mut canvas = Canvas::new(80, 30);
        for sprite in &snapshot.sprites {
            if let Some(cell) = cell_for(sprite.kind) {
                canvas.paint(sprite, snapshot.world_size, cell);
            }
        }

        // Ground fills the bottom rows: y 550..600 of 600 maps to rows 27..30.
        assert!(canvas.cells[29 * 80..].iter().all(|c| c.glyph == '#'));
        assert!(canvas.cells.iter().any(|c| c.glyph == '@'));
    }

    #[test]
    fn sprites_outside_the_world_are_clipped() {
        let mut canvas = Canvas::new(10, 10);
        let sprite = SpriteView {
            id: Session::classic().unwrap().world().player_id,
            bounds: Rect::new(750.0, 580.0, 100.0, 100.0),
            kind: SpriteKind::Brick,
        };
        let cell = Cell {
            glyph: '=',
            color: Color::Red,
        };
        canvas.paint(&sprite, (800.0, 600.0), cell);
        assert_eq!(canvas.cells[99].glyph, '=');
    }
}
