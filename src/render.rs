use crate::input::{is_interrupt, key_from_event, Key, LineInput};
use crate::model::{Elevator, FLOOR_HEIGHT};
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Write `text` starting at (`row`, `col`). Characters that land off
    /// the grid are dropped.
    pub(crate) fn write_at(&mut self, row: i64, col: i64, text: &str) {
        self.write_styled(row, col, text, Color::White);
    }

    pub(crate) fn write_styled(&mut self, row: i64, col: i64, text: &str, fg: Color) {
        if row < 0 || row >= i64::from(self.h) {
            return;
        }
        for (i, ch) in text.chars().enumerate() {
            let x = col + i as i64;
            if x < 0 {
                continue;
            }
            if x >= i64::from(self.w) {
                break;
            }
            self.set(
                x as u16,
                row as u16,
                Cell {
                    ch,
                    fg,
                    bg: Color::Black,
                },
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn row_text(&self, y: u16) -> String {
        (0..self.w).map(|x| self.cells[self.idx(x, y)].ch).collect()
    }
}

/// Everything the loop needs from the terminal. Injected so the loop and
/// renderer run headless in tests.
pub(crate) trait Surface {
    /// `(rows, cols)`, re-read every frame; the back buffer follows resizes.
    fn viewport_size(&mut self) -> Result<(u16, u16)>;
    /// Back buffer for the next frame.
    fn frame(&mut self) -> &mut CellBuffer;
    fn present(&mut self) -> Result<()>;
    /// Next pending key, without waiting.
    fn poll_key(&mut self) -> Result<Option<Key>>;
    /// Blocking modal entry of at most `max_digits` characters.
    fn read_line(&mut self, prompt: &str, max_digits: usize) -> Result<LineInput>;
    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    full_redraw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )
        .context("failed to enter the alternate screen")?;
        terminal::enable_raw_mode().context("failed to enable raw mode")?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            full_redraw: true,
        })
    }

    pub(crate) fn end(&mut self) -> Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        tracing::debug!(cols = c, rows = r, "viewport resized");
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.full_redraw = true;
        Ok(true)
    }

    fn flush_cells(&mut self) -> Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        let diff_only = !self.full_redraw;
        if self.full_redraw {
            queue!(self.out, Clear(ClearType::All))?;
            self.full_redraw = false;
        }

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }

    fn move_cursor(&mut self, row: i64, col: i64) -> Result<()> {
        if row >= 0 && col >= 0 && row < i64::from(self.rows) && col < i64::from(self.cols) {
            execute!(self.out, cursor::MoveTo(col as u16, row as u16))?;
        }
        Ok(())
    }
}

impl Surface for Terminal {
    fn viewport_size(&mut self) -> Result<(u16, u16)> {
        self.resize_if_needed()?;
        Ok((self.rows, self.cols))
    }

    fn frame(&mut self) -> &mut CellBuffer {
        &mut self.cur
    }

    fn present(&mut self) -> Result<()> {
        self.flush_cells()
    }

    fn poll_key(&mut self) -> Result<Option<Key>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(k) = event::read()? {
                if let Some(key) = key_from_event(k) {
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    fn read_line(&mut self, prompt: &str, max_digits: usize) -> Result<LineInput> {
        let (bh, bw) = (PROMPT_HEIGHT, PROMPT_WIDTH);
        let y0 = i64::from(self.rows) / 2 - bh / 2;
        let x0 = i64::from(self.cols) / 2 - bw / 2;

        draw_box(&mut self.cur, y0, x0, bh, bw);
        self.cur.write_at(y0 + 1, x0 + 1, prompt);

        let mut entry = String::new();
        self.set_cursor_visible(true)?;
        let outcome = loop {
            let field = format!("{entry:<max_digits$}");
            self.cur.write_at(y0 + 2, x0 + 1, &field);
            self.flush_cells()?;
            self.move_cursor(y0 + 2, x0 + 1 + entry.chars().count() as i64)?;

            let Event::Key(k) = event::read()? else {
                continue;
            };
            if k.kind != KeyEventKind::Press && k.kind != KeyEventKind::Repeat {
                continue;
            }
            if is_interrupt(&k) {
                break LineInput::Interrupted;
            }
            match k.code {
                KeyCode::Enter => break LineInput::Entered(entry),
                KeyCode::Esc => break LineInput::Entered(String::new()),
                KeyCode::Backspace => {
                    entry.pop();
                }
                KeyCode::Char(ch) if !ch.is_control() && entry.chars().count() < max_digits => {
                    entry.push(ch);
                }
                _ => {}
            }
        };
        self.set_cursor_visible(false)?;
        Ok(outcome)
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        if visible {
            execute!(self.out, cursor::Show)?;
        } else {
            execute!(self.out, cursor::Hide)?;
        }
        Ok(())
    }
}

const PROMPT_HEIGHT: i64 = 5;
const PROMPT_WIDTH: i64 = 20;

fn draw_box(buf: &mut CellBuffer, y0: i64, x0: i64, h: i64, w: i64) {
    let inner = "─".repeat((w - 2).max(0) as usize);
    let blank = " ".repeat((w - 2).max(0) as usize);
    buf.write_at(y0, x0, &format!("┌{inner}┐"));
    for y in y0 + 1..y0 + h - 1 {
        buf.write_at(y, x0, &format!("│{blank}│"));
    }
    buf.write_at(y0 + h - 1, x0, &format!("└{inner}┘"));
}

/* -----------------------------
   Scene: sprites + palette
------------------------------ */

const FLOOR_MARKER: &str = "|---------|";
const SHAFT_WALL: &str = "|         |";

const CLOUD: [&str; 4] = [
    "   .--.   ",
    "  (    )  ",
    "(        )",
    " \\--__--/  ",
];

/// (period, offset) of the two background clouds in world units.
const LEFT_CLOUD: (f64, f64) = (150.0, 0.0);
const RIGHT_CLOUD: (f64, f64) = (200.0, 50.0);

/// Car box with the 1-based floor number right-aligned in a 5-wide field.
pub(crate) fn car_sprite(floor: u32) -> [String; 8] {
    let label = floor.to_string();
    let pad = " ".repeat(5usize.saturating_sub(label.len()));
    [
        "╔═════════╗".to_string(),
        "║  Floor  ║".to_string(),
        format!("║{pad}{label}    ║"),
        "║    O    ║".to_string(),
        "║   \\|/   ║".to_string(),
        "║    |    ║".to_string(),
        "║   / \\   ║".to_string(),
        "╚═════════╝".to_string(),
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Palette {
    pub(crate) panel: Color,
    pub(crate) shaft: Color,
    pub(crate) car: Color,
    pub(crate) ground: Color,
    pub(crate) cloud: Color,
}

impl Palette {
    pub(crate) fn new(enable_color: bool) -> Self {
        if !enable_color {
            return Self {
                panel: Color::White,
                shaft: Color::White,
                car: Color::White,
                ground: Color::White,
                cloud: Color::White,
            };
        }
        Self {
            panel: Color::White,
            shaft: Color::DarkGrey,
            car: Color::Yellow,
            ground: Color::DarkGreen,
            cloud: Color::Grey,
        }
    }
}

/* -----------------------------
   Frame renderer
------------------------------ */

/// Redraw the whole frame from `elevator`. Depends only on the snapshot and
/// the buffer size.
pub(crate) fn draw_frame(buf: &mut CellBuffer, elevator: &Elevator, pal: &Palette) {
    buf.clear();

    let h = i64::from(buf.h);
    let w = i64::from(buf.w);
    let current_y = elevator.current_height();

    draw_status_panel(buf, elevator, pal);

    let sprite = car_sprite(elevator.current_floor() + 1);
    let sprite_h = sprite.len() as i64;
    let y_offset = current_y as i64;

    // ground
    if current_y >= (-h).div_euclid(2) as f64 {
        let ground_row = h / 2 + y_offset + sprite_h - 1;
        if ground_row < h - 1 {
            buf.write_styled(ground_row, 0, &"-".repeat(w as usize), pal.ground);
        }
    }

    // shaft
    let x_pos = w / 2;
    let shaft_limit = sprite_h + h / 2 - 2;
    for screen_y in 0..h {
        let world_y = screen_y - y_offset;
        if world_y > shaft_limit {
            break;
        }
        if world_y.rem_euclid(i64::from(FLOOR_HEIGHT)) == 0 {
            if world_y < shaft_limit {
                buf.write_styled(screen_y, x_pos, FLOOR_MARKER, pal.shaft);
            }
        } else {
            buf.write_styled(screen_y, x_pos, SHAFT_WALL, pal.shaft);
        }
    }

    for (idx, line) in sprite.iter().enumerate() {
        buf.write_styled(h / 2 + idx as i64, w / 2, line, pal.car);
    }

    draw_cloud(buf, current_y, LEFT_CLOUD, w / 4, pal.cloud);
    draw_cloud(buf, current_y, RIGHT_CLOUD, 3 * w / 4, pal.cloud);
}

fn draw_status_panel(buf: &mut CellBuffer, elevator: &Elevator, pal: &Palette) {
    let floors = elevator.num_floors();
    let lines = [
        format!("Current Height:    {:.1}m", elevator.current_height()),
        format!("Current Floor:     {}/{}", elevator.current_floor() + 1, floors),
        format!("Target Floor:      {}/{}", elevator.target_floor() + 1, floors),
        "Select Floor:      <SPACE>".to_string(),
        "Emergency Stop:    <s>".to_string(),
        "Up/Down One Floor: <UP>/<DOWN>".to_string(),
        "Quit:              <CTRL + C>".to_string(),
    ];
    for (i, line) in lines.iter().enumerate() {
        buf.write_styled(i as i64, 0, line, pal.panel);
    }
}

fn draw_cloud(buf: &mut CellBuffer, current_y: f64, (period, offset): (f64, f64), x: i64, fg: Color) {
    let h = i64::from(buf.h);
    let half = (h / 2) as f64;
    let anchor_y = (current_y / period).floor() * period + offset;

    // Nearly always true; the per-row bounds check does the real clipping.
    let maybe_on_screen = anchor_y - current_y <= half || current_y - anchor_y >= half;
    if !maybe_on_screen {
        return;
    }

    for (idx, line) in CLOUD.iter().enumerate() {
        let screen_y = (current_y - anchor_y) as i64 + idx as i64;
        if screen_y < 0 || screen_y >= h {
            continue;
        }
        buf.write_styled(screen_y, x, line, fg);
    }
}
