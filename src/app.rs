use crate::config::{load_settings, project_paths, Settings};
use crate::input::{command_for_key, max_floor_digits, parse_floor_entry, Key, LineInput};
use crate::logging;
use crate::model::{Command, Elevator};
use crate::render::{draw_frame, Palette, Surface, Terminal};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

pub(crate) struct App<S: Surface> {
    elevator: Elevator,
    palette: Palette,
    tick_period: Duration,
    surface: S,
}

impl<S: Surface> App<S> {
    pub(crate) fn new(surface: S, settings: &Settings) -> Self {
        Self {
            elevator: Elevator::new(settings.num_floors),
            palette: Palette::new(settings.enable_color),
            tick_period: Duration::from_millis(settings.tick_ms),
            surface,
        }
    }

    fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let started = Instant::now();
            if self.step()? == Flow::Quit {
                break;
            }
            spin_sleep(tick_remainder(self.tick_period, started.elapsed()), Instant::now());
        }
        Ok(())
    }

    /// One tick: at most one command, one physics step, one frame.
    pub(crate) fn step(&mut self) -> anyhow::Result<Flow> {
        let command = match self.surface.poll_key()? {
            None => Command::None,
            Some(Key::Interrupt) => {
                info!("interrupted");
                return Ok(Flow::Quit);
            }
            // The prompt blocks; the clock only resumes once it closes.
            Some(Key::Space) => match self.select_floor()? {
                Some(command) => command,
                None => return Ok(Flow::Quit),
            },
            Some(key) => command_for_key(key),
        };

        self.elevator.handle_command(command);
        self.elevator.tick();
        trace!(
            height = self.elevator.current_height(),
            speed = self.elevator.speed(),
            travel_distance = self.elevator.travel_distance(),
            "tick"
        );

        self.surface.viewport_size()?;
        draw_frame(self.surface.frame(), &self.elevator, &self.palette);
        self.surface.present()?;
        Ok(Flow::Continue)
    }

    /// `None` when the user interrupted from inside the prompt.
    fn select_floor(&mut self) -> anyhow::Result<Option<Command>> {
        let num_floors = self.elevator.num_floors();
        let prompt = format!("Floor 1-{num_floors}:");
        let entry = self
            .surface
            .read_line(&prompt, max_floor_digits(num_floors))?;

        let raw = match entry {
            LineInput::Interrupted => return Ok(None),
            LineInput::Entered(raw) => raw,
        };
        match parse_floor_entry(&raw) {
            Some(floor) => Ok(Some(Command::GoToFloor(floor))),
            None => {
                debug!(entry = %raw, "floor entry is not a number");
                Ok(Some(Command::None))
            }
        }
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let paths = project_paths()?;
    let settings = load_settings(&paths.settings_path);
    logging::init(&paths.log_path, &settings.log_filter);
    info!(
        num_floors = settings.num_floors,
        tick_ms = settings.tick_ms,
        "starting"
    );

    let term = Terminal::begin()?;
    let mut app = App::new(term, &settings);
    let res = app.run();
    let restored = app.surface.end();
    res?;
    restored
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

/// Time left in the tick; zero once the tick has overrun.
pub(crate) fn tick_remainder(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CellBuffer;
    use anyhow::Result;
    use std::collections::VecDeque;

    struct ScriptedSurface {
        keys: VecDeque<Key>,
        lines: VecDeque<LineInput>,
        size: (u16, u16),
        buf: CellBuffer,
        presented: usize,
        prompts: Vec<(String, usize)>,
        cursor_visible: bool,
    }

    impl ScriptedSurface {
        fn new(keys: &[Key], lines: &[&str]) -> Self {
            Self {
                keys: keys.iter().copied().collect(),
                lines: lines
                    .iter()
                    .map(|l| LineInput::Entered(l.to_string()))
                    .collect(),
                size: (24, 80),
                buf: CellBuffer::new(80, 24),
                presented: 0,
                prompts: Vec::new(),
                cursor_visible: false,
            }
        }
    }

    impl Surface for ScriptedSurface {
        fn viewport_size(&mut self) -> Result<(u16, u16)> {
            let (rows, cols) = self.size;
            if self.buf.w != cols || self.buf.h != rows {
                self.buf = CellBuffer::new(cols, rows);
            }
            Ok(self.size)
        }

        fn frame(&mut self) -> &mut CellBuffer {
            &mut self.buf
        }

        fn present(&mut self) -> Result<()> {
            self.presented += 1;
            Ok(())
        }

        fn poll_key(&mut self) -> Result<Option<Key>> {
            Ok(self.keys.pop_front())
        }

        fn read_line(&mut self, prompt: &str, max_digits: usize) -> Result<LineInput> {
            self.prompts.push((prompt.to_string(), max_digits));
            self.set_cursor_visible(true)?;
            let line = self
                .lines
                .pop_front()
                .unwrap_or(LineInput::Entered(String::new()));
            self.set_cursor_visible(false)?;
            Ok(line)
        }

        fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
            self.cursor_visible = visible;
            Ok(())
        }
    }

    fn settings(num_floors: u32) -> Settings {
        Settings {
            num_floors,
            ..Settings::default()
        }
    }

    fn app(num_floors: u32, keys: &[Key], lines: &[&str]) -> App<ScriptedSurface> {
        App::new(ScriptedSurface::new(keys, lines), &settings(num_floors))
    }

    #[test]
    fn idle_step_ticks_and_presents_once() {
        let mut a = app(10, &[], &[]);
        assert_eq!(a.step().unwrap(), Flow::Continue);
        assert_eq!(a.surface.presented, 1);
        assert_eq!(a.elevator.speed(), 0.0);
        assert!(a.surface.buf.row_text(4).starts_with("Emergency Stop:    <s>"));
    }

    #[test]
    fn floor_prompt_starts_a_trip_and_ticks_once() {
        let mut a = app(10, &[Key::Space], &["5"]);
        a.step().unwrap();
        assert_eq!(a.surface.prompts, vec![("Floor 1-10:".to_string(), 2)]);
        assert!(!a.surface.cursor_visible);
        assert_eq!(a.elevator.target_floor(), 4);
        assert_eq!(a.elevator.travel_distance(), 80.0);

        let one_tick = 0.5 + 0.05 * 80f64.log10();
        assert!((a.elevator.current_height() - one_tick).abs() < 1e-12);
    }

    #[test]
    fn bad_floor_entries_change_nothing() {
        for entry in ["abc", "", "0", "11", "-4"] {
            let mut a = app(10, &[Key::Space], &[entry]);
            a.step().unwrap();
            assert_eq!(a.elevator.target_floor(), 0, "entry {entry:?}");
            assert_eq!(a.elevator.travel_distance(), 0.0, "entry {entry:?}");
            assert_eq!(a.elevator.current_height(), 0.0, "entry {entry:?}");
        }
    }

    #[test]
    fn prompt_width_follows_floor_count() {
        let mut a = app(10_000, &[Key::Space], &["9999"]);
        a.step().unwrap();
        assert_eq!(a.surface.prompts[0].1, 5);
        assert_eq!(a.elevator.target_floor(), 9_998);
    }

    #[test]
    fn ctrl_c_quits_without_drawing() {
        let mut a = app(10, &[Key::Interrupt], &[]);
        assert_eq!(a.step().unwrap(), Flow::Quit);
        assert_eq!(a.surface.presented, 0);
    }

    #[test]
    fn ctrl_c_inside_prompt_quits() {
        let mut a = app(10, &[Key::Space], &[]);
        a.surface.lines.push_back(LineInput::Interrupted);
        assert_eq!(a.step().unwrap(), Flow::Quit);
    }

    #[test]
    fn arrow_keys_nudge_after_settling() {
        let mut a = app(10, &[Key::Up], &[]);
        // first tick settles the start state, so the nudge is ignored
        a.step().unwrap();
        assert_eq!(a.elevator.target_floor(), 0);

        a.surface.keys.push_back(Key::Up);
        a.step().unwrap();
        assert_eq!(a.elevator.target_floor(), 1);
        assert_eq!(a.elevator.current_height(), 0.5);
    }

    #[test]
    fn s_key_stops_the_car() {
        let mut a = app(10, &[Key::Space], &["9"]);
        for _ in 0..30 {
            a.step().unwrap();
        }
        let floor = a.elevator.current_floor();
        a.surface.keys.push_back(Key::CharS);
        a.step().unwrap();
        assert_eq!(a.elevator.target_floor(), floor);
        assert_eq!(a.elevator.travel_distance(), 0.0);
    }

    #[test]
    fn frames_follow_viewport_resizes() {
        let mut a = app(10, &[], &[]);
        a.step().unwrap();
        a.surface.size = (40, 120);
        a.step().unwrap();
        assert_eq!((a.surface.buf.h, a.surface.buf.w), (40, 120));
        assert!(a.surface.buf.row_text(20).contains("╔═════════╗"));
    }

    #[test]
    fn overrun_ticks_do_not_sleep() {
        let period = Duration::from_millis(30);
        assert_eq!(
            tick_remainder(period, Duration::from_millis(10)),
            Duration::from_millis(20)
        );
        assert_eq!(tick_remainder(period, Duration::from_millis(45)), Duration::ZERO);
    }
}
