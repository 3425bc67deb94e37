use crate::model::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Key {
    Up,
    Down,
    Space,
    CharS,
    /// Ctrl+C. Raw mode swallows SIGINT, so it shows up as a key.
    Interrupt,
    Other,
}

/// Outcome of the blocking floor prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LineInput {
    Entered(String),
    Interrupted,
}

pub(crate) fn key_from_event(ev: KeyEvent) -> Option<Key> {
    if ev.kind != KeyEventKind::Press && ev.kind != KeyEventKind::Repeat {
        return None;
    }
    if is_interrupt(&ev) {
        return Some(Key::Interrupt);
    }
    let key = match ev.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char('s') => Key::CharS,
        _ => Key::Other,
    };
    Some(key)
}

pub(crate) fn is_interrupt(ev: &KeyEvent) -> bool {
    matches!(ev.code, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.modifiers.contains(KeyModifiers::CONTROL)
}

/// Space is not mapped here: the loop opens the floor prompt for it.
pub(crate) fn command_for_key(key: Key) -> Command {
    match key {
        Key::Up => Command::MoveUp,
        Key::Down => Command::MoveDown,
        Key::CharS => Command::EmergencyStop,
        Key::Space | Key::Interrupt | Key::Other => Command::None,
    }
}

pub(crate) fn parse_floor_entry(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Width of the prompt's entry field: enough digits for the top floor.
pub(crate) fn max_floor_digits(num_floors: u32) -> usize {
    num_floors.to_string().len()
}
