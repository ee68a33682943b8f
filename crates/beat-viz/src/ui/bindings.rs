//! Keyboard bindings and input handling.

use nannou::prelude::*;

/// Actions that can be triggered by key presses
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    /// Start the cross-fade to the next pattern now
    Skip,
    NextPattern,
    PreviousPattern,
    FasterTransitions,
    SlowerTransitions,
    SelectDevice(usize),
}

/// Convert a number key to its digit
pub fn key_to_digit(key: Key) -> Option<usize> {
    let digit = match key {
        Key::Key0 => 0,
        Key::Key1 => 1,
        Key::Key2 => 2,
        Key::Key3 => 3,
        Key::Key4 => 4,
        Key::Key5 => 5,
        Key::Key6 => 6,
        Key::Key7 => 7,
        Key::Key8 => 8,
        Key::Key9 => 9,
        _ => return None,
    };
    Some(digit)
}

/// Parse a key into an action
pub fn parse_key(key: Key, shift: bool) -> Option<Action> {
    if let Some(digit) = key_to_digit(key) {
        let offset = if shift { 10 } else { 0 };
        return Some(Action::SelectDevice(digit + offset));
    }

    match key {
        Key::Q => Some(Action::Quit),
        Key::Space => Some(Action::Skip),
        Key::Right => Some(Action::NextPattern),
        Key::Left => Some(Action::PreviousPattern),
        Key::Up => Some(Action::FasterTransitions),
        Key::Down => Some(Action::SlowerTransitions),
        _ => None,
    }
}
