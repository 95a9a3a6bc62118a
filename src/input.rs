//! Maps discrete user input to engine commands.
//!
//! The mapping is fixed; unrecognized input maps to nothing.

use std::fmt;
use std::str::FromStr;

/// Pan distance for an arrow key.
pub const PAN_STEP: f64 = 0.02;
/// Pan distance for shift + arrow.
pub const PAN_STEP_LARGE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Left,
    Right,
    Home,
    End,
    Escape,
    Plus,
    Minus,
    Char(char),
}

/// A key with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
        }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            shift: true,
            ..Self::plain(key)
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }
}

impl FromStr for KeyPress {
    type Err = String;

    /// Parses names like `space`, `shift+left`, `ctrl++`, `ctrl+-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let mut rest = lower.as_str();
        let mut press = KeyPress::plain(Key::Space);

        loop {
            if let Some(r) = rest.strip_prefix("ctrl+") {
                press.ctrl = true;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("shift+") {
                press.shift = true;
                rest = r;
            } else {
                break;
            }
        }

        press.key = match rest {
            "space" | " " => Key::Space,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "escape" | "esc" => Key::Escape,
            "+" | "=" | "plus" => Key::Plus,
            "-" | "minus" => Key::Minus,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(format!("unknown key: {s}")),
                }
            }
        };
        Ok(press)
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.key {
            Key::Space => f.write_str("space"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
            Key::Home => f.write_str("home"),
            Key::End => f.write_str("end"),
            Key::Escape => f.write_str("escape"),
            Key::Plus => f.write_str("+"),
            Key::Minus => f.write_str("-"),
            Key::Char(c) => write!(f, "{c}"),
        }
    }
}

/// Anything the user can do to the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Key(KeyPress),
    /// Pointer click on an event marker.
    Click(String),
    /// Double click on an event marker.
    DoubleClick(String),
    /// Pointer moved onto a marker, or off all markers.
    Hover(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlayback,
    Pan(f64),
    SetPosition(f64),
    Deselect,
    ZoomIn,
    ZoomOut,
    Select(String),
    SelectAndJump(String),
    Hover(Option<String>),
}

pub fn dispatch(input: Input) -> Option<Command> {
    match input {
        Input::Key(press) => dispatch_key(press),
        Input::Click(id) => Some(Command::Select(id)),
        Input::DoubleClick(id) => Some(Command::SelectAndJump(id)),
        Input::Hover(id) => Some(Command::Hover(id)),
    }
}

fn dispatch_key(press: KeyPress) -> Option<Command> {
    let pan = if press.shift { PAN_STEP_LARGE } else { PAN_STEP };
    match press.key {
        Key::Plus if press.ctrl => Some(Command::ZoomIn),
        Key::Minus if press.ctrl => Some(Command::ZoomOut),
        Key::Space => Some(Command::TogglePlayback),
        Key::Left => Some(Command::Pan(-pan)),
        Key::Right => Some(Command::Pan(pan)),
        Key::Home => Some(Command::SetPosition(0.0)),
        Key::End => Some(Command::SetPosition(1.0)),
        Key::Escape => Some(Command::Deselect),
        Key::Plus | Key::Minus | Key::Char(_) => None,
    }
}
