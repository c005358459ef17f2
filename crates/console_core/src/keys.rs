//! Keyboard surface: letter keys steer the ship, arrow keys pilot the
//! selected submersible. Every binding is suppressed while a text input has
//! focus.

use std::str::FromStr;

use shared::domain::{Course, PilotAction, Route, Rudder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut chars = raw.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(Self::Char(ch));
        }
        match raw.to_ascii_lowercase().as_str() {
            "arrowup" | "up" => Ok(Self::ArrowUp),
            "arrowdown" | "down" => Ok(Self::ArrowDown),
            "arrowleft" | "left" => Ok(Self::ArrowLeft),
            "arrowright" | "right" => Ok(Self::ArrowRight),
            other => Err(format!("unknown key '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub text_input_focused: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            text_input_focused: false,
        }
    }

    pub fn focused(key: Key) -> Self {
        Self {
            key,
            text_input_focused: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIntent {
    Navigate { rudder: Rudder, course: Course },
    /// Pilot whichever submersible is currently selected.
    PilotSelected { route: Route, action: PilotAction },
}

pub fn binding(key: Key) -> Option<KeyIntent> {
    let navigate = |rudder, course| Some(KeyIntent::Navigate { rudder, course });
    let pilot = |route| {
        Some(KeyIntent::PilotSelected {
            route,
            action: PilotAction::Move,
        })
    };
    match key {
        Key::Char(ch) => match ch.to_ascii_lowercase() {
            'w' => navigate(Rudder::Center, Course::Forward),
            's' => navigate(Rudder::Center, Course::Backward),
            'a' => navigate(Rudder::Left, Course::Forward),
            'd' => navigate(Rudder::Right, Course::Forward),
            'q' => navigate(Rudder::Left, Course::Backward),
            'e' => navigate(Rudder::Right, Course::Backward),
            _ => None,
        },
        Key::ArrowUp => pilot(Route::C),
        Key::ArrowDown => pilot(Route::Down),
        Key::ArrowLeft => pilot(Route::W),
        Key::ArrowRight => pilot(Route::E),
    }
}

pub fn resolve(input: KeyInput) -> Option<KeyIntent> {
    if input.text_input_focused {
        return None;
    }
    binding(input.key)
}
