#![forbid(unsafe_code)]

//! Minimal Redux-style store the demo commands dispatch into.
//!
//! State is replaced wholesale by a pure reducer on every dispatch. The undo
//! stack never looks inside; commands only remember which actions to
//! dispatch on undo and redo.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::DemoError;

/// Store handle shared between the application and its commands.
pub type SharedStore = Rc<RefCell<Store>>;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = DemoError;

    /// Parse `#rrggbb` or one of a few color names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let named = match s.to_ascii_lowercase().as_str() {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::rgb(0, 0, 0)),
            "red" => Some(Self::rgb(255, 0, 0)),
            "green" => Some(Self::rgb(0, 255, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let invalid = || DemoError::InvalidColor {
            value: s.to_string(),
        };
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Application state edited by the demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub color: Color,
    pub text: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            text: "Result".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetColor(Color),
    SetText(String),
}

impl Action {
    /// Action type string, also used as the id of the matching command.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetColor(_) => "app/SetColor",
            Self::SetText(_) => "app/SetText",
        }
    }
}

/// Pure reducer: the next state for `action`.
#[must_use]
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    match action {
        Action::SetColor(color) => AppState {
            color: *color,
            ..state.clone()
        },
        Action::SetText(text) => AppState {
            text: text.clone(),
            ..state.clone()
        },
    }
}

/// Holds the current state and counts dispatches.
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
    dispatched: u64,
}

impl Store {
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            dispatched: 0,
        }
    }

    #[must_use]
    pub fn shared(state: AppState) -> SharedStore {
        Rc::new(RefCell::new(Self::new(state)))
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of actions dispatched so far.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn dispatch(&mut self, action: Action) {
        tracing::trace!(kind = action.kind(), "store dispatch");
        self.state = reduce(&self.state, &action);
        self.dispatched += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_hex_colors() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::rgb(255, 0, 0));
        assert_eq!("White".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#102030".parse::<Color>().unwrap(), Color::rgb(16, 32, 48));
    }

    #[test]
    fn rejects_bad_colors() {
        for bad in ["", "#12345", "#gg0000", "purple", "102030", "#12345é"] {
            assert!(bad.parse::<Color>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn color_display_is_hex() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#ff0010");
    }

    #[test]
    fn reducer_replaces_one_field() {
        let state = AppState::default();
        let next = reduce(&state, &Action::SetText("hello".into()));
        assert_eq!(next.text, "hello");
        assert_eq!(next.color, Color::WHITE);

        let next = reduce(&next, &Action::SetColor(Color::rgb(1, 2, 3)));
        assert_eq!(next.text, "hello");
        assert_eq!(next.color, Color::rgb(1, 2, 3));
    }

    #[test]
    fn dispatch_updates_state_and_count() {
        let mut store = Store::default();
        assert_eq!(store.state().text, "Result");
        store.dispatch(Action::SetText("x".into()));
        assert_eq!(store.state().text, "x");
        assert_eq!(store.dispatched(), 1);
    }

    #[test]
    fn action_kinds() {
        assert_eq!(Action::SetColor(Color::WHITE).kind(), "app/SetColor");
        assert_eq!(Action::SetText(String::new()).kind(), "app/SetText");
    }
}
