use std::fmt;

use crate::{model::Units, render::Surface};

/// Which of the three panels is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiState {
    Loading,
    Display,
    Error,
}

impl UiState {
    pub const fn all() -> &'static [UiState] {
        &[UiState::Loading, UiState::Display, UiState::Error]
    }
}

/// Visibility flags for the loading, display and error panels.
///
/// Exactly one flag is set after every [`Panels::set_state`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panels {
    loading: bool,
    display: bool,
    error: bool,
    error_text: String,
}

impl Default for Panels {
    fn default() -> Self {
        Self {
            loading: false,
            display: true,
            error: false,
            error_text: String::new(),
        }
    }
}

impl Panels {
    pub fn set_state(&mut self, state: UiState) {
        self.loading = false;
        self.display = false;
        self.error = false;

        match state {
            UiState::Loading => self.loading = true,
            UiState::Display => self.display = true,
            UiState::Error => self.error = true,
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_text = message.into();
        self.set_state(UiState::Error);
    }

    pub fn is_visible(&self, state: UiState) -> bool {
        match state {
            UiState::Loading => self.loading,
            UiState::Display => self.display,
            UiState::Error => self.error,
        }
    }

    pub fn visible(&self) -> UiState {
        UiState::all()
            .iter()
            .copied()
            .find(|s| self.is_visible(*s))
            .unwrap_or(UiState::Display)
    }

    pub fn error_text(&self) -> &str {
        &self.error_text
    }
}

/// Panels plus the slots they reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub panels: Panels,
    pub surface: Surface,
}

impl Screen {
    pub fn new(units: Units) -> Self {
        Self {
            panels: Panels::default(),
            surface: Surface::new(units),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.panels.visible() {
            UiState::Loading => writeln!(f, "Loading..."),
            UiState::Display => write!(f, "{}", self.surface),
            UiState::Error => writeln!(f, "Error: {}", self.panels.error_text()),
        }
    }
}
