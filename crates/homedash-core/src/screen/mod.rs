//! Screen selection, overlays and backlight policy.

mod controller;

#[cfg(test)]
mod tests;

pub use controller::{Controller, View};

/// Screens shown in multi-screen mode, in button order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScreenId {
    Boiler,
    Electricity,
    About,
}

impl ScreenId {
    pub const COUNT: u8 = 3;

    pub const fn index(self) -> u8 {
        match self {
            Self::Boiler => 0,
            Self::Electricity => 1,
            Self::About => 2,
        }
    }

    pub const fn from_index(index: u8) -> Self {
        match index % Self::COUNT {
            0 => Self::Boiler,
            1 => Self::Electricity,
            _ => Self::About,
        }
    }

    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Brightness {
    Full,
    Dim,
}

impl Brightness {
    /// Backlight duty on a 0..=255 scale.
    pub const fn level(self) -> u8 {
        match self {
            Self::Full => 255,
            Self::Dim => 1,
        }
    }
}

/// How button presses pick screens.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ButtonMode {
    /// Button `i` shows screen `i`.
    Direct,
    /// Any button advances to the next screen.
    Cycle,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisplayMode {
    /// Boiler, electricity and about screens with an indicator bar.
    MultiScreen,
    /// One large boiler temperature; a press asks for a fresh reading.
    SingleValue,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub idle_threshold_ms: u64,
    pub welcome_ms: u64,
    pub button_mode: ButtonMode,
    pub display_mode: DisplayMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            idle_threshold_ms: 10_000,
            welcome_ms: 5_000,
            button_mode: ButtonMode::Direct,
            display_mode: DisplayMode::MultiScreen,
        }
    }
}

impl ControllerConfig {
    pub const fn with_idle_threshold_ms(mut self, idle_threshold_ms: u64) -> Self {
        self.idle_threshold_ms = idle_threshold_ms;
        self
    }

    pub const fn with_welcome_ms(mut self, welcome_ms: u64) -> Self {
        self.welcome_ms = welcome_ms;
        self
    }

    pub const fn with_button_mode(mut self, button_mode: ButtonMode) -> Self {
        self.button_mode = button_mode;
        self
    }

    pub const fn with_display_mode(mut self, display_mode: DisplayMode) -> Self {
        self.display_mode = display_mode;
        self
    }
}

/// Board backlight driver.
pub trait Backlight {
    type Error;

    fn set_brightness(&mut self, brightness: Brightness) -> Result<(), Self::Error>;
}
