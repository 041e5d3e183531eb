//! Input abstraction layer.

mod mock;

pub use mock::MockInput;

/// Front-panel buttons, left to right.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Button {
    A,
    B,
    C,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::A, Button::B, Button::C];

    pub const fn index(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }
}

/// Logical actions consumed by the dashboard.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    /// A button went from released to pressed.
    Press(Button),
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}
