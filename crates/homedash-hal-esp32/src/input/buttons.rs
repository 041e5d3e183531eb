use embedded_hal::digital::InputPin;

use homedash_core::input::{Button, InputEvent, InputProvider};

#[derive(Debug, Clone, Copy)]
pub struct ButtonConfig {
    active_low: bool,
    debounce_polls: u8,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            debounce_polls: 3,
        }
    }
}

impl ButtonConfig {
    pub const fn with_active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub const fn with_debounce_polls(mut self, debounce_polls: u8) -> Self {
        self.debounce_polls = debounce_polls;
        self
    }
}

#[derive(Debug)]
pub enum ButtonInputError<AErr, BErr, CErr> {
    A(AErr),
    B(BErr),
    C(CErr),
}

type ButtonResult<AErr, BErr, CErr, T> = Result<T, ButtonInputError<AErr, BErr, CErr>>;

/// Debounce state of one momentary switch.
#[derive(Debug, Clone, Copy)]
struct Debounce {
    raw: bool,
    stable: bool,
    stable_count: u8,
}

impl Debounce {
    const fn new(pressed: bool) -> Self {
        Self {
            raw: pressed,
            stable: pressed,
            stable_count: 0,
        }
    }

    /// Feeds one sample; returns `true` on a debounced released -> pressed edge.
    fn sample(&mut self, pressed: bool, threshold: u8) -> bool {
        if pressed == self.raw {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            self.raw = pressed;
            self.stable_count = 0;
        }

        if self.stable_count >= threshold.max(1) && self.stable != self.raw {
            self.stable = self.raw;
            return self.stable;
        }
        false
    }
}

/// The three front-panel buttons, polled once per tick.
#[derive(Debug)]
pub struct FrontButtons<A, B, C> {
    a: A,
    b: B,
    c: C,
    config: ButtonConfig,
    state: [Debounce; 3],
    pending: [bool; 3],
}

impl<A, B, C> FrontButtons<A, B, C>
where
    A: InputPin,
    B: InputPin,
    C: InputPin,
{
    pub fn new(
        mut a: A,
        mut b: B,
        mut c: C,
        config: ButtonConfig,
    ) -> ButtonResult<A::Error, B::Error, C::Error, Self> {
        let a_high = a.is_high().map_err(ButtonInputError::A)?;
        let b_high = b.is_high().map_err(ButtonInputError::B)?;
        let c_high = c.is_high().map_err(ButtonInputError::C)?;

        let state = [a_high, b_high, c_high]
            .map(|high| Debounce::new(pressed_from_level(high, config.active_low)));

        Ok(Self {
            a,
            b,
            c,
            config,
            state,
            pending: [false; 3],
        })
    }

    fn sample_all(&mut self) -> ButtonResult<A::Error, B::Error, C::Error, ()> {
        let levels = [
            self.a.is_high().map_err(ButtonInputError::A)?,
            self.b.is_high().map_err(ButtonInputError::B)?,
            self.c.is_high().map_err(ButtonInputError::C)?,
        ];

        for (index, high) in levels.into_iter().enumerate() {
            let pressed = pressed_from_level(high, self.config.active_low);
            if self.state[index].sample(pressed, self.config.debounce_polls) {
                self.pending[index] = true;
            }
        }
        Ok(())
    }

    fn take_pending(&mut self) -> Option<InputEvent> {
        Button::ALL
            .into_iter()
            .find(|button| core::mem::take(&mut self.pending[usize::from(button.index())]))
            .map(InputEvent::Press)
    }
}

impl<A, B, C> InputProvider for FrontButtons<A, B, C>
where
    A: InputPin,
    B: InputPin,
    C: InputPin,
{
    type Error = ButtonInputError<A::Error, B::Error, C::Error>;

    /// Samples the pins when no edge is queued, then reports queued edges
    /// one at a time in A, B, C order.
    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        if let Some(event) = self.take_pending() {
            return Ok(Some(event));
        }

        self.sample_all()?;
        Ok(self.take_pending())
    }
}

#[inline]
fn pressed_from_level(high: bool, active_low: bool) -> bool {
    if active_low { !high } else { high }
}
