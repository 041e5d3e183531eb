use esp_hal::{
    gpio::DriveMode,
    ledc::{
        LowSpeed,
        channel::{self, ChannelIFace as _},
        timer::{self, TimerIFace as _},
    },
    time::Rate,
};
use homedash_core::screen::{Backlight, Brightness};

const PWM_FREQUENCY_KHZ: u32 = 5;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BacklightError {
    Timer(timer::Error),
    Channel(channel::Error),
}

/// Configures the LEDC timer shared by the backlight channel.
pub fn configure_timer(timer: &mut timer::Timer<'_, LowSpeed>) -> Result<(), BacklightError> {
    timer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty8Bit,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_khz(PWM_FREQUENCY_KHZ),
        })
        .map_err(BacklightError::Timer)
}

/// PWM-driven LCD backlight.
pub struct LedcBacklight<'a> {
    channel: channel::Channel<'a, LowSpeed>,
}

impl<'a> LedcBacklight<'a> {
    /// Attaches `channel` to `timer` and starts at full brightness.
    pub fn new(
        mut channel: channel::Channel<'a, LowSpeed>,
        timer: &'a timer::Timer<'a, LowSpeed>,
    ) -> Result<Self, BacklightError> {
        channel
            .configure(channel::config::Config {
                timer,
                duty_pct: duty_pct(Brightness::Full),
                drive_mode: DriveMode::PushPull,
            })
            .map_err(BacklightError::Channel)?;
        Ok(Self { channel })
    }
}

impl Backlight for LedcBacklight<'_> {
    type Error = channel::Error;

    fn set_brightness(&mut self, brightness: Brightness) -> Result<(), Self::Error> {
        self.channel.set_duty(duty_pct(brightness))
    }
}

/// Maps the 0-255 panel level to a duty percentage, keeping any non-zero
/// level visible.
fn duty_pct(brightness: Brightness) -> u8 {
    let level = u16::from(brightness.level());
    ((level * 100).div_ceil(255)) as u8
}
