use heapless::String;
use log::{debug, info};

use super::{Brightness, ButtonMode, ControllerConfig, DisplayMode, ScreenId, TickResult};
use crate::{
    connectivity::{ConnectionListener, ConnectionState},
    input::Button,
    telemetry::{FieldSet, TelemetryReading},
    text::truncated,
};

const TARGET_BYTES: usize = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Overlay {
    Link,
    Application,
}

/// What the display should show right now.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum View<'a> {
    Welcome,
    Screen(ScreenId),
    Value { updating: bool },
    LinkError { network: &'a str },
    ApplicationError { endpoint: &'a str },
}

/// Screen state machine. Mutated by button edges, telemetry updates and
/// connection transitions; polled once per tick for redraws and dimming.
pub struct Controller {
    config: ControllerConfig,
    active: ScreenId,
    brightness: Brightness,
    brightness_dirty: bool,
    last_interaction_ms: u64,
    welcome_until_ms: Option<u64>,
    overlay: Option<Overlay>,
    overlay_target: String<TARGET_BYTES>,
    updating: bool,
    refresh_requested: bool,
    pending_redraw: bool,
    latest_primary: Option<u32>,
    painted_primary: Option<Option<u32>>,
}

impl Controller {
    pub fn new(config: ControllerConfig, now_ms: u64) -> Self {
        let welcome_until_ms =
            (config.welcome_ms > 0).then(|| now_ms.saturating_add(config.welcome_ms));
        Self {
            config,
            active: ScreenId::Boiler,
            brightness: Brightness::Full,
            brightness_dirty: true,
            last_interaction_ms: now_ms,
            welcome_until_ms,
            overlay: None,
            overlay_target: String::new(),
            updating: false,
            refresh_requested: false,
            pending_redraw: true,
            latest_primary: None,
            painted_primary: None,
        }
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn active_screen(&self) -> ScreenId {
        self.active
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// Returns the new brightness once after every change.
    pub fn take_brightness_change(&mut self) -> Option<Brightness> {
        if self.brightness_dirty {
            self.brightness_dirty = false;
            Some(self.brightness)
        } else {
            None
        }
    }

    /// Returns `true` once after a press asked for fresh data.
    pub fn take_refresh_request(&mut self) -> bool {
        core::mem::take(&mut self.refresh_requested)
    }

    pub fn view(&self) -> View<'_> {
        match self.overlay {
            Some(Overlay::Link) => return View::LinkError { network: &self.overlay_target },
            Some(Overlay::Application) => {
                return View::ApplicationError { endpoint: &self.overlay_target };
            }
            None => {}
        }

        if self.welcome_until_ms.is_some() {
            return View::Welcome;
        }

        match self.config.display_mode {
            DisplayMode::MultiScreen => View::Screen(self.active),
            DisplayMode::SingleValue => View::Value { updating: self.updating },
        }
    }

    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        if self.welcome_until_ms.is_some_and(|until| now_ms >= until) {
            self.welcome_until_ms = None;
            self.pending_redraw = true;
        }

        if self.brightness == Brightness::Full
            && now_ms.saturating_sub(self.last_interaction_ms) > self.config.idle_threshold_ms
        {
            debug!("screen: idle, dimming backlight");
            self.set_brightness(Brightness::Dim);
        }

        if !self.pending_redraw {
            return TickResult::NoRender;
        }

        self.pending_redraw = false;
        if matches!(self.view(), View::Value { .. }) {
            self.painted_primary = Some(self.latest_primary);
        }
        TickResult::RenderRequested
    }

    /// Handles one button edge.
    pub fn on_press(&mut self, button: Button, now_ms: u64) {
        self.last_interaction_ms = now_ms;
        self.set_brightness(Brightness::Full);

        if self.welcome_until_ms.is_some() {
            return;
        }

        match self.config.display_mode {
            DisplayMode::MultiScreen => {
                self.active = match self.config.button_mode {
                    ButtonMode::Direct => ScreenId::from_index(button.index()),
                    ButtonMode::Cycle => self.active.next(),
                };
                debug!("screen: button {:?} -> {:?}", button, self.active);
            }
            DisplayMode::SingleValue => {
                self.updating = true;
                self.refresh_requested = true;
            }
        }
        self.pending_redraw = true;
    }

    /// Called after every decoded payload with the fields it changed.
    ///
    /// Screens repaint on every payload; single-value mode skips a repaint
    /// when the shown value is bit-identical to the painted one.
    pub fn on_telemetry(&mut self, reading: &TelemetryReading, changed: FieldSet) {
        debug!("screen: telemetry update, {} fields changed", changed.len());
        self.latest_primary = reading.boiler_temperature.map(f32::to_bits);

        if self.overlay.is_some() || self.welcome_until_ms.is_some() {
            return;
        }

        match self.config.display_mode {
            DisplayMode::MultiScreen => self.pending_redraw = true,
            DisplayMode::SingleValue => {
                if self.updating || self.painted_primary != Some(self.latest_primary) {
                    self.updating = false;
                    self.pending_redraw = true;
                }
            }
        }
    }

    fn set_brightness(&mut self, brightness: Brightness) {
        if self.brightness != brightness {
            self.brightness = brightness;
            self.brightness_dirty = true;
        }
    }
}

impl ConnectionListener for Controller {
    fn on_connection_state(&mut self, state: ConnectionState, target: &str) {
        let overlay = match state {
            ConnectionState::LinkError => Some(Overlay::Link),
            ConnectionState::ApplicationError => Some(Overlay::Application),
            _ => None,
        };

        match overlay {
            Some(overlay) => {
                info!("screen: showing {} for {}", state.as_str(), target);
                self.overlay = Some(overlay);
                self.overlay_target = truncated(target);
                self.pending_redraw = true;
            }
            None if self.overlay.is_some() => {
                info!("screen: connection recovered ({})", state.as_str());
                self.overlay = None;
                self.overlay_target.clear();
                self.pending_redraw = true;
            }
            None => {}
        }
    }
}
