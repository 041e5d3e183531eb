use super::*;
use crate::{
    connectivity::{ConnectionListener, ConnectionState},
    input::Button,
    telemetry::{FieldId, FieldSet, TelemetryReading},
};

fn ready(config: ControllerConfig) -> Controller {
    let mut controller = Controller::new(config.with_welcome_ms(0), 0);
    assert_eq!(controller.tick(0), TickResult::RenderRequested);
    let _ = controller.take_brightness_change();
    controller
}

fn one(field: FieldId) -> FieldSet {
    let mut set = FieldSet::empty();
    set.insert(field);
    set
}

fn with_temperature(value: f32) -> TelemetryReading {
    let mut reading = TelemetryReading::new();
    reading.boiler_temperature = Some(value);
    reading
}

#[test]
fn welcome_splash_shows_first_then_boiler_screen() {
    let mut controller = Controller::new(ControllerConfig::default(), 1_000);
    assert_eq!(controller.view(), View::Welcome);
    assert_eq!(controller.tick(1_000), TickResult::RenderRequested);
    assert_eq!(controller.tick(5_999), TickResult::NoRender);

    assert_eq!(controller.tick(6_000), TickResult::RenderRequested);
    assert_eq!(controller.view(), View::Screen(ScreenId::Boiler));
}

#[test]
fn press_during_welcome_only_wakes() {
    let mut controller = Controller::new(ControllerConfig::default(), 0);
    let _ = controller.tick(0);
    controller.on_press(Button::C, 1_000);

    assert_eq!(controller.tick(1_020), TickResult::NoRender);
    assert_eq!(controller.view(), View::Welcome);
    assert_eq!(controller.active_screen(), ScreenId::Boiler);
}

#[test]
fn direct_mode_selects_pressed_screen_and_redraws() {
    let mut controller = ready(ControllerConfig::default());

    controller.on_press(Button::B, 100);
    assert_eq!(controller.tick(120), TickResult::RenderRequested);
    assert_eq!(controller.view(), View::Screen(ScreenId::Electricity));

    controller.on_press(Button::B, 200);
    assert_eq!(controller.tick(220), TickResult::RenderRequested);
    assert_eq!(controller.active_screen(), ScreenId::Electricity);

    controller.on_press(Button::C, 300);
    let _ = controller.tick(320);
    assert_eq!(controller.active_screen(), ScreenId::About);
}

#[test]
fn cycle_mode_advances_and_wraps() {
    let mut controller = ready(ControllerConfig::default().with_button_mode(ButtonMode::Cycle));

    let mut seen = [ScreenId::Boiler; 3];
    for (step, slot) in seen.iter_mut().enumerate() {
        controller.on_press(Button::A, step as u64 * 100);
        *slot = controller.active_screen();
    }
    assert_eq!(seen, [ScreenId::Electricity, ScreenId::About, ScreenId::Boiler]);
}

#[test]
fn idle_dims_once_and_press_restores() {
    let mut controller = ready(ControllerConfig::default());

    let _ = controller.tick(10_000);
    assert_eq!(controller.brightness(), Brightness::Full);

    assert_eq!(controller.tick(10_001), TickResult::NoRender);
    assert_eq!(controller.take_brightness_change(), Some(Brightness::Dim));
    let _ = controller.tick(20_000);
    assert_eq!(controller.take_brightness_change(), None);

    controller.on_press(Button::A, 25_000);
    assert_eq!(controller.take_brightness_change(), Some(Brightness::Full));
    assert_eq!(Brightness::Full.level(), 255);

    let _ = controller.tick(35_000);
    assert_eq!(controller.brightness(), Brightness::Full);
    let _ = controller.tick(35_001);
    assert_eq!(controller.brightness(), Brightness::Dim);
}

#[test]
fn every_telemetry_update_repaints_active_screen() {
    let mut controller = ready(ControllerConfig::default());
    let reading = with_temperature(48.0);
    assert_eq!(controller.tick(5), TickResult::NoRender);

    controller.on_telemetry(&reading, one(FieldId::BoilerTemperature));
    assert_eq!(controller.tick(10), TickResult::RenderRequested);

    controller.on_telemetry(&reading, FieldSet::empty());
    assert_eq!(controller.tick(20), TickResult::RenderRequested);
    assert_eq!(controller.tick(30), TickResult::NoRender);
}

#[test]
fn error_overlay_preempts_and_recovery_resumes_screen() {
    let mut controller = ready(ControllerConfig::default());
    controller.on_press(Button::B, 10);
    let _ = controller.tick(20);

    controller.on_connection_state(ConnectionState::LinkError, "HomeNet");
    assert_eq!(controller.tick(40), TickResult::RenderRequested);
    assert_eq!(controller.view(), View::LinkError { network: "HomeNet" });

    controller.on_telemetry(&with_temperature(70.0), one(FieldId::BoilerTemperature));
    assert_eq!(controller.tick(60), TickResult::NoRender);

    controller.on_connection_state(ConnectionState::LinkUp, "");
    assert_eq!(controller.tick(80), TickResult::RenderRequested);
    assert_eq!(controller.view(), View::Screen(ScreenId::Electricity));
}

#[test]
fn session_overlay_names_endpoint() {
    let mut controller = ready(ControllerConfig::default());
    controller.on_connection_state(ConnectionState::ApplicationError, "broker.lan:1883");
    assert_eq!(
        controller.view(),
        View::ApplicationError { endpoint: "broker.lan:1883" }
    );

    controller.on_connection_state(ConnectionState::ApplicationUp, "");
    assert_eq!(controller.view(), View::Screen(ScreenId::Boiler));
}

#[test]
fn overlay_preempts_welcome() {
    let mut controller = Controller::new(ControllerConfig::default(), 0);
    controller.on_connection_state(ConnectionState::LinkError, "HomeNet");
    assert_eq!(controller.view(), View::LinkError { network: "HomeNet" });
}

#[test]
fn single_value_skips_bit_identical_repaint() {
    let config = ControllerConfig::default().with_display_mode(DisplayMode::SingleValue);
    let mut controller = ready(config);
    let changed = one(FieldId::BoilerTemperature);

    controller.on_telemetry(&with_temperature(61.5), changed);
    assert_eq!(controller.tick(10), TickResult::RenderRequested);

    controller.on_telemetry(&with_temperature(61.5), changed);
    assert_eq!(controller.tick(20), TickResult::NoRender);

    controller.on_telemetry(&with_temperature(61.6), changed);
    assert_eq!(controller.tick(30), TickResult::RenderRequested);
}

#[test]
fn single_value_press_shows_banner_and_requests_refresh() {
    let config = ControllerConfig::default().with_display_mode(DisplayMode::SingleValue);
    let mut controller = ready(config);
    controller.on_telemetry(&with_temperature(58.0), FieldSet::empty());
    let _ = controller.tick(10);

    controller.on_press(Button::A, 100);
    assert!(controller.take_refresh_request());
    assert!(!controller.take_refresh_request());
    assert_eq!(controller.tick(120), TickResult::RenderRequested);
    assert_eq!(controller.view(), View::Value { updating: true });

    controller.on_telemetry(&with_temperature(58.0), FieldSet::empty());
    assert_eq!(controller.tick(140), TickResult::RenderRequested);
    assert_eq!(controller.view(), View::Value { updating: false });
}
