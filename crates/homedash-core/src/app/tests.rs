use std::{cell::Cell, cell::RefCell, collections::VecDeque, rc::Rc};

use heapless::Vec;

use super::*;
use crate::{
    connectivity::{Inbound, SessionStatus, SupervisorConfig, client_id},
    input::{Button, MockInput},
    render::{Color, FontRole},
    screen::{DisplayMode, ScreenId},
};

struct ScriptedInput {
    events: Rc<RefCell<VecDeque<InputEvent>>>,
}

impl InputProvider for ScriptedInput {
    type Error = ();

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        Ok(self.events.borrow_mut().pop_front())
    }
}

struct FakeLink(Rc<Cell<bool>>);

impl Link for FakeLink {
    fn begin(&mut self) {}

    fn is_up(&mut self) -> bool {
        self.0.get()
    }

    fn network_name(&self) -> &str {
        "HomeNet"
    }
}

#[derive(Clone, Default)]
struct Remote {
    up: Rc<Cell<bool>>,
    refreshes: Rc<Cell<u32>>,
    queue: Rc<RefCell<VecDeque<Inbound>>>,
}

impl Remote {
    fn send(&self, kind: PayloadKind, text: &str) {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(text.as_bytes()).unwrap();
        self.queue.borrow_mut().push_back(Inbound { kind, bytes });
    }
}

struct FakeSession(Remote);

impl Session for FakeSession {
    fn begin(&mut self, _client_id: &str) {}

    fn status(&mut self) -> SessionStatus {
        if self.0.up.get() {
            SessionStatus::Up
        } else {
            SessionStatus::Connecting
        }
    }

    fn refresh(&mut self) {
        self.0.refreshes.set(self.0.refreshes.get() + 1);
    }

    fn endpoint(&self) -> &str {
        "broker.lan"
    }

    fn next_payload(&mut self) -> Option<Inbound> {
        self.0.queue.borrow_mut().pop_front()
    }
}

struct Harness {
    app: Dashboard<FakeLink, FakeSession, ScriptedInput>,
    link: Rc<Cell<bool>>,
    remote: Remote,
    events: Rc<RefCell<VecDeque<InputEvent>>>,
    now: u64,
}

impl Harness {
    fn new(device: DeviceConfig, controller: ControllerConfig) -> Self {
        let link = Rc::new(Cell::new(false));
        let remote = Remote::default();
        let events = Rc::new(RefCell::new(VecDeque::new()));
        let supervisor = Supervisor::new(
            FakeLink(link.clone()),
            FakeSession(remote.clone()),
            client_id("homedash-", [0, 1, 2, 3, 4, 5]),
            SupervisorConfig::default(),
        );
        let input = ScriptedInput {
            events: events.clone(),
        };
        let app = Dashboard::new(supervisor, input, &device, controller, "0.2.0", 0);
        Self {
            app,
            link,
            remote,
            events,
            now: 0,
        }
    }

    fn with_poll_period(mut self, period_ms: u64) -> Self {
        self.app = self.app.with_poll_period_ms(period_ms);
        self
    }

    fn press(&self, button: Button) {
        self.events.borrow_mut().push_back(InputEvent::Press(button));
    }

    /// Runs 20 ms ticks for `ms` and reports whether any asked for a render.
    fn run(&mut self, ms: u64) -> bool {
        let end = self.now + ms;
        let mut rendered = false;
        while self.now < end {
            self.now += 20;
            rendered |= self.app.tick(self.now) == TickResult::RenderRequested;
        }
        rendered
    }

    fn bring_up(&mut self) {
        self.link.set(true);
        self.remote.up.set(true);
        self.run(6_000);
        assert_eq!(self.app.connection_state(), ConnectionState::ApplicationUp);
    }
}

struct Metrics;

impl FontMetrics for Metrics {
    fn line_height(&self, _font: FontRole) -> u16 {
        30
    }
}

fn mqtt_device() -> DeviceConfig {
    DeviceConfig::new("HomeNet", "secret", "broker.lan")
        .with_topic("energy/summary")
        .with_title("Chalet")
}

fn http_device() -> DeviceConfig {
    DeviceConfig::new("HomeNet", "secret", "http://boiler.lan/status")
        .with_transport(Transport::HttpPoll)
        .with_title("Boiler")
}

#[test]
fn every_broker_message_repaints_but_only_changes_bump_revision() {
    let mut h = Harness::new(mqtt_device(), ControllerConfig::default());
    h.bring_up();
    assert_eq!(h.app.view(), View::Screen(ScreenId::Boiler));

    h.remote.send(PayloadKind::Frame, "21:40;98;61.5;650;0");
    assert!(h.run(20));
    assert_eq!(h.app.reading().boiler_temperature, Some(61.5));
    assert_eq!(h.app.revision(), 1);

    let frame = h.app.frame(&Metrics);
    assert!(frame.texts().any(|t| t == "61.5°C"));
    assert!(frame.items.iter().any(|item| matches!(
        item,
        crate::render::DrawItem::Text { color: Color::Red, font: FontRole::Figure, .. }
    )));

    h.remote.send(PayloadKind::Frame, "21:40;98;61.5;650;0");
    assert!(h.run(20));
    assert_eq!(h.app.revision(), 1);
    assert!(!h.run(20));
}

#[test]
fn button_switches_screen_and_wakes_backlight() {
    let mut h = Harness::new(mqtt_device(), ControllerConfig::default());
    assert_eq!(h.app.take_brightness_change(), Some(Brightness::Full));
    h.bring_up();
    h.run(5_000);
    assert_eq!(h.app.take_brightness_change(), Some(Brightness::Dim));

    h.press(Button::B);
    assert!(h.run(20));
    assert_eq!(h.app.view(), View::Screen(ScreenId::Electricity));
    assert_eq!(h.app.take_brightness_change(), Some(Brightness::Full));
}

#[test]
fn link_failure_overlays_screen_until_recovery() {
    let mut h = Harness::new(mqtt_device(), ControllerConfig::default());
    h.run(6_000);
    assert_eq!(h.app.view(), View::LinkError { network: "HomeNet" });
    assert_eq!(h.app.frame(&Metrics).background, Color::Red);

    h.bring_up();
    assert_eq!(h.app.view(), View::Screen(ScreenId::Boiler));
}

#[test]
fn http_transport_polls_once_up_and_on_demand() {
    let controller = ControllerConfig::default().with_display_mode(DisplayMode::SingleValue);
    let mut h = Harness::new(http_device(), controller);
    h.run(1_000);
    assert_eq!(h.remote.refreshes.get(), 0);

    h.bring_up();
    assert_eq!(h.remote.refreshes.get(), 1);

    h.remote.send(PayloadKind::Document, r#"<td id="analogOutTemp">58.1</td>"#);
    h.run(20);
    assert_eq!(h.app.reading().boiler_temperature, Some(58.1));

    h.run(60_000);
    assert_eq!(h.remote.refreshes.get(), 1);

    h.press(Button::A);
    h.run(20);
    assert_eq!(h.remote.refreshes.get(), 2);
    assert_eq!(h.app.view(), View::Value { updating: true });
}

#[test]
fn http_poll_period_elapses() {
    let mut h = Harness::new(http_device(), ControllerConfig::default()).with_poll_period(10_000);
    h.bring_up();
    assert_eq!(h.remote.refreshes.get(), 1);
    h.run(10_100);
    assert_eq!(h.remote.refreshes.get(), 2);
}

#[test]
fn buttonless_board_still_connects_and_dims() {
    let link = Rc::new(Cell::new(true));
    let remote = Remote::default();
    remote.up.set(true);
    let supervisor = Supervisor::new(
        FakeLink(link),
        FakeSession(remote),
        client_id("homedash-", [0, 1, 2, 3, 4, 5]),
        SupervisorConfig::default(),
    );
    let mut app = Dashboard::new(
        supervisor,
        MockInput::new(),
        &mqtt_device(),
        ControllerConfig::default().with_welcome_ms(0),
        "0.2.0",
        0,
    );

    let mut now = 0;
    while now < 11_000 {
        now += 20;
        app.tick(now);
    }
    assert_eq!(app.connection_state(), ConnectionState::ApplicationUp);
    assert_eq!(app.take_brightness_change(), Some(Brightness::Dim));
}

static PAGE_KEYS: [ScrapeKey; 2] = [
    ScrapeKey::new("analogOutTemp", crate::telemetry::FieldId::BoilerTemperature),
    ScrapeKey::new("lastUpdate", crate::telemetry::FieldId::Timestamp),
];

#[test]
fn custom_scrape_keys_read_extra_fields() {
    let mut h = Harness::new(http_device(), ControllerConfig::default());
    h.app = h.app.with_scrape_keys(&PAGE_KEYS);
    h.bring_up();

    h.remote.send(
        PayloadKind::Document,
        r#"<b id="lastUpdate"> 07:45 </b><td id="analogOutTemp">52.0</td>"#,
    );
    h.run(20);
    assert_eq!(h.app.reading().boiler_temperature, Some(52.0));
    assert_eq!(h.app.reading().timestamp.as_str(), "07:45");
}
