//! Top-level dashboard: wires input, connectivity, telemetry and screens
//! into one cooperative tick.

use log::{debug, warn};

use crate::{
    config::{DeviceConfig, Transport},
    connectivity::{ConnectionState, Link, PayloadKind, Session, Supervisor},
    input::{InputEvent, InputProvider},
    render::{FontMetrics, Frame, RenderContext, compose},
    screen::{Brightness, Controller, ControllerConfig, TickResult, View},
    telemetry::{
        FieldSet, TelemetryReading, TelemetryState,
        frame::{FrameSchema, apply_frame},
        poll::PollSchedule,
        scrape::{DEFAULT_KEYS, ScrapeKey, apply_document},
    },
};

#[cfg(test)]
mod tests;

const MAX_PAYLOADS_PER_TICK: usize = 4;

pub struct Dashboard<L, S, IN>
where
    L: Link,
    S: Session,
    IN: InputProvider,
{
    supervisor: Supervisor<L, S>,
    controller: Controller,
    input: IN,
    telemetry: TelemetryState,
    schema: FrameSchema,
    scrape_keys: &'static [ScrapeKey],
    poll: Option<PollSchedule>,
    context: RenderContext<'static>,
}

impl<L, S, IN> Dashboard<L, S, IN>
where
    L: Link,
    S: Session,
    IN: InputProvider,
{
    pub fn new(
        supervisor: Supervisor<L, S>,
        input: IN,
        device: &DeviceConfig,
        controller: ControllerConfig,
        version: &'static str,
        now_ms: u64,
    ) -> Self {
        let poll = match device.transport {
            Transport::HttpPoll => Some(PollSchedule::default()),
            Transport::Mqtt => None,
        };

        Self {
            supervisor,
            controller: Controller::new(controller, now_ms),
            input,
            telemetry: TelemetryState::new(),
            schema: device.schema,
            scrape_keys: &DEFAULT_KEYS,
            poll,
            context: RenderContext {
                title: device.title,
                version,
            },
        }
    }

    /// Overrides the HTTP poll period. No effect for broker subscriptions.
    pub fn with_poll_period_ms(mut self, period_ms: u64) -> Self {
        if self.poll.is_some() {
            self.poll = Some(PollSchedule::new(period_ms));
        }
        self
    }

    pub fn with_scrape_keys(mut self, keys: &'static [ScrapeKey]) -> Self {
        self.scrape_keys = keys;
        self
    }

    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        self.process_inputs(now_ms);
        self.supervisor.tick(now_ms, &mut self.controller);
        self.drain_payloads();
        self.schedule_poll(now_ms);
        self.controller.tick(now_ms)
    }

    /// Draw plan for the current view.
    pub fn frame<M>(&self, metrics: &M) -> Frame
    where
        M: FontMetrics,
    {
        compose(
            &self.controller.view(),
            self.telemetry.reading(),
            &self.context,
            metrics,
        )
    }

    pub fn view(&self) -> View<'_> {
        self.controller.view()
    }

    pub fn take_brightness_change(&mut self) -> Option<Brightness> {
        self.controller.take_brightness_change()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn reading(&self) -> &TelemetryReading {
        self.telemetry.reading()
    }

    pub fn revision(&self) -> u32 {
        self.telemetry.revision()
    }

    fn process_inputs(&mut self, now_ms: u64) {
        loop {
            match self.input.poll_event() {
                Ok(Some(InputEvent::Press(button))) => self.controller.on_press(button, now_ms),
                Ok(None) => break,
                Err(_) => {
                    warn!("app: input provider failed");
                    break;
                }
            }
        }
    }

    fn drain_payloads(&mut self) {
        for _ in 0..MAX_PAYLOADS_PER_TICK {
            let Some(inbound) = self.supervisor.next_payload() else {
                break;
            };

            let text = inbound.text();
            let schema = self.schema;
            let keys = self.scrape_keys;
            let changed: FieldSet = match inbound.kind {
                PayloadKind::Frame => self.telemetry.apply(|r| apply_frame(schema, text, r)),
                PayloadKind::Document => self.telemetry.apply(|r| apply_document(keys, text, r)),
            };
            debug!(
                "app: {:?} payload ({} bytes) changed {} fields, revision {}",
                inbound.kind,
                inbound.bytes.len(),
                changed.len(),
                self.telemetry.revision()
            );
            self.controller.on_telemetry(self.telemetry.reading(), changed);
        }
    }

    fn schedule_poll(&mut self, now_ms: u64) {
        let refresh_requested = self.controller.take_refresh_request();
        let Some(poll) = self.poll.as_mut() else {
            return;
        };

        if refresh_requested {
            poll.force();
        }
        if self.supervisor.state() == ConnectionState::ApplicationUp && poll.is_due(now_ms) {
            debug!("app: requesting status page");
            self.supervisor.refresh();
            poll.mark_polled(now_ms);
        }
    }
}
