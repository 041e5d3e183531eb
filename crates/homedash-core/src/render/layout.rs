use core::fmt::Write;

use heapless::String;

use super::{CENTER_X, Color, DISPLAY_HEIGHT, DrawItem, FontMetrics, FontRole, Frame, LINE_BYTES};
use crate::{
    screen::{ScreenId, View},
    telemetry::{TelemetryReading, number::format_value},
    text::truncated,
};

pub const TEMPERATURE_WARNING_C: f32 = 60.0;

const DEFAULT_LINE_FACTOR: f32 = 0.9;
const TIMESTAMP_Y: i32 = 4;
const VALUES_TOP_Y: i32 = 32;
const BANNER_Y: i32 = 180;
const SINGLE_VALUE_Y: i32 = 70;

const INDICATOR_WIDTH: u16 = 60;
const INDICATOR_HEIGHT: u16 = 6;
const INDICATOR_PITCH: i32 = 93;

/// Static strings shown on the about and welcome screens.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RenderContext<'a> {
    pub title: &'a str,
    pub version: &'a str,
}

/// Warning red strictly above 60 °C, cyan otherwise.
pub fn temperature_color(temperature: Option<f32>) -> Color {
    match temperature {
        Some(value) if value > TEMPERATURE_WARNING_C => Color::Red,
        _ => Color::Cyan,
    }
}

/// Indicator bar under the active screen: `(x, y, width, height)`.
pub fn indicator_rect(screen: ScreenId) -> (i32, i32, u16, u16) {
    let slot = i32::from(screen.index()) - 1;
    let x = CENTER_X + INDICATOR_PITCH * slot - i32::from(INDICATOR_WIDTH / 2);
    let y = i32::from(DISPLAY_HEIGHT - INDICATOR_HEIGHT);
    (x, y, INDICATOR_WIDTH, INDICATOR_HEIGHT)
}

/// Vertical text cursor advancing by the current font's line height.
struct Cursor<'a, M> {
    frame: Frame,
    metrics: &'a M,
    font: FontRole,
    color: Color,
    y: i32,
}

impl<'a, M> Cursor<'a, M>
where
    M: FontMetrics,
{
    fn new(background: Color, metrics: &'a M, y: i32) -> Self {
        Self {
            frame: Frame::new(background),
            metrics,
            font: FontRole::Body,
            color: Color::White,
            y,
        }
    }

    fn font(&mut self, font: FontRole) -> &mut Self {
        self.font = font;
        self
    }

    fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    fn text(&mut self, text: &str) -> &mut Self {
        self.text_at(text, self.y)
    }

    fn text_at(&mut self, text: &str, y: i32) -> &mut Self {
        self.frame.push(DrawItem::Text {
            text: truncated(text),
            font: self.font,
            color: self.color,
            x: CENTER_X,
            y,
        });
        self
    }

    fn new_line(&mut self, factor: f32) -> &mut Self {
        let height = f32::from(self.metrics.line_height(self.font));
        self.y += (height * factor) as i32;
        self
    }

    fn skip(&mut self, pixels: i32) -> &mut Self {
        self.y += pixels;
        self
    }

    fn finish(self) -> Frame {
        self.frame
    }
}

/// Builds the full repaint for `view`.
pub fn compose<M>(
    view: &View<'_>,
    reading: &TelemetryReading,
    context: &RenderContext<'_>,
    metrics: &M,
) -> Frame
where
    M: FontMetrics,
{
    match *view {
        View::Welcome => banner_screen(Color::Blue, "Démarrage...", context, metrics),
        View::Screen(screen) => {
            let mut frame = match screen {
                ScreenId::Boiler => boiler_screen(reading, metrics),
                ScreenId::Electricity => electricity_screen(reading, metrics),
                ScreenId::About => about_screen(context, metrics),
            };
            let (x, y, width, height) = indicator_rect(screen);
            frame.push(DrawItem::Rect {
                x,
                y,
                width,
                height,
                color: Color::DarkGrey,
            });
            frame
        }
        View::Value { updating } => single_value_screen(reading, updating, metrics),
        View::LinkError { network } => link_error_screen(network, metrics),
        View::ApplicationError { endpoint } => application_error_screen(endpoint, metrics),
    }
}

fn with_timestamp<M>(cursor: &mut Cursor<'_, M>, reading: &TelemetryReading)
where
    M: FontMetrics,
{
    cursor
        .font(FontRole::Caption)
        .color(Color::White)
        .text_at(&reading.timestamp, TIMESTAMP_Y);
}

fn boiler_screen<M>(reading: &TelemetryReading, metrics: &M) -> Frame
where
    M: FontMetrics,
{
    let mut cursor = Cursor::new(Color::Black, metrics, VALUES_TOP_Y);
    with_timestamp(&mut cursor, reading);

    let temperature = format_value(reading.boiler_temperature, 1, "°C");
    let consumption = format_value(reading.water_consumption, 0, " l");
    cursor
        .font(FontRole::Body)
        .color(Color::Red)
        .text("Eau chaude")
        .new_line(0.95)
        .font(FontRole::Figure)
        .color(temperature_color(reading.boiler_temperature))
        .text(&temperature)
        .new_line(0.72)
        .color(Color::White)
        .text(&consumption);
    cursor.finish()
}

fn electricity_screen<M>(reading: &TelemetryReading, metrics: &M) -> Frame
where
    M: FontMetrics,
{
    let mut cursor = Cursor::new(Color::Black, metrics, VALUES_TOP_Y);
    with_timestamp(&mut cursor, reading);

    let consumption = format_value(reading.electricity_consumption, 0, "W");
    let production = format_value(reading.electricity_production, 0, "W");
    cursor
        .color(Color::Yellow)
        .font(FontRole::Body)
        .text("Consommation")
        .new_line(0.8)
        .font(FontRole::FigureMedium)
        .text(&consumption)
        .new_line(0.8)
        .font(FontRole::Body)
        .text("Production")
        .new_line(0.8)
        .font(FontRole::FigureMedium)
        .text(&production);
    cursor.finish()
}

fn about_screen<M>(context: &RenderContext<'_>, metrics: &M) -> Frame
where
    M: FontMetrics,
{
    let mut version = String::<LINE_BYTES>::new();
    let _ = write!(version, "Version {}", context.version);
    banner_screen(Color::Navy, &version, context, metrics)
}

fn banner_screen<M>(
    background: Color,
    footer: &str,
    context: &RenderContext<'_>,
    metrics: &M,
) -> Frame
where
    M: FontMetrics,
{
    let mut cursor = Cursor::new(background, metrics, 10);
    cursor
        .font(FontRole::Heading)
        .text("Maison")
        .new_line(0.8)
        .text("intelligente")
        .new_line(1.0)
        .font(FontRole::Strong)
        .text(context.title)
        .new_line(1.0)
        .skip(5)
        .font(FontRole::Body)
        .text(footer);
    cursor.finish()
}

fn single_value_screen<M>(reading: &TelemetryReading, updating: bool, metrics: &M) -> Frame
where
    M: FontMetrics,
{
    let temperature = format_value(reading.boiler_temperature, 1, "°C");
    let mut cursor = Cursor::new(Color::Black, metrics, SINGLE_VALUE_Y);
    cursor
        .font(FontRole::FigureMono)
        .color(temperature_color(reading.boiler_temperature))
        .text(&temperature);
    if updating {
        cursor
            .font(FontRole::Body)
            .color(Color::Purple)
            .text_at("Mise à jour...", BANNER_Y);
    }
    cursor.finish()
}

fn link_error_screen<M>(network: &str, metrics: &M) -> Frame
where
    M: FontMetrics,
{
    let mut cursor = Cursor::new(Color::Red, metrics, 25);
    cursor
        .font(FontRole::Body)
        .text("Je ne peux pas me")
        .new_line(DEFAULT_LINE_FACTOR)
        .text("connecter au Wifi")
        .new_line(DEFAULT_LINE_FACTOR)
        .font(FontRole::Strong)
        .text(network);
    cursor.finish()
}

fn application_error_screen<M>(endpoint: &str, metrics: &M) -> Frame
where
    M: FontMetrics,
{
    let mut cursor = Cursor::new(Color::Maroon, metrics, 25);
    cursor
        .font(FontRole::Body)
        .text("Je ne peux pas me")
        .new_line(DEFAULT_LINE_FACTOR)
        .text("connecter au")
        .new_line(DEFAULT_LINE_FACTOR)
        .text("serveur")
        .new_line(DEFAULT_LINE_FACTOR)
        .skip(10)
        .font(FontRole::Caption)
        .text(endpoint);
    cursor.finish()
}
