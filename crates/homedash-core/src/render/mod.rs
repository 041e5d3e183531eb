//! Layout and colour selection for every view.
//!
//! [`compose`] turns the controller's [`View`] and the latest reading into a
//! [`Frame`]: a background colour plus a short list of centred text lines
//! and filled rectangles. The board crate draws frames with its own fonts
//! and reports their heights back through [`FontMetrics`].

mod layout;


use heapless::{String, Vec};

pub use layout::{RenderContext, compose, indicator_rect, temperature_color};

pub const DISPLAY_WIDTH: u16 = 320;
pub const DISPLAY_HEIGHT: u16 = 240;
pub const CENTER_X: i32 = DISPLAY_WIDTH as i32 / 2;

pub const LINE_BYTES: usize = 48;
pub const MAX_DRAW_ITEMS: usize = 12;

/// Named colours of the dashboard palette.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Black,
    White,
    Red,
    Cyan,
    Yellow,
    Blue,
    Navy,
    Maroon,
    Purple,
    DarkGrey,
}

/// Typeface roles; the board maps each to a concrete font.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FontRole {
    /// Small monospace: timestamp and endpoint.
    Caption,
    Body,
    Heading,
    Strong,
    /// Large proportional digits on the boiler screen.
    Figure,
    /// Medium digits on the electricity screen.
    FigureMedium,
    /// Large monospace digits in single-value mode.
    FigureMono,
}

/// Rendered line heights of the board's fonts, in pixels.
pub trait FontMetrics {
    fn line_height(&self, font: FontRole) -> u16;
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawItem {
    /// Text centred horizontally on `x`, top edge at `y`.
    Text {
        text: String<LINE_BYTES>,
        font: FontRole,
        color: Color,
        x: i32,
        y: i32,
    },
    Rect {
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        color: Color,
    },
}

/// Draw plan for one full repaint.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub background: Color,
    pub items: Vec<DrawItem, MAX_DRAW_ITEMS>,
}

impl Frame {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: DrawItem) {
        if self.items.push(item).is_err() {
            log::warn!("render: frame full, dropping item");
        }
    }

    /// Text lines in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            DrawItem::Text { text, .. } => Some(text.as_str()),
            DrawItem::Rect { .. } => None,
        })
    }
}
