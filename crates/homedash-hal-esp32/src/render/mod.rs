//! Draws core [`Frame`]s onto an RGB565 draw target.

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle, iso_8859_1},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use homedash_core::render::{Color, DrawItem, FontMetrics, FontRole, Frame};
use profont::{PROFONT_18_POINT, PROFONT_24_POINT};

pub trait FrameRenderer {
    type Error;

    fn render(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}

/// Concrete fonts behind each [`FontRole`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LcdFonts;

impl LcdFonts {
    pub fn font(role: FontRole) -> &'static MonoFont<'static> {
        match role {
            FontRole::Caption => &iso_8859_1::FONT_6X10,
            FontRole::Body => &iso_8859_1::FONT_10X20,
            FontRole::Strong | FontRole::FigureMedium => &PROFONT_18_POINT,
            FontRole::Heading | FontRole::Figure | FontRole::FigureMono => &PROFONT_24_POINT,
        }
    }
}

impl FontMetrics for LcdFonts {
    fn line_height(&self, font: FontRole) -> u16 {
        Self::font(font).character_size.height as u16
    }
}

pub fn rgb565(color: Color) -> Rgb565 {
    match color {
        Color::Black => Rgb565::BLACK,
        Color::White => Rgb565::WHITE,
        Color::Red => Rgb565::RED,
        Color::Cyan => Rgb565::CYAN,
        Color::Yellow => Rgb565::YELLOW,
        Color::Blue => Rgb565::BLUE,
        Color::Navy => Rgb565::new(0, 0, 15),
        Color::Maroon => Rgb565::new(15, 0, 0),
        Color::Purple => Rgb565::new(15, 0, 15),
        Color::DarkGrey => Rgb565::new(15, 31, 15),
    }
}

/// Full-repaint renderer for the ILI9342C panel (or any RGB565 target).
pub struct LcdRenderer<D> {
    target: D,
}

impl<D> LcdRenderer<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }
}

impl<D> FrameRenderer for LcdRenderer<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type Error = D::Error;

    fn render(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        self.target.clear(rgb565(frame.background))?;

        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();

        for item in &frame.items {
            match item {
                DrawItem::Text {
                    text,
                    font,
                    color,
                    x,
                    y,
                } => {
                    let character_style = MonoTextStyle::new(LcdFonts::font(*font), rgb565(*color));
                    Text::with_text_style(text, Point::new(*x, *y), character_style, text_style)
                        .draw(&mut self.target)?;
                }
                DrawItem::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    Rectangle::new(
                        Point::new(*x, *y),
                        Size::new(u32::from(*width), u32::from(*height)),
                    )
                    .into_styled(PrimitiveStyle::with_fill(rgb565(*color)))
                    .draw(&mut self.target)?;
                }
            }
        }

        Ok(())
    }
}
