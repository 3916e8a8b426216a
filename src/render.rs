use std::{
    convert::Infallible,
    io::Cursor,
    path::{Path, PathBuf},
};

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_6X13, FONT_9X15, FONT_9X18_BOLD},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use image::{imageops, imageops::FilterType, DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::Result;
use crate::snapshot::{Action, DashboardSnapshot, LeafState, TemperatureReading, WeatherPoint};

pub const PANEL_WIDTH: u32 = 800;
pub const PANEL_HEIGHT: u32 = 480;

const TITLE: &str = "Home Dashboard";
const BUTTON_POSITIONS: [i32; 5] = [80, 240, 400, 560, 720];
/// Light clouds and the like are hard to see on e-ink.
const WEATHER_ICON_DARKEN: f32 = 0.7;

/// Turns a snapshot into encoded image bytes. Identical snapshots must give
/// identical bytes, since the validation token is a hash of them.
pub trait ImageRenderer: Send + Sync {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<Vec<u8>>;
}

/// Hex SHA-256 of the rendered bytes, used as the validation token.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// 800x480 JPEG panel for the e-ink display.
#[derive(Debug, Clone)]
pub struct PanelRenderer {
    leaf_image_dir: PathBuf,
    jpeg_quality: u8,
}

impl PanelRenderer {
    pub fn new(leaf_image_dir: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            leaf_image_dir: leaf_image_dir.into(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

impl ImageRenderer for PanelRenderer {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<Vec<u8>> {
        let mut panel = Panel::new();

        panel.heading(&snapshot.date_string);
        panel.leaf(&snapshot.leaf, &self.leaf_image_dir);
        if let Some(weather) = &snapshot.weather {
            let points = std::iter::once(&weather.current).chain(&weather.forecast);
            panel.weather(points);
        }
        if let Some(reading) = &snapshot.temperature_reading {
            panel.temperature(reading);
        }
        panel.message(&snapshot.message);
        panel.actions(&snapshot.actions);

        let image = DynamicImage::ImageRgba8(panel.image).to_rgb8();
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageOutputFormat::Jpeg(self.jpeg_quality))?;

        Ok(buffer.into_inner())
    }
}

struct Panel {
    image: RgbaImage,
}

impl Panel {
    fn new() -> Self {
        Self {
            image: RgbaImage::from_pixel(PANEL_WIDTH, PANEL_HEIGHT, Rgba([255, 255, 255, 255])),
        }
    }

    fn text(&mut self, text: &str, position: Point, font: &MonoFont<'_>, alignment: Alignment) {
        let character_style = MonoTextStyle::new(font, Rgb888::BLACK);
        let text_style = TextStyleBuilder::new()
            .alignment(alignment)
            .baseline(Baseline::Top)
            .build();

        let _ = Text::with_text_style(text, position, character_style, text_style).draw(self);
    }

    fn line(&mut self, from: Point, to: Point) {
        let _ = Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::BLACK, 1))
            .draw(self);
    }

    fn icon(&mut self, path: &Path, size: u32, darken: f32, at: Point) {
        let icon = match image::open(path) {
            Ok(icon) => icon.to_rgba8(),
            Err(e) => {
                warn!(path = %path.display(), "skipping icon: {e}");
                return;
            }
        };

        let mut icon = imageops::resize(&icon, size, size, FilterType::Triangle);
        if darken < 1.0 {
            for pixel in icon.pixels_mut() {
                for channel in &mut pixel.0[..3] {
                    *channel = (f32::from(*channel) * darken) as u8;
                }
            }
        }

        imageops::overlay(&mut self.image, &icon, i64::from(at.x), i64::from(at.y));
    }

    fn heading(&mut self, date: &str) {
        let width = PANEL_WIDTH as i32;
        self.text(TITLE, Point::new(width / 4, 10), &FONT_9X18_BOLD, Alignment::Center);
        self.text(date, Point::new(width - 10, 10), &FONT_10X20, Alignment::Right);
    }

    fn leaf(&mut self, leaf: &LeafState, image_dir: &Path) {
        let icon = image_dir.join(leaf.icon().file_name());
        self.icon(&icon, 70, 1.0, Point::new(10, 40));

        let range = format!("Range: {:.0} miles", leaf.cruising_range_ac_off);
        self.text(&range, Point::new(110, 50), &FONT_10X20, Alignment::Left);

        let climate = format!("({:.0} with climate control)", leaf.cruising_range_ac_on);
        self.text(&climate, Point::new(110, 78), &FONT_9X15, Alignment::Left);

        let status = match (leaf.is_plugged_in, leaf.is_charging) {
            (true, true) => "Charging",
            (true, false) => "Plugged in",
            (false, _) => "Not plugged in",
        };
        self.text(status, Point::new(110, 98), &FONT_6X13, Alignment::Left);
    }

    fn weather<'a>(&mut self, points: impl Iterator<Item = &'a WeatherPoint>) {
        let top = 130;
        let mut left = 30;

        for (index, point) in points.enumerate() {
            let (block_width, icon_size, gap) = if index == 0 {
                (250, 100, 50)
            } else {
                (200, 70, 10)
            };
            let centre = left + block_width / 2;

            self.text(&point.time, Point::new(centre, top), &FONT_9X15, Alignment::Center);
            self.icon(
                Path::new(&point.icon_path),
                icon_size as u32,
                WEATHER_ICON_DARKEN,
                Point::new(left, top + 20),
            );

            let temperature = format!("{:.0}C", point.temperature);
            let text_left = left + icon_size + 5;
            self.text(
                &temperature,
                Point::new(text_left, top + 35),
                &FONT_10X20,
                Alignment::Left,
            );
            let feels_like = match point.humidity {
                Some(humidity) => format!("({:.0}C, {:.0}%)", point.feels_like, humidity),
                None => format!("({:.0}C)", point.feels_like),
            };
            self.text(
                &feels_like,
                Point::new(text_left, top + 60),
                &FONT_6X13,
                Alignment::Left,
            );

            self.text(
                &point.description,
                Point::new(centre, top + 130),
                &FONT_9X15,
                Alignment::Center,
            );
            let wind = format!(
                "{} mph ({} mph gusts)",
                speed_or_na(point.wind_speed_mph),
                speed_or_na(point.wind_gust_mph)
            );
            self.text(&wind, Point::new(centre, top + 150), &FONT_6X13, Alignment::Center);

            left += block_width + gap;
        }
    }

    fn temperature(&mut self, reading: &TemperatureReading) {
        let text = format!(
            "Indoor: {:.1}C ({:.1}%)",
            reading.temperature, reading.humidity
        );
        self.text(&text, Point::new(275, 330), &FONT_9X15, Alignment::Left);
    }

    /// Largest font that fits the panel width.
    fn message(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }

        let available = PANEL_WIDTH - 20;
        let chars = message.chars().count() as u32;
        let font = [&FONT_10X20, &FONT_9X15, &FONT_6X13]
            .into_iter()
            .find(|font| font.character_size.width * chars < available)
            .unwrap_or(&FONT_6X10);

        let centre = Point::new(PANEL_WIDTH as i32 / 2, 400);
        self.text(message, centre, font, Alignment::Center);
    }

    fn actions(&mut self, actions: &[Action]) {
        let bottom = PANEL_HEIGHT as i32 - 1;
        for (index, x) in BUTTON_POSITIONS.into_iter().enumerate() {
            self.line(Point::new(x, 460), Point::new(x, bottom));

            if let Some(action) = actions.get(index) {
                let position = Point::new(x + 5, 440);
                self.text(&action.display_name, position, &FONT_6X13, Alignment::Center);
            }
        }
    }
}

fn speed_or_na(speed: Option<f64>) -> String {
    match speed {
        Some(speed) => format!("{speed:.0}"),
        None => "n/a".to_string(),
    }
}

impl DrawTarget for Panel {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x < width && y < height {
                self.image
                    .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Panel {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}
