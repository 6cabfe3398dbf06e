//! The immediate-mode drawing contract visualizers render against.
//!
//! All coordinates are pixels. Visualizers map their data through a
//! [`Transform`] before calling any of these primitives; the only place a
//! transform reaches the surface is [`Surface::draw_image`].

use serde::Deserialize;
use std::str::FromStr;

use super::transform::Transform;
use crate::error::VizError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl FromStr for Color {
    type Err = VizError;

    /// `#rgb`, `#rrggbb`, `#rrggbbaa` or one of the few CSS names the
    /// default theme uses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || VizError::InvalidColor(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |i: usize, len: usize| {
                u8::from_str_radix(&hex[i..i + len], 16).map_err(|_| invalid())
            };
            return match hex.len() {
                3 => Ok(Color::rgb(
                    channel(0, 1)? * 17,
                    channel(1, 1)? * 17,
                    channel(2, 1)? * 17,
                )),
                6 => Ok(Color::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
                8 => Ok(Color::rgba(
                    channel(0, 2)?,
                    channel(2, 2)?,
                    channel(4, 2)?,
                    channel(6, 2)?,
                )),
                _ => Err(invalid()),
            };
        }

        match s.to_ascii_lowercase().as_str() {
            "white" => Ok(Color::WHITE),
            "black" => Ok(Color::BLACK),
            "lightgray" | "lightgrey" => Ok(Color::rgb(211, 211, 211)),
            "gray" | "grey" => Ok(Color::rgb(128, 128, 128)),
            "darkgreen" => Ok(Color::rgb(0, 100, 0)),
            "green" => Ok(Color::rgb(0, 128, 0)),
            "transparent" => Ok(Color::TRANSPARENT),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = VizError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Owned RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl Image {
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill.to_rgba(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = px;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset every pixel to transparent.
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Stroke the current path. The path stays until the next `begin_path`.
    fn stroke(&mut self, style: &StrokeStyle);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);

    /// Draw `image` with its pixel `(u, v)` mapped through `transform`.
    fn draw_image(&mut self, image: &Image, transform: &Transform);

    /// Copy `src` of this surface onto itself with its top left at
    /// `(dst_x, dst_y)`.
    fn copy_within(&mut self, src: Rect, dst_x: u32, dst_y: u32);
}
