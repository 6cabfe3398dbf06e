use fontdue::{Font, FontSettings};
use std::path::Path;

use super::raster::blend_over;
use super::surface::{Color, Image};
use crate::error::{Result, VizError};

pub struct TextOverlay {
    font: Font,
    font_size: f32,
}

impl TextOverlay {
    pub fn from_bytes(bytes: &[u8], font_size: f32) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| VizError::Font(e.to_string()))?;
        Ok(Self { font, font_size })
    }

    pub fn from_file(path: &Path, font_size: f32) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, font_size)
    }

    /// Composite text onto an image with its top left corner at `(x, y)`.
    pub fn composite(&self, image: &mut Image, text: &str, x: i32, y: i32, color: Color) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
            let glyph_y = y + self.font_size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }

                    let px = cursor_x + metrics.xmin + gx as i32;
                    let py = glyph_y + gy as i32;
                    if px < 0 || py < 0 || px >= image.width as i32 || py >= image.height as i32 {
                        continue;
                    }

                    let alpha = (coverage as u16 * color.a as u16 / 255) as u8;
                    let idx = (py as u32 * image.width + px as u32) as usize;
                    blend_over(&mut image.pixels[idx], [color.r, color.g, color.b, alpha]);
                }
            }

            cursor_x += metrics.advance_width.round() as i32;
        }
    }

    /// Width of rendered text in pixels.
    pub fn measure_width(&self, text: &str) -> u32 {
        let width: f32 = text
            .chars()
            .map(|ch| self.font.metrics(ch, self.font_size).advance_width)
            .sum();
        width.ceil() as u32
    }

    pub fn line_height(&self) -> u32 {
        self.font
            .horizontal_line_metrics(self.font_size)
            .map_or(self.font_size, |m| m.new_line_size)
            .ceil() as u32
    }
}

/// Download a TTF/OTF font.
pub fn load_font_from_url(url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading font from {}", url);
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| VizError::Font(format!("failed to download {}: {}", url, e)))?;
    let bytes = response
        .bytes()
        .map_err(|e| VizError::Font(format!("failed to read {}: {}", url, e)))?;
    Ok(bytes.to_vec())
}
