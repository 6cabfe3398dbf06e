use super::surface::{Color, Image, Rect, StrokeStyle, Surface, TextAlign, TextBaseline, TextStyle};
use super::text::TextOverlay;
use super::transform::Transform;
use crate::error::{Result, VizError};

/// Largest surface edge accepted, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Source-over blend of a straight-alpha pixel.
#[inline]
pub fn blend_over(dst: &mut [u8; 4], src: [u8; 4]) {
    match src[3] {
        0 => {}
        255 => *dst = src,
        sa => {
            let sa = sa as f32 / 255.0;
            let da = dst[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            for i in 0..3 {
                let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
                dst[i] = c.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round() as u8;
        }
    }
}

/// Software RGBA surface.
pub struct RasterSurface {
    image: Image,
    path: Vec<Vec<(f64, f64)>>,
    text: Option<TextOverlay>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(VizError::UnsupportedEnvironment(format!(
                "cannot create a {}x{} drawing surface",
                width, height
            )));
        }
        Ok(Self {
            image: Image::new(width, height, Color::TRANSPARENT),
            path: Vec::new(),
            text: None,
        })
    }

    pub fn set_text(&mut self, text: Option<TextOverlay>) {
        self.text = text;
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get(x, y)
    }

    /// Composite this surface over `dst`, which must be the same size.
    pub fn composite_onto(&self, dst: &mut Image) {
        for (d, &s) in dst.pixels.iter_mut().zip(self.image.pixels.iter()) {
            blend_over(d, s);
        }
    }

    #[inline]
    fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f64) {
        if x < 0 || y < 0 || x >= self.image.width as i64 || y >= self.image.height as i64 {
            return;
        }
        let alpha = (color.a as f64 * coverage).round().clamp(0.0, 255.0) as u8;
        let idx = (y as u32 * self.image.width + x as u32) as usize;
        blend_over(&mut self.image.pixels[idx], [color.r, color.g, color.b, alpha]);
    }

    /// Capsule-shaped segment with a one pixel antialiased edge.
    fn stroke_segment(&mut self, p0: (f64, f64), p1: (f64, f64), style: &StrokeStyle) {
        let half = (style.width * 0.5).max(0.5);
        let min_x = (p0.0.min(p1.0) - half - 1.0).floor().max(0.0) as i64;
        let max_x = (p0.0.max(p1.0) + half + 1.0).ceil().min(self.image.width as f64) as i64;
        let min_y = (p0.1.min(p1.1) - half - 1.0).floor().max(0.0) as i64;
        let max_y = (p0.1.max(p1.1) + half + 1.0).ceil().min(self.image.height as f64) as i64;

        let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
        let len_sq = dx * dx + dy * dy;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                let t = if len_sq > 0.0 {
                    (((cx - p0.0) * dx + (cy - p0.1) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (nx, ny) = (p0.0 + t * dx, p0.1 + t * dy);
                let dist = ((cx - nx).powi(2) + (cy - ny).powi(2)).sqrt();
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, style.color, coverage);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width
    }

    fn height(&self) -> u32 {
        self.image.height
    }

    fn clear(&mut self) {
        self.image.pixels.fill(Color::TRANSPARENT.to_rgba());
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        let x0 = x.min(x + width).round().max(0.0) as i64;
        let x1 = x.max(x + width).round().min(self.image.width as f64) as i64;
        let y0 = y.min(y + height).round().max(0.0) as i64;
        let y1 = y.max(y + height).round().min(self.image.height as f64) as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(vec![(x, y)]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.path.last_mut() {
            Some(sub) => sub.push((x, y)),
            // lineTo without a current point behaves like moveTo
            None => self.path.push(vec![(x, y)]),
        }
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        let path = std::mem::take(&mut self.path);
        for sub in &path {
            for pair in sub.windows(2) {
                if pair.iter().all(|p| p.0.is_finite() && p.1.is_finite()) {
                    self.stroke_segment(pair[0], pair[1], style);
                }
            }
        }
        self.path = path;
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        let Some(overlay) = self.text.as_ref() else {
            return;
        };
        let width = overlay.measure_width(text) as f64;
        let line = overlay.line_height() as f64;
        let left = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x - width * 0.5,
            TextAlign::Right => x - width,
        };
        let top = match style.baseline {
            TextBaseline::Top => y,
            TextBaseline::Middle => y - line * 0.5,
            TextBaseline::Bottom => y - line,
        };
        overlay.composite(
            &mut self.image,
            text,
            left.round() as i32,
            top.round() as i32,
            style.color,
        );
    }

    fn draw_image(&mut self, image: &Image, transform: &Transform) {
        let Some(inverse) = transform.invert() else {
            return;
        };
        let (w, h) = (image.width as f64, image.height as f64);
        let corners = [
            transform.apply(0.0, 0.0),
            transform.apply(w, 0.0),
            transform.apply(0.0, h),
            transform.apply(w, h),
        ];
        let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let x0 = min_x.floor().max(0.0) as i64;
        let x1 = max_x.ceil().min(self.image.width as f64) as i64;
        let y0 = min_y.floor().max(0.0) as i64;
        let y1 = max_y.ceil().min(self.image.height as f64) as i64;

        // Nearest neighbour, sampled at pixel centres
        for y in y0..y1 {
            for x in x0..x1 {
                let (u, v) = inverse.apply(x as f64 + 0.5, y as f64 + 0.5);
                if u < 0.0 || v < 0.0 || u >= w || v >= h {
                    continue;
                }
                if let Some(px) = image.get(u as u32, v as u32) {
                    let idx = (y as u32 * self.image.width + x as u32) as usize;
                    blend_over(&mut self.image.pixels[idx], px);
                }
            }
        }
    }

    fn copy_within(&mut self, src: Rect, dst_x: u32, dst_y: u32) {
        let (width, height) = (self.image.width, self.image.height);
        if src.x >= width || src.y >= height || dst_x >= width || dst_y >= height {
            return;
        }
        let cols = src.width.min(width - src.x).min(width - dst_x) as usize;
        let rows = src.height.min(height - src.y).min(height - dst_y);
        if cols == 0 {
            return;
        }

        let stride = width as usize;
        let copy_row = |pixels: &mut Vec<[u8; 4]>, r: u32| {
            let from = (src.y + r) as usize * stride + src.x as usize;
            let to = (dst_y + r) as usize * stride + dst_x as usize;
            pixels.copy_within(from..from + cols, to);
        };
        // Walk rows so overlapping copies never read rows already written.
        if dst_y > src.y {
            for r in (0..rows).rev() {
                copy_row(&mut self.image.pixels, r);
            }
        } else {
            for r in 0..rows {
                copy_row(&mut self.image.pixels, r);
            }
        }
    }
}
