use serde::Deserialize;

use super::{Visualize, VisualizerBase, VisualizerParams};
use crate::audio::frame::SpectralFrame;
use crate::dsp::peak::hertz_to_index;
use crate::render::surface::{StrokeStyle, Surface};
use crate::render::transform::Transform;

pub const LINE_WIDTH: f64 = 5.0;
pub const BAR_WIDTH: f64 = 25.0;
/// Ratio between the upper bin boundaries of neighbouring bars.
pub const BAND_RATIO: f64 = 0.82;
/// Peak marker fall rate, in vertical lines per second.
pub const PEAK_DECAY_PER_SECOND: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BarOptions {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_max_hz")]
    pub max_hz: f64,
    #[serde(default = "default_vertical_lines")]
    pub vertical_lines: u32,
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            count: default_count(),
            max_hz: default_max_hz(),
            vertical_lines: default_vertical_lines(),
        }
    }
}

fn default_count() -> usize { 16 }
fn default_max_hz() -> f64 { 2800.0 }
fn default_vertical_lines() -> u32 { 20 }

/// Exclusive upper bin boundary of each bar, lowest bar first, on a
/// logarithmic schedule ending at `max_hz`.
pub fn build_plan(count: usize, max_hz: f64, bins: usize, sample_rate: f64) -> Vec<usize> {
    let mut plan = vec![0usize; count];
    let mut j = hertz_to_index(max_hz, bins, sample_rate).max(0.0);
    for slot in plan.iter_mut().rev() {
        *slot = (j.floor() as usize).min(bins);
        j *= BAND_RATIO;
    }
    plan
}

/// "80s" bar graph: stacked segments per band with falling peak markers.
pub struct BarGraph {
    base: VisualizerBase,
    options: BarOptions,
    bins: usize,
    sample_rate: f64,
    plan: Vec<usize>,
    volumes: Vec<u32>,
    maximum_volumes: Vec<f64>,
    last_time: Option<f64>,
}

impl BarGraph {
    pub fn new(params: &VisualizerParams) -> Self {
        let options = params.options.bars;
        Self {
            base: VisualizerBase::new(params.title.clone(), params.palette),
            options,
            bins: params.bins,
            sample_rate: params.sample_rate,
            plan: Vec::new(),
            volumes: vec![0; options.count],
            maximum_volumes: vec![0.0; options.count],
            last_time: None,
        }
    }

    pub fn plan(&self) -> &[usize] {
        &self.plan
    }

    pub fn volumes(&self) -> &[u32] {
        &self.volumes
    }

    pub fn maximum_volumes(&self) -> &[f64] {
        &self.maximum_volumes
    }

    fn quantize(&mut self, frequency: &[u8]) {
        let lines = self.options.vertical_lines as f64;
        let mut j = 0usize;
        for (volume, &upper) in self.volumes.iter_mut().zip(self.plan.iter()) {
            let upper = upper.min(frequency.len());
            let start = j.min(upper);
            let sum: u32 = frequency[start..upper].iter().map(|&b| b as u32).sum();
            let count = upper - start;
            j = j.max(upper);

            let average = if count == 0 { 0.0 } else { sum as f64 / count as f64 };
            *volume = (average * lines / 255.0).floor() as u32;
        }
    }

    fn stroke_bars<I>(&self, surface: &mut dyn Surface, heights: I, style: &StrokeStyle)
    where
        I: Iterator<Item = (usize, f64)>,
    {
        let half = BAR_WIDTH * 0.5;
        surface.begin_path();
        for (x, y) in heights {
            let (px, py) = self.base.matrix.apply(x as f64, y);
            surface.move_to(px - half, py);
            surface.line_to(px + half, py);
        }
        surface.stroke(style);
    }
}

impl Visualize for BarGraph {
    fn base(&self) -> &VisualizerBase {
        &self.base
    }

    fn init(&mut self, surface: &mut dyn Surface) {
        self.base.init(surface);
        let count = self.options.count;
        self.plan = build_plan(count, self.options.max_hz, self.bins, self.sample_rate);
        self.volumes = vec![0; count];
        self.maximum_volumes = vec![0.0; count];
        self.last_time = None;

        let width_mod = self.base.width as f64 / count.max(1) as f64;
        let height_mod = self.base.height as f64 / self.options.vertical_lines.max(1) as f64;
        self.base.matrix = Transform::new(
            width_mod,
            0.0,
            0.0,
            -height_mod,
            BAR_WIDTH,
            self.base.height as f64 - height_mod * 0.5,
        );
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &SpectralFrame<'_>) {
        surface.clear();
        self.quantize(frame.frequency);

        for (max, &q) in self.maximum_volumes.iter_mut().zip(self.volumes.iter()) {
            if q as f64 > *max {
                *max = q as f64;
            }
        }

        let palette = self.base.palette;
        let segments = self
            .volumes
            .iter()
            .enumerate()
            .flat_map(|(i, &q)| (0..q).map(move |y| (i, y as f64)));
        self.stroke_bars(
            surface,
            segments,
            &StrokeStyle { color: palette.color, width: LINE_WIDTH },
        );

        self.stroke_bars(
            surface,
            self.maximum_volumes.iter().copied().enumerate(),
            &StrokeStyle { color: palette.foreground, width: LINE_WIDTH },
        );

        let now = frame.clock_seconds;
        let dt = self.last_time.map_or(0.0, |last| (now - last).max(0.0));
        self.last_time = Some(now);
        for (max, &q) in self.maximum_volumes.iter_mut().zip(self.volumes.iter()) {
            *max = (*max - PEAK_DECAY_PER_SECOND * dt).max(q as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::raster::RasterSurface;
    use crate::viz::testing;

    #[test]
    fn plan_is_logarithmic() {
        let plan = build_plan(16, 2800.0, 1024, 44100.0);
        assert_eq!(plan.len(), 16);
        assert_eq!(plan[15], 130);

        let top = hertz_to_index(2800.0, 1024, 44100.0);
        assert_eq!(plan[0], (top * BAND_RATIO.powi(15)).floor() as usize);
        for (i, &b) in plan.iter().enumerate() {
            assert_eq!(b, (top * BAND_RATIO.powi(15 - i as i32)).floor() as usize);
        }
        assert!(plan.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_ranges_read_as_silence() {
        // Few bins: the lowest bars share boundary 0 and own no bins
        let mut g = BarGraph::new(&testing::params(16, 44100.0));
        let mut surface = RasterSurface::new(320, 200).unwrap();
        g.init(&mut surface);
        assert_eq!(g.plan()[0], 0);

        let freq = vec![255u8; 16];
        let td = vec![128u8; 32];
        g.render(&mut surface, &testing::frame(&freq, &td, 0.0));
        assert_eq!(g.volumes()[0], 0);
        assert_eq!(g.volumes()[15], 20);
    }

    #[test]
    fn loud_bar_is_drawn() {
        let mut g = BarGraph::new(&testing::params(1024, 44100.0));
        let mut surface = RasterSurface::new(320, 200).unwrap();
        g.init(&mut surface);

        let freq = vec![255u8; 1024];
        let td = vec![128u8; 2048];
        g.render(&mut surface, &testing::frame(&freq, &td, 0.0));
        assert!(g.volumes().iter().all(|&v| v == 20));

        // Bar 0, bottom segment: centre x = 25, y = 200 - 5
        assert_eq!(surface.pixel(25, 195), Some([0, 100, 0, 255]));
        assert_eq!(surface.pixel(2, 195).map(|p| p[3]), Some(0));
    }

    #[test]
    fn peaks_decay_but_stay_bounded() {
        let mut g = BarGraph::new(&testing::params(1024, 44100.0));
        let mut surface = RasterSurface::new(320, 200).unwrap();
        g.init(&mut surface);

        let loud = vec![255u8; 1024];
        let silent = vec![0u8; 1024];
        let td = vec![128u8; 2048];

        g.render(&mut surface, &testing::frame(&loud, &td, 0.0));
        assert!(g.maximum_volumes().iter().all(|&m| m == 20.0));

        g.render(&mut surface, &testing::frame(&silent, &td, 1.0));
        assert!(g.maximum_volumes().iter().all(|&m| m == 17.0));

        let mut previous = g.maximum_volumes().to_vec();
        for tick in 2..40 {
            g.render(&mut surface, &testing::frame(&silent, &td, tick as f64 * 0.5));
            for (now, before) in g.maximum_volumes().iter().zip(previous.iter()) {
                assert!(*now <= *before);
                assert!(*now >= 0.0);
            }
            previous = g.maximum_volumes().to_vec();
        }
        assert!(previous.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn custom_options_change_the_plan() {
        let mut params = testing::params(1024, 44100.0);
        params.options.bars = BarOptions { count: 8, max_hz: 5000.0, vertical_lines: 10 };
        let mut g = BarGraph::new(&params);
        let mut surface = RasterSurface::new(320, 200).unwrap();
        g.init(&mut surface);
        assert_eq!(g.plan().len(), 8);
        assert_eq!(g.plan()[7], hertz_to_index(5000.0, 1024, 44100.0).floor() as usize);
    }
}
